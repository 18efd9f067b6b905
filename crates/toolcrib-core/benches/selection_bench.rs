//! Unit selection benchmarks.
//!
//! Run with: cargo bench -p toolcrib-core

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use toolcrib_core::{select_units, Condition, SelectionPreference, ToolId, ToolUnit, UnitId};

/// Generate a shelf of N units with mixed conditions, a third of them lent out.
fn generate_units(num_units: usize) -> Vec<ToolUnit> {
    (0..num_units)
        .map(|i| {
            let condition = Condition::ALL[i % Condition::ALL.len()];
            let mut unit = ToolUnit::new(UnitId(i as u64), ToolId(1), i as u32 + 1, condition);
            unit.is_available = i % 3 != 0;
            unit
        })
        .collect()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_units");

    for size in [10, 100, 1000] {
        let units = generate_units(size);
        let quantity = (size / 4) as u32;
        group.throughput(Throughput::Elements(size as u64));

        for preference in [
            SelectionPreference::BestFirst,
            SelectionPreference::WorstFirst,
            SelectionPreference::LowestNumber,
        ] {
            group.bench_with_input(
                BenchmarkId::new(preference.to_string(), size),
                &units,
                |b, units| b.iter(|| select_units(black_box(units), quantity, preference)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_select);
criterion_main!(benches);
