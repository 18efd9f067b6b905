//! Ledger invariant checker.
//!
//! Recomputes every aggregate from the rows it summarizes and reports each
//! disagreement. A healthy ledger yields no violations.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use toolcrib_core::{BorrowingTransaction, ToolId, ToolUnit, TransactionId, UnitId};
use toolcrib_store::LedgerStore;

use crate::{Clock, Engine, LedgerError};

/// Invariant violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationCode {
    // === Tool counters (V1xxx) ===
    /// V1001: Available count exceeds total.
    AvailableExceedsTotal,
    /// V1002: Total differs from the number of live units.
    TotalMismatch,
    /// V1003: Available differs from the number of available live units.
    AvailableMismatch,

    // === Loans (V2xxx) ===
    /// V2001: Item quantity differs from its borrowed unit count.
    ItemQuantityMismatch,
    /// V2002: A unit held by an open loan is marked available.
    BorrowedUnitAvailable,
    /// V2003: A unit is held by two open loans.
    UnitHeldTwice,
    /// V2004: A loan references a unit that does not exist.
    DanglingUnit,

    // === Materials (V3xxx) ===
    /// V3001: Stock is negative.
    NegativeStock,
}

impl ViolationCode {
    /// Get the code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AvailableExceedsTotal => "V1001",
            Self::TotalMismatch => "V1002",
            Self::AvailableMismatch => "V1003",
            Self::ItemQuantityMismatch => "V2001",
            Self::BorrowedUnitAvailable => "V2002",
            Self::UnitHeldTwice => "V2003",
            Self::DanglingUnit => "V2004",
            Self::NegativeStock => "V3001",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct Violation {
    /// Violation code.
    pub code: ViolationCode,
    /// Violation message.
    pub message: String,
}

impl Violation {
    fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn check_counters(
    tool_id: ToolId,
    total: u32,
    available: u32,
    units: &[ToolUnit],
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let live = units.iter().filter(|u| u.is_live()).count();
    let on_shelf = units.iter().filter(|u| u.is_borrowable()).count();

    if available > total {
        violations.push(Violation::new(
            ViolationCode::AvailableExceedsTotal,
            format!("{tool_id}: available {available} exceeds total {total}"),
        ));
    }
    if total as usize != live {
        violations.push(Violation::new(
            ViolationCode::TotalMismatch,
            format!("{tool_id}: total {total} but {live} live units"),
        ));
    }
    if available as usize != on_shelf {
        violations.push(Violation::new(
            ViolationCode::AvailableMismatch,
            format!("{tool_id}: available {available} but {on_shelf} units on the shelf"),
        ));
    }
    violations
}

fn check_loans(
    loans: &[BorrowingTransaction],
    units: &HashMap<UnitId, ToolUnit>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut holders: HashMap<UnitId, TransactionId> = HashMap::new();

    for txn in loans {
        for item in &txn.items {
            if item.quantity as usize != item.units.len() {
                violations.push(Violation::new(
                    ViolationCode::ItemQuantityMismatch,
                    format!(
                        "{}: quantity {} but {} borrowed units",
                        item.id,
                        item.quantity,
                        item.units.len()
                    ),
                ));
            }
        }

        if !txn.is_open() {
            continue;
        }
        for unit_id in txn.unit_ids() {
            match units.get(&unit_id) {
                None => violations.push(Violation::new(
                    ViolationCode::DanglingUnit,
                    format!("{}: {unit_id} does not exist", txn.id),
                )),
                Some(unit) if unit.is_available => violations.push(Violation::new(
                    ViolationCode::BorrowedUnitAvailable,
                    format!("{}: {unit_id} is lent out but marked available", txn.id),
                )),
                Some(_) => {}
            }
            if let Some(other) = holders.insert(unit_id, txn.id) {
                violations.push(Violation::new(
                    ViolationCode::UnitHeldTwice,
                    format!("{unit_id} is held by both {other} and {}", txn.id),
                ));
            }
        }
    }
    violations
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Check every invariant of the whole ledger.
    pub fn check(&self) -> Result<Vec<Violation>, LedgerError> {
        let mut violations = Vec::new();
        let mut all_units = HashMap::new();

        for tool in self.store().tools()? {
            let units: Vec<ToolUnit> = self
                .store()
                .units_of(tool.value.id)?
                .into_iter()
                .map(|u| u.value)
                .collect();
            violations.extend(check_counters(
                tool.value.id,
                tool.value.total_quantity,
                tool.value.available_quantity,
                &units,
            ));
            all_units.extend(units.into_iter().map(|u| (u.id, u)));
        }

        violations.extend(check_loans(&self.transactions()?, &all_units));

        for material in self.materials()? {
            if material.current_quantity < Decimal::ZERO {
                violations.push(Violation::new(
                    ViolationCode::NegativeStock,
                    format!("{}: stock is {}", material.id, material.current_quantity),
                ));
            }
        }

        Ok(violations)
    }

    /// Check the counter invariants of one tool.
    pub fn check_tool(&self, tool_id: ToolId) -> Result<Vec<Violation>, LedgerError> {
        let tool = self.load_tool(tool_id)?.value;
        let units: Vec<ToolUnit> = self
            .store()
            .units_of(tool_id)?
            .into_iter()
            .map(|u| u.value)
            .collect();
        Ok(check_counters(
            tool_id,
            tool.total_quantity,
            tool.available_quantity,
            &units,
        ))
    }
}
