//! In-memory store.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use toolcrib_core::{
    BorrowingTransaction, ConsumptionId, ConsumptionTransaction, Material, MaterialId, Tool,
    ToolId, ToolUnit, TransactionId, UnitId,
};

use crate::{
    Changeset, CommitError, Guard, LedgerStore, RowRef, Snapshot, StoreError, Versioned, Write,
    SNAPSHOT_FORMAT,
};

/// The committed rows.
#[derive(Debug, Default)]
struct Tables {
    tools: BTreeMap<ToolId, Versioned<Tool>>,
    units: BTreeMap<UnitId, Versioned<ToolUnit>>,
    transactions: BTreeMap<TransactionId, Versioned<BorrowingTransaction>>,
    materials: BTreeMap<MaterialId, Versioned<Material>>,
    consumptions: BTreeMap<ConsumptionId, ConsumptionTransaction>,
}

impl Tables {
    fn version_of(&self, row: RowRef) -> Option<u64> {
        match row {
            RowRef::Tool(id) => self.tools.get(&id).map(|r| r.version),
            RowRef::Unit(id) => self.units.get(&id).map(|r| r.version),
            RowRef::Transaction(id) => self.transactions.get(&id).map(|r| r.version),
            RowRef::Material(id) => self.materials.get(&id).map(|r| r.version),
            RowRef::Consumption(id) => self.consumptions.get(&id).map(|_| 1),
        }
    }

    fn check(&self, guard: &Guard) -> Result<(), CommitError> {
        match guard {
            Guard::Version { row, version } => match self.version_of(*row) {
                None => Err(CommitError::Missing(*row)),
                Some(current) if current != *version => Err(CommitError::Stale(*row)),
                Some(_) => Ok(()),
            },
            Guard::NoOpenLoans(tool) => match self
                .transactions
                .values()
                .find(|t| t.value.is_open() && t.value.references_tool(*tool))
            {
                Some(open) => Err(CommitError::OpenLoans {
                    tool: *tool,
                    transaction: open.value.id,
                }),
                None => Ok(()),
            },
        }
    }
}

/// Rows written by a changeset that is still being applied.
///
/// `None` marks a deleted row.
#[derive(Debug, Default)]
struct Staged {
    tools: BTreeMap<ToolId, Option<Tool>>,
    units: BTreeMap<UnitId, Option<ToolUnit>>,
    transactions: BTreeMap<TransactionId, BorrowingTransaction>,
    materials: BTreeMap<MaterialId, Material>,
    consumptions: BTreeMap<ConsumptionId, ConsumptionTransaction>,
}

impl Staged {
    fn tool(&self, tables: &Tables, id: ToolId) -> Result<Tool, CommitError> {
        let current = match self.tools.get(&id) {
            Some(staged) => staged.clone(),
            None => tables.tools.get(&id).map(|r| r.value.clone()),
        };
        current.ok_or(CommitError::Missing(RowRef::Tool(id)))
    }

    fn material(&self, tables: &Tables, id: MaterialId) -> Result<Material, CommitError> {
        self.materials
            .get(&id)
            .cloned()
            .or_else(|| tables.materials.get(&id).map(|r| r.value.clone()))
            .ok_or(CommitError::Missing(RowRef::Material(id)))
    }

    fn apply(&mut self, tables: &Tables, write: Write) -> Result<(), CommitError> {
        match write {
            Write::PutTool(tool) => {
                self.tools.insert(tool.id, Some(tool));
            }
            Write::PutUnit(unit) => {
                self.units.insert(unit.id, Some(unit));
            }
            Write::PutTransaction(txn) => {
                self.transactions.insert(txn.id, txn);
            }
            Write::PutMaterial(material) => {
                self.materials.insert(material.id, material);
            }
            Write::PutConsumption(txn) => {
                if tables.consumptions.contains_key(&txn.id)
                    || self.consumptions.contains_key(&txn.id)
                {
                    return Err(CommitError::AlreadyExists(RowRef::Consumption(txn.id)));
                }
                self.consumptions.insert(txn.id, txn);
            }
            Write::TakeUnits { tool, count } => {
                let mut row = self.tool(tables, tool)?;
                if row.is_archived() {
                    return Err(CommitError::Missing(RowRef::Tool(tool)));
                }
                if row.available_quantity < count {
                    return Err(CommitError::NotEnoughAvailable {
                        tool,
                        requested: count,
                        available: row.available_quantity,
                    });
                }
                row.available_quantity -= count;
                self.tools.insert(tool, Some(row));
            }
            Write::RestoreUnits { tool, count } => {
                let mut row = self.tool(tables, tool)?;
                row.available_quantity = row
                    .available_quantity
                    .saturating_add(count)
                    .min(row.total_quantity);
                self.tools.insert(tool, Some(row));
            }
            Write::ConsumeStock { material, quantity } => {
                let mut row = self.material(tables, material)?;
                if quantity > row.current_quantity {
                    return Err(CommitError::InsufficientStock {
                        material,
                        requested: quantity,
                        available: row.current_quantity,
                    });
                }
                row.current_quantity -= quantity;
                debug_assert!(row.current_quantity >= Decimal::ZERO);
                self.materials.insert(material, row);
            }
            Write::RemoveTool(tool) => {
                self.tool(tables, tool)?;
                self.tools.insert(tool, None);
                let committed = tables
                    .units
                    .values()
                    .filter(|u| u.value.tool_id == tool)
                    .map(|u| u.value.id);
                let staged = self
                    .units
                    .values()
                    .flatten()
                    .filter(|u| u.tool_id == tool)
                    .map(|u| u.id);
                let doomed: Vec<UnitId> = committed.chain(staged).collect();
                for id in doomed {
                    self.units.insert(id, None);
                }
            }
        }
        Ok(())
    }

    /// Merge into the committed tables, bumping the version of every touched row.
    fn merge_into(self, tables: &mut Tables) {
        merge(&mut tables.tools, self.tools);
        merge(&mut tables.units, self.units);
        merge(
            &mut tables.transactions,
            self.transactions.into_iter().map(|(k, v)| (k, Some(v))),
        );
        merge(
            &mut tables.materials,
            self.materials.into_iter().map(|(k, v)| (k, Some(v))),
        );
        tables.consumptions.extend(self.consumptions);
    }
}

fn merge<K: Ord, T>(
    table: &mut BTreeMap<K, Versioned<T>>,
    staged: impl IntoIterator<Item = (K, Option<T>)>,
) {
    for (key, row) in staged {
        match row {
            Some(value) => {
                let version = table.get(&key).map_or(1, |r| r.version + 1);
                table.insert(key, Versioned::new(version, value));
            }
            None => {
                table.remove(&key);
            }
        }
    }
}

/// A thread-safe in-memory [`LedgerStore`].
///
/// Reads take a shared lock; commits take the exclusive lock for the
/// duration of guard checking and write application.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    last_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(StoreError::UnsupportedFormat {
                found: snapshot.format,
                expected: SNAPSHOT_FORMAT,
            });
        }

        let tables = Tables {
            tools: snapshot
                .tools
                .into_iter()
                .map(|r| (r.value.id, r))
                .collect(),
            units: snapshot
                .units
                .into_iter()
                .map(|r| (r.value.id, r))
                .collect(),
            transactions: snapshot
                .transactions
                .into_iter()
                .map(|r| (r.value.id, r))
                .collect(),
            materials: snapshot
                .materials
                .into_iter()
                .map(|r| (r.value.id, r))
                .collect(),
            consumptions: snapshot
                .consumptions
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
        };

        Ok(Self {
            tables: RwLock::new(tables),
            last_id: AtomicU64::new(snapshot.last_id),
        })
    }

    /// Copy every row into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        Snapshot {
            format: SNAPSHOT_FORMAT,
            last_id: self.last_id.load(Ordering::SeqCst),
            tools: tables.tools.values().cloned().collect(),
            units: tables.units.values().cloned().collect(),
            transactions: tables.transactions.values().cloned().collect(),
            materials: tables.materials.values().cloned().collect(),
            consumptions: tables.consumptions.values().cloned().collect(),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn next_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn tool(&self, id: ToolId) -> Result<Option<Versioned<Tool>>, StoreError> {
        Ok(self.tables.read().tools.get(&id).cloned())
    }

    fn tools(&self) -> Result<Vec<Versioned<Tool>>, StoreError> {
        Ok(self.tables.read().tools.values().cloned().collect())
    }

    fn unit(&self, id: UnitId) -> Result<Option<Versioned<ToolUnit>>, StoreError> {
        Ok(self.tables.read().units.get(&id).cloned())
    }

    fn units_of(&self, tool_id: ToolId) -> Result<Vec<Versioned<ToolUnit>>, StoreError> {
        Ok(self
            .tables
            .read()
            .units
            .values()
            .filter(|u| u.value.tool_id == tool_id)
            .cloned()
            .collect())
    }

    fn transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Versioned<BorrowingTransaction>>, StoreError> {
        Ok(self.tables.read().transactions.get(&id).cloned())
    }

    fn transactions(&self) -> Result<Vec<Versioned<BorrowingTransaction>>, StoreError> {
        Ok(self.tables.read().transactions.values().cloned().collect())
    }

    fn material(&self, id: MaterialId) -> Result<Option<Versioned<Material>>, StoreError> {
        Ok(self.tables.read().materials.get(&id).cloned())
    }

    fn materials(&self) -> Result<Vec<Versioned<Material>>, StoreError> {
        Ok(self.tables.read().materials.values().cloned().collect())
    }

    fn consumption(&self, id: ConsumptionId) -> Result<Option<ConsumptionTransaction>, StoreError> {
        Ok(self.tables.read().consumptions.get(&id).cloned())
    }

    fn consumptions(&self) -> Result<Vec<ConsumptionTransaction>, StoreError> {
        Ok(self.tables.read().consumptions.values().cloned().collect())
    }

    fn commit(&self, changeset: Changeset) -> Result<(), CommitError> {
        let guards = changeset.guards.len();
        let writes = changeset.writes.len();
        let mut tables = self.tables.write();

        let result = changeset
            .guards
            .iter()
            .try_for_each(|guard| tables.check(guard))
            .and_then(|()| {
                let mut staged = Staged::default();
                for write in changeset.writes {
                    staged.apply(&tables, write)?;
                }
                Ok(staged)
            });

        match result {
            Ok(staged) => {
                staged.merge_into(&mut tables);
                tracing::debug!(guards, writes, "changeset committed");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(guards, writes, "changeset rejected: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use toolcrib_core::{CategoryId, Condition, TransactionStatus};

    fn seeded() -> (MemoryStore, ToolId, Vec<UnitId>) {
        let store = MemoryStore::new();
        let tool_id = ToolId(store.next_id());
        let mut tool = Tool::new(tool_id, CategoryId(1), "Ladder");
        let units = tool.allocate_units(3, Condition::Good, || UnitId(store.next_id()));
        let ids = units.iter().map(|u| u.id).collect();

        let mut changeset = Changeset::new();
        changeset.push(Write::PutTool(tool));
        changeset.extend(units.into_iter().map(Write::PutUnit));
        store.commit(changeset).unwrap();
        (store, tool_id, ids)
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let store = MemoryStore::new();
        let a = store.next_id();
        let b = store.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_new_rows_start_at_version_one() {
        let (store, tool_id, units) = seeded();
        assert_eq!(store.tool(tool_id).unwrap().unwrap().version, 1);
        assert_eq!(store.unit(units[0]).unwrap().unwrap().version, 1);
        assert_eq!(store.units_of(tool_id).unwrap().len(), 3);
    }

    #[test]
    fn test_stale_guard_rejects_whole_changeset() {
        let (store, tool_id, units) = seeded();
        let unit = store.unit(units[0]).unwrap().unwrap();

        let mut first = Changeset::new();
        let mut lent = unit.value.clone();
        lent.is_available = false;
        first
            .expect_version(RowRef::Unit(lent.id), unit.version)
            .push(Write::PutUnit(lent.clone()))
            .push(Write::TakeUnits {
                tool: tool_id,
                count: 1,
            });
        store.commit(first.clone()).unwrap();

        let err = store.commit(first).unwrap_err();
        assert_eq!(err, CommitError::Stale(RowRef::Unit(lent.id)));
        assert_eq!(store.tool(tool_id).unwrap().unwrap().value.available_quantity, 2);
    }

    #[test]
    fn test_counter_writes_do_not_touch_other_rows_on_failure() {
        let (store, tool_id, units) = seeded();
        let before = store.unit(units[1]).unwrap().unwrap();

        let mut changeset = Changeset::new();
        let mut lent = before.value.clone();
        lent.is_available = false;
        changeset.push(Write::PutUnit(lent)).push(Write::TakeUnits {
            tool: tool_id,
            count: 4,
        });

        let err = store.commit(changeset).unwrap_err();
        assert!(matches!(
            err,
            CommitError::NotEnoughAvailable {
                requested: 4,
                available: 3,
                ..
            }
        ));
        assert_eq!(store.unit(units[1]).unwrap().unwrap(), before);
    }

    #[test]
    fn test_take_units_rejects_archived_tool() {
        let (store, tool_id, units) = seeded();
        let mut archived = store.tool(tool_id).unwrap().unwrap().value;
        archived.archived_at = Some(chrono::Utc::now());
        let mut archive = Changeset::new();
        archive.push(Write::PutTool(archived));
        store.commit(archive).unwrap();

        let before = store.unit(units[0]).unwrap().unwrap();
        let mut lent = before.value.clone();
        lent.is_available = false;
        let mut changeset = Changeset::new();
        changeset.push(Write::PutUnit(lent)).push(Write::TakeUnits {
            tool: tool_id,
            count: 1,
        });

        let err = store.commit(changeset).unwrap_err();
        assert_eq!(err, CommitError::Missing(RowRef::Tool(tool_id)));
        assert_eq!(store.unit(units[0]).unwrap().unwrap(), before);
        assert_eq!(store.tool(tool_id).unwrap().unwrap().value.available_quantity, 3);
    }

    #[test]
    fn test_restore_saturates_at_total() {
        let (store, tool_id, _) = seeded();
        let mut changeset = Changeset::new();
        changeset.push(Write::RestoreUnits {
            tool: tool_id,
            count: 5,
        });
        store.commit(changeset).unwrap();

        let tool = store.tool(tool_id).unwrap().unwrap();
        assert_eq!(tool.value.available_quantity, 3);
        assert_eq!(tool.version, 2);
    }

    #[test]
    fn test_remove_tool_drops_units() {
        let (store, tool_id, _) = seeded();
        let mut changeset = Changeset::new();
        changeset.push(Write::RemoveTool(tool_id));
        store.commit(changeset).unwrap();

        assert!(store.tool(tool_id).unwrap().is_none());
        assert!(store.units_of(tool_id).unwrap().is_empty());
    }

    #[test]
    fn test_no_open_loans_guard() {
        let (store, tool_id, _) = seeded();
        let txn = BorrowingTransaction {
            id: TransactionId(store.next_id()),
            borrower_name: "Ana".to_string(),
            borrow_date: chrono::Utc::now(),
            due_date: chrono::Utc::now(),
            return_date: None,
            status: TransactionStatus::Active,
            purpose: String::new(),
            notes: None,
            items: vec![toolcrib_core::BorrowingItem {
                id: toolcrib_core::ItemId(store.next_id()),
                borrowing_transaction_id: TransactionId(0),
                tool_id,
                quantity: 0,
                original_condition: Condition::Good,
                return_condition: None,
                return_date: None,
                units: Vec::new(),
            }],
            extensions: Vec::new(),
        };
        let txn_id = txn.id;
        let mut changeset = Changeset::new();
        changeset.push(Write::PutTransaction(txn));
        store.commit(changeset).unwrap();

        let mut delete = Changeset::new();
        delete
            .expect_no_open_loans(tool_id)
            .push(Write::RemoveTool(tool_id));
        assert_eq!(
            store.commit(delete).unwrap_err(),
            CommitError::OpenLoans {
                tool: tool_id,
                transaction: txn_id,
            }
        );
    }

    #[test]
    fn test_consume_stock_floor() {
        let store = MemoryStore::new();
        let material = Material {
            id: MaterialId(store.next_id()),
            category_id: CategoryId(1),
            name: "Sandpaper".to_string(),
            current_quantity: dec!(10),
            threshold_quantity: dec!(2),
            unit: "sheet".to_string(),
        };
        let id = material.id;
        let mut changeset = Changeset::new();
        changeset.push(Write::PutMaterial(material));
        store.commit(changeset).unwrap();

        let mut take = Changeset::new();
        take.push(Write::ConsumeStock {
            material: id,
            quantity: dec!(10),
        });
        store.commit(take.clone()).unwrap();
        assert_eq!(
            store.material(id).unwrap().unwrap().value.current_quantity,
            dec!(0)
        );

        let err = store.commit(take).unwrap_err();
        assert!(matches!(err, CommitError::InsufficientStock { .. }));
    }

    #[test]
    fn test_consumptions_are_immutable() {
        let store = MemoryStore::new();
        let txn = ConsumptionTransaction {
            id: ConsumptionId(store.next_id()),
            consumer_name: "Ben".to_string(),
            consumption_date: chrono::Utc::now(),
            purpose: "Deck".to_string(),
            project_name: None,
            items: Vec::new(),
        };
        let mut changeset = Changeset::new();
        changeset.push(Write::PutConsumption(txn));
        store.commit(changeset.clone()).unwrap();

        assert!(matches!(
            store.commit(changeset).unwrap_err(),
            CommitError::AlreadyExists(RowRef::Consumption(_))
        ));
    }
}
