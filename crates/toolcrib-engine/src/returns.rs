//! The return operation.

use std::collections::{BTreeMap, HashMap};
use toolcrib_core::{
    BorrowedUnitId, BorrowingTransaction, Condition, ReturnRequest, ToolId, TransactionStatus,
    UnitReturn,
};
use toolcrib_store::{Changeset, CommitError, LedgerStore, RowRef, Versioned, Write};

use crate::units::stage_unit;
use crate::{Clock, Engine, LedgerError};

/// Check that `request` covers every borrowed unit of `txn` exactly once.
///
/// Returns the unit returns keyed by borrowed unit id.
fn collect_returns<'a>(
    txn: &BorrowingTransaction,
    request: &'a ReturnRequest,
) -> Result<HashMap<BorrowedUnitId, &'a UnitReturn>, LedgerError> {
    let mut returns = HashMap::new();

    for item_return in &request.items {
        let item = txn.item(item_return.borrowing_item_id).ok_or_else(|| {
            LedgerError::InvalidInput(format!(
                "{} is not part of {}",
                item_return.borrowing_item_id, txn.id
            ))
        })?;
        for unit_return in &item_return.unit_returns {
            if item.unit(unit_return.borrowed_unit_id).is_none() {
                return Err(LedgerError::InvalidInput(format!(
                    "{} is not part of {}",
                    unit_return.borrowed_unit_id, item.id
                )));
            }
            if returns
                .insert(unit_return.borrowed_unit_id, unit_return)
                .is_some()
            {
                return Err(LedgerError::IncompleteReturn(format!(
                    "{} is returned more than once",
                    unit_return.borrowed_unit_id
                )));
            }
        }
    }

    let missing: Vec<String> = txn
        .items
        .iter()
        .flat_map(|i| &i.units)
        .filter(|u| !returns.contains_key(&u.id))
        .map(|u| u.id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LedgerError::IncompleteReturn(format!(
            "no return condition for {}",
            missing.join(", ")
        )));
    }

    Ok(returns)
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Close a loan.
    ///
    /// Every borrowed unit must be listed exactly once with its return
    /// condition. Each unit gets the new condition and becomes available,
    /// each tool's available count grows by its returned units, and the loan
    /// is completed, all in one commit. Returning a completed loan fails with
    /// [`LedgerError::AlreadyCompleted`] and changes nothing.
    pub fn return_loan(&self, request: ReturnRequest) -> Result<BorrowingTransaction, LedgerError> {
        let Versioned {
            version,
            value: mut txn,
        } = self.load_transaction(request.transaction_id)?;
        if txn.status == TransactionStatus::Completed {
            return Err(LedgerError::AlreadyCompleted(txn.id));
        }
        let returns = collect_returns(&txn, &request)?;

        let now = self.now();
        let mut changeset = Changeset::new();
        changeset.expect_version(RowRef::Transaction(txn.id), version);
        let mut restored: BTreeMap<ToolId, u32> = BTreeMap::new();

        for item in &mut txn.items {
            for borrowed in &mut item.units {
                let Some(unit_return) = returns.get(&borrowed.id) else {
                    continue;
                };
                let unit = self.load_unit(borrowed.tool_unit_id)?;
                stage_unit(&mut changeset, &unit, |u| {
                    u.condition = unit_return.return_condition;
                    u.is_available = true;
                    if unit_return.notes.is_some() {
                        u.notes.clone_from(&unit_return.notes);
                    }
                });
                borrowed.return_condition = Some(unit_return.return_condition);
                borrowed.notes.clone_from(&unit_return.notes);
                *restored.entry(item.tool_id).or_default() += 1;
            }
            item.return_condition =
                Condition::worst(item.units.iter().filter_map(|u| u.return_condition));
            item.return_date = Some(now);
        }

        for (tool, count) in restored {
            changeset.push(Write::RestoreUnits { tool, count });
        }

        txn.status = TransactionStatus::Completed;
        txn.return_date = Some(now);
        if request.notes.is_some() {
            txn.notes = request.notes;
        }
        changeset.push(Write::PutTransaction(txn.clone()));

        match self.store().commit(changeset) {
            Ok(()) => Ok(txn),
            Err(CommitError::Stale(RowRef::Transaction(id))) => {
                // Lost a race: tell a second return apart from a sweep or extension.
                let current = self.load_transaction(id)?;
                if current.value.status == TransactionStatus::Completed {
                    Err(LedgerError::AlreadyCompleted(id))
                } else {
                    Err(LedgerError::Conflict(format!(
                        "{id} was modified concurrently"
                    )))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
