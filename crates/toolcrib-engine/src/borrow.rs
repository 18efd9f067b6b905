//! Borrowing.

use chrono::Duration;
use std::collections::{BTreeMap, HashSet};
use toolcrib_core::{
    select_units, BorrowRequest, BorrowedUnit, BorrowingItem, BorrowingTransaction, Condition,
    ItemId, ToolId, ToolUnit, TransactionId, TransactionStatus, UnitId, UnitSelection,
};
use toolcrib_store::{Changeset, CommitError, LedgerStore, RowRef, Versioned, Write};

use crate::engine::require_name;
use crate::units::stage_unit;
use crate::{Clock, Engine, LedgerError};

/// Everything one request asks of one tool.
#[derive(Default)]
struct ToolDemand {
    explicit: Vec<UnitId>,
    quantities: Vec<u32>,
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Lend units to a borrower.
    ///
    /// Each line names units or asks for a quantity, which is resolved by the
    /// configured selection preference. Explicitly named units are claimed
    /// before any quantity is resolved, and a quantity never picks a unit
    /// claimed elsewhere in the same request. Lines for the same tool merge
    /// into one borrowing item.
    ///
    /// The whole request commits as one changeset: if any unit was taken by a
    /// concurrent borrow in the meantime the call fails with
    /// [`LedgerError::UnitUnavailable`] and nothing is lent.
    pub fn borrow(&self, request: BorrowRequest) -> Result<BorrowingTransaction, LedgerError> {
        let now = self.now();
        require_name("borrower name", &request.borrower_name)?;
        if request.items.is_empty() {
            return Err(LedgerError::InvalidInput(
                "a loan needs at least one item".to_string(),
            ));
        }
        if request.due_date <= now {
            return Err(LedgerError::InvalidDate(format!(
                "due date {} is not in the future",
                request.due_date
            )));
        }
        if let Some(days) = self.options().max_loan_days {
            if request.due_date - now > Duration::days(i64::from(days)) {
                return Err(LedgerError::InvalidDate(format!(
                    "loans may last at most {days} days"
                )));
            }
        }

        // Group lines by tool, keeping first-seen order for item ids.
        let mut order: Vec<ToolId> = Vec::new();
        let mut demands: BTreeMap<ToolId, ToolDemand> = BTreeMap::new();
        for line in &request.items {
            if !demands.contains_key(&line.tool_id) {
                order.push(line.tool_id);
            }
            let demand = demands.entry(line.tool_id).or_default();
            match &line.selection {
                UnitSelection::Units(ids) if ids.is_empty() => {
                    return Err(LedgerError::InvalidInput(format!(
                        "unit list for {} is empty",
                        line.tool_id
                    )));
                }
                UnitSelection::Units(ids) => demand.explicit.extend(ids),
                UnitSelection::Quantity(quantity) => demand.quantities.push(*quantity),
            }
        }

        let transaction_id: TransactionId = self.next_id();
        let mut changeset = Changeset::new();
        let mut items = Vec::with_capacity(order.len());

        for tool_id in order {
            let demand = demands.remove(&tool_id).unwrap_or_default();
            self.load_live_tool(tool_id)?;
            let units = self.store().units_of(tool_id)?;
            let claimed = self.claim_units(tool_id, &units, &demand)?;

            let item_id: ItemId = self.next_id();
            let mut borrowed = Vec::with_capacity(claimed.len());
            for unit in &claimed {
                let row = stage_unit(&mut changeset, unit, |u| u.is_available = false);
                borrowed.push(BorrowedUnit {
                    id: self.next_id(),
                    borrowing_item_id: item_id,
                    tool_unit_id: row.id,
                    original_condition: row.condition,
                    return_condition: None,
                    notes: None,
                });
            }

            let count = u32::try_from(borrowed.len()).unwrap_or(u32::MAX);
            changeset.push(Write::TakeUnits {
                tool: tool_id,
                count,
            });
            items.push(BorrowingItem {
                id: item_id,
                borrowing_transaction_id: transaction_id,
                tool_id,
                quantity: count,
                original_condition: Condition::worst(borrowed.iter().map(|b| b.original_condition))
                    .unwrap_or_default(),
                return_condition: None,
                return_date: None,
                units: borrowed,
            });
        }

        let transaction = BorrowingTransaction {
            id: transaction_id,
            borrower_name: request.borrower_name.trim().to_string(),
            borrow_date: now,
            due_date: request.due_date,
            return_date: None,
            status: TransactionStatus::Active,
            purpose: request.purpose,
            notes: None,
            items,
            extensions: Vec::new(),
        };
        changeset.push(Write::PutTransaction(transaction.clone()));

        self.store().commit(changeset).map_err(|e| match e {
            CommitError::Stale(RowRef::Unit(id)) => LedgerError::UnitUnavailable(id),
            other => other.into(),
        })?;
        Ok(transaction)
    }

    /// Resolve one tool's demand to concrete unit rows.
    fn claim_units(
        &self,
        tool_id: ToolId,
        units: &[Versioned<ToolUnit>],
        demand: &ToolDemand,
    ) -> Result<Vec<Versioned<ToolUnit>>, LedgerError> {
        let mut claimed: Vec<Versioned<ToolUnit>> = Vec::new();
        let mut seen: HashSet<UnitId> = HashSet::new();

        for &unit_id in &demand.explicit {
            if !seen.insert(unit_id) {
                return Err(LedgerError::InvalidInput(format!(
                    "{unit_id} is requested more than once"
                )));
            }
            let Some(unit) = units.iter().find(|u| u.value.id == unit_id) else {
                // Distinguish an unknown unit from one of another tool.
                let other = self.load_unit(unit_id)?;
                return Err(LedgerError::InvalidInput(format!(
                    "{unit_id} belongs to {}, not {tool_id}",
                    other.value.tool_id
                )));
            };
            if !unit.value.is_borrowable() {
                return Err(LedgerError::UnitUnavailable(unit_id));
            }
            claimed.push(unit.clone());
        }

        for &quantity in &demand.quantities {
            let remaining: Vec<ToolUnit> = units
                .iter()
                .filter(|u| !seen.contains(&u.value.id))
                .map(|u| u.value.clone())
                .collect();
            let picked = select_units(&remaining, quantity, self.options().selection)
                .map_err(|e| LedgerError::from_selection(tool_id, e))?;
            for unit_id in picked {
                seen.insert(unit_id);
                if let Some(unit) = units.iter().find(|u| u.value.id == unit_id) {
                    claimed.push(unit.clone());
                }
            }
        }

        Ok(claimed)
    }
}
