//! Tools and their individually tracked units.
//!
//! A [`Tool`] carries two aggregate counters, `total_quantity` and
//! `available_quantity`, which must always agree with its live
//! [`ToolUnit`]s:
//!
//! - `0 <= available_quantity <= total_quantity`
//! - `total_quantity == |live units|`
//! - `available_quantity == |live units that are available|`
//!
//! A unit is live until it is retired by a quantity reduction. Retired units
//! are kept for loan history and their numbers are never handed out again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CategoryId, Condition, ToolId, UnitId};

/// A lendable tool with aggregate stock counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool id.
    pub id: ToolId,
    /// Category the tool is filed under.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// Number of live units.
    pub total_quantity: u32,
    /// Number of live units currently on the shelf.
    pub available_quantity: u32,
    /// Storage location.
    pub location: Option<String>,
    /// Supplier the tool was bought from.
    pub supplier: Option<String>,
    /// Highest unit number ever assigned for this tool.
    pub last_unit_number: u32,
    /// Set when the tool was deleted but still has loan history.
    pub archived_at: Option<DateTime<Utc>>,
}

impl Tool {
    /// Create a tool with no units.
    #[must_use]
    pub fn new(id: ToolId, category_id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            category_id,
            name: name.into(),
            total_quantity: 0,
            available_quantity: 0,
            location: None,
            supplier: None,
            last_unit_number: 0,
            archived_at: None,
        }
    }

    /// Set the storage location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the supplier.
    #[must_use]
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// Units currently lent out. Derived, never stored.
    #[must_use]
    pub const fn borrowed_quantity(&self) -> u32 {
        self.total_quantity.saturating_sub(self.available_quantity)
    }

    /// Whether the tool has been archived.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Allocate `count` new available units, continuing the unit numbering.
    ///
    /// Both counters grow by `count`. `next_id` is called once per unit to
    /// obtain its row id.
    pub fn allocate_units(
        &mut self,
        count: u32,
        condition: Condition,
        mut next_id: impl FnMut() -> UnitId,
    ) -> Vec<ToolUnit> {
        let mut units = Vec::with_capacity(count as usize);
        for _ in 0..count {
            self.last_unit_number += 1;
            units.push(ToolUnit::new(
                next_id(),
                self.id,
                self.last_unit_number,
                condition,
            ));
        }
        self.total_quantity += count;
        self.available_quantity += count;
        units
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}/{} available)",
            self.id, self.name, self.available_quantity, self.total_quantity
        )
    }
}

/// One physically distinguishable instance of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUnit {
    /// Unit id.
    pub id: UnitId,
    /// Owning tool.
    pub tool_id: ToolId,
    /// Number unique within the tool, assigned in increasing order.
    pub unit_number: u32,
    /// Current condition.
    pub condition: Condition,
    /// Whether the unit is on the shelf.
    pub is_available: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Set when the unit was retired by a quantity reduction.
    pub retired_at: Option<DateTime<Utc>>,
}

impl ToolUnit {
    /// Create an available unit.
    #[must_use]
    pub const fn new(id: UnitId, tool_id: ToolId, unit_number: u32, condition: Condition) -> Self {
        Self {
            id,
            tool_id,
            unit_number,
            condition,
            is_available: true,
            notes: None,
            retired_at: None,
        }
    }

    /// Whether the unit has been retired.
    #[must_use]
    pub const fn is_retired(&self) -> bool {
        self.retired_at.is_some()
    }

    /// Whether the unit counts toward the tool's total.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.is_retired()
    }

    /// Whether the unit can be lent right now.
    #[must_use]
    pub const fn is_borrowable(&self) -> bool {
        self.is_available && !self.is_retired()
    }
}

impl fmt::Display for ToolUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} {}", self.id, self.unit_number, self.condition)?;
        if self.is_retired() {
            write!(f, " (retired)")
        } else if self.is_available {
            write!(f, " (available)")
        } else {
            write!(f, " (borrowed)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> Tool {
        Tool::new(ToolId(1), CategoryId(1), "Cordless drill")
    }

    #[test]
    fn test_allocate_continues_numbering() {
        let mut tool = tool();
        let mut next = 10;
        let mut ids = || {
            next += 1;
            UnitId(next)
        };

        let first = tool.allocate_units(3, Condition::Good, &mut ids);
        let second = tool.allocate_units(2, Condition::Excellent, &mut ids);

        let numbers: Vec<u32> = first.iter().chain(&second).map(|u| u.unit_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(tool.total_quantity, 5);
        assert_eq!(tool.available_quantity, 5);
        assert_eq!(tool.last_unit_number, 5);
        assert!(second.iter().all(|u| u.condition == Condition::Excellent));
        assert!(second.iter().all(ToolUnit::is_borrowable));
    }

    #[test]
    fn test_borrowed_quantity_is_derived() {
        let mut tool = tool();
        tool.total_quantity = 5;
        tool.available_quantity = 3;
        assert_eq!(tool.borrowed_quantity(), 2);
    }

    #[test]
    fn test_retired_unit_is_not_borrowable() {
        let mut unit = ToolUnit::new(UnitId(1), ToolId(1), 1, Condition::Good);
        assert!(unit.is_borrowable());
        unit.retired_at = Some(Utc::now());
        assert!(!unit.is_borrowable());
        assert!(!unit.is_live());
    }

    #[test]
    fn test_display() {
        let mut tool = tool();
        tool.total_quantity = 5;
        tool.available_quantity = 3;
        assert_eq!(tool.to_string(), "tool-1 Cordless drill (3/5 available)");
    }
}
