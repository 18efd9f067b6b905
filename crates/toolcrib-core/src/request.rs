//! Requests accepted by the engine and the outcomes it reports.
//!
//! Borrow and consume payloads share an entry point through the [`Request`]
//! sum type, so callers never dispatch on a free-form field:
//!
//! ```
//! use toolcrib_core::{Request, UnitSelection};
//!
//! let json = r#"{
//!     "type": "borrow",
//!     "borrower_name": "Ana",
//!     "due_date": "2024-03-05T17:00:00Z",
//!     "purpose": "Shelving",
//!     "items": [{ "tool_id": 7, "quantity": 2 }]
//! }"#;
//!
//! let request: Request = serde_json::from_str(json).unwrap();
//! let Request::Borrow(borrow) = request else { panic!("expected a borrow") };
//! assert_eq!(borrow.items[0].selection, UnitSelection::Quantity(2));
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    BorrowedUnitId, BorrowingTransaction, CategoryId, Condition, ConsumptionId, ItemId,
    MaterialId, ToolId, TransactionId, UnitId,
};

/// How a borrow line chooses its units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSelection {
    /// These exact units.
    Units(Vec<UnitId>),
    /// This many units, picked by the selection policy.
    Quantity(u32),
}

/// One tool's part of a borrow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowLine {
    /// Tool to borrow from.
    pub tool_id: ToolId,
    /// Which units to take.
    #[serde(flatten)]
    pub selection: UnitSelection,
}

/// Request to lend units to a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequest {
    /// Who takes the units.
    pub borrower_name: String,
    /// When the units are due back.
    pub due_date: DateTime<Utc>,
    /// What the units are needed for.
    #[serde(default)]
    pub purpose: String,
    /// Lines, at least one.
    pub items: Vec<BorrowLine>,
}

impl BorrowRequest {
    /// Create a request with no lines.
    #[must_use]
    pub fn new(borrower_name: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            borrower_name: borrower_name.into(),
            due_date,
            purpose: String::new(),
            items: Vec::new(),
        }
    }

    /// Set the purpose.
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Borrow these exact units of a tool.
    #[must_use]
    pub fn with_units(mut self, tool_id: ToolId, units: impl IntoIterator<Item = UnitId>) -> Self {
        self.items.push(BorrowLine {
            tool_id,
            selection: UnitSelection::Units(units.into_iter().collect()),
        });
        self
    }

    /// Borrow a quantity of a tool.
    #[must_use]
    pub fn with_quantity(mut self, tool_id: ToolId, quantity: u32) -> Self {
        self.items.push(BorrowLine {
            tool_id,
            selection: UnitSelection::Quantity(quantity),
        });
        self
    }
}

/// Condition report for one returned unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReturn {
    /// The borrowed unit row being returned.
    pub borrowed_unit_id: BorrowedUnitId,
    /// Condition the unit came back in.
    pub return_condition: Condition,
    /// Notes to store on the unit.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Returns for one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReturn {
    /// Line item being returned.
    pub borrowing_item_id: ItemId,
    /// One entry per borrowed unit of the item.
    pub unit_returns: Vec<UnitReturn>,
}

/// Request to close a borrowing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// Transaction to close.
    pub transaction_id: TransactionId,
    /// Returns for every line item.
    pub items: Vec<ItemReturn>,
    /// Notes to store on the transaction.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReturnRequest {
    /// Create a request with no returns.
    #[must_use]
    pub const fn new(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            items: Vec::new(),
            notes: None,
        }
    }

    /// Return every unit of `transaction` in the same condition.
    #[must_use]
    pub fn uniform(transaction: &BorrowingTransaction, condition: Condition) -> Self {
        let mut request = Self::new(transaction.id);
        for item in &transaction.items {
            for unit in &item.units {
                request = request.with_unit(item.id, unit.id, condition);
            }
        }
        request
    }

    /// Add a unit return under its line item.
    #[must_use]
    pub fn with_unit(
        mut self,
        item_id: ItemId,
        borrowed_unit_id: BorrowedUnitId,
        condition: Condition,
    ) -> Self {
        let unit = UnitReturn {
            borrowed_unit_id,
            return_condition: condition,
            notes: None,
        };
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.borrowing_item_id == item_id)
        {
            item.unit_returns.push(unit);
        } else {
            self.items.push(ItemReturn {
                borrowing_item_id: item_id,
                unit_returns: vec![unit],
            });
        }
        self
    }

    /// Set the transaction notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Request to move a loan's due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendRequest {
    /// Transaction to extend.
    pub transaction_id: TransactionId,
    /// New due date, must be in the future.
    pub new_due_date: DateTime<Utc>,
    /// Why the loan is extended.
    #[serde(default)]
    pub reason: String,
}

/// One material line of a consumption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeLine {
    /// Material to take.
    pub material_id: MaterialId,
    /// Quantity to take.
    pub quantity: Decimal,
    /// Price per unit of measure, if known.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// Request to consume materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeRequest {
    /// Who uses the materials.
    pub consumer_name: String,
    /// What they are used for.
    #[serde(default)]
    pub purpose: String,
    /// Project to book the usage against.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Lines, at least one.
    pub items: Vec<ConsumeLine>,
}

impl ConsumeRequest {
    /// Create a request with no lines.
    #[must_use]
    pub fn new(consumer_name: impl Into<String>) -> Self {
        Self {
            consumer_name: consumer_name.into(),
            purpose: String::new(),
            project_name: None,
            items: Vec::new(),
        }
    }

    /// Set the purpose.
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Set the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_name = Some(project.into());
        self
    }

    /// Add a material line.
    #[must_use]
    pub fn with_item(mut self, material_id: MaterialId, quantity: Decimal) -> Self {
        self.items.push(ConsumeLine {
            material_id,
            quantity,
            unit_price: None,
        });
        self
    }

    /// Add a priced material line.
    #[must_use]
    pub fn with_priced_item(
        mut self,
        material_id: MaterialId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        self.items.push(ConsumeLine {
            material_id,
            quantity,
            unit_price: Some(unit_price),
        });
        self
    }
}

/// A request that takes stock off the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Lend tool units.
    Borrow(BorrowRequest),
    /// Consume materials.
    Consume(ConsumeRequest),
}

/// Result of an accepted [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A borrowing transaction was created.
    Borrowed {
        /// The new transaction.
        transaction_id: TransactionId,
    },
    /// A consumption transaction was created.
    Consumed {
        /// The new transaction.
        transaction_id: ConsumptionId,
    },
}

/// Input for creating a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTool {
    /// Display name.
    pub name: String,
    /// Category.
    pub category_id: CategoryId,
    /// Units to create.
    pub total_quantity: u32,
    /// Storage location.
    #[serde(default)]
    pub location: Option<String>,
    /// Supplier.
    #[serde(default)]
    pub supplier: Option<String>,
    /// Condition of the initial units.
    #[serde(default)]
    pub initial_condition: Condition,
}

impl NewTool {
    /// Create input for `total_quantity` units in `GOOD` condition.
    #[must_use]
    pub fn new(name: impl Into<String>, category_id: CategoryId, total_quantity: u32) -> Self {
        Self {
            name: name.into(),
            category_id,
            total_quantity,
            location: None,
            supplier: None,
            initial_condition: Condition::default(),
        }
    }

    /// Set the initial condition.
    #[must_use]
    pub const fn with_condition(mut self, condition: Condition) -> Self {
        self.initial_condition = condition;
        self
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
}

/// Descriptive fields to change on a tool. `None` leaves a field as is.
///
/// Counters are not editable here; see the quantity adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEdit {
    /// New name.
    pub name: Option<String>,
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New location.
    pub location: Option<String>,
    /// New supplier.
    pub supplier: Option<String>,
}

/// Input for creating a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    /// Display name.
    pub name: String,
    /// Category.
    pub category_id: CategoryId,
    /// Opening stock.
    pub current_quantity: Decimal,
    /// Reorder level.
    pub threshold_quantity: Decimal,
    /// Unit of measure.
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_borrow_line_json_shapes() {
        let explicit: BorrowLine = serde_json::from_str(r#"{"tool_id": 1, "units": [4, 5]}"#).unwrap();
        assert_eq!(
            explicit.selection,
            UnitSelection::Units(vec![UnitId(4), UnitId(5)])
        );

        let counted: BorrowLine = serde_json::from_str(r#"{"tool_id": 1, "quantity": 3}"#).unwrap();
        assert_eq!(counted.selection, UnitSelection::Quantity(3));
    }

    #[test]
    fn test_consume_request_tag() {
        let request = Request::Consume(
            ConsumeRequest::new("Ben")
                .with_purpose("Deck")
                .with_item(MaterialId(2), dec!(1.5)),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "consume");
        let back: Request = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_with_unit_groups_by_item() {
        let request = ReturnRequest::new(TransactionId(1))
            .with_unit(ItemId(1), BorrowedUnitId(1), Condition::Good)
            .with_unit(ItemId(2), BorrowedUnitId(2), Condition::Poor)
            .with_unit(ItemId(1), BorrowedUnitId(3), Condition::Fair);
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].unit_returns.len(), 2);
    }

    #[test]
    fn test_borrow_builder() {
        let due = Utc.with_ymd_and_hms(2024, 3, 5, 17, 0, 0).unwrap();
        let request = BorrowRequest::new("Ana", due)
            .with_purpose("Shelving")
            .with_quantity(ToolId(1), 2)
            .with_units(ToolId(2), [UnitId(9)]);
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.purpose, "Shelving");
    }
}
