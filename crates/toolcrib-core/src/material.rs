//! Consumable materials and consumption records.
//!
//! Materials are stocked as a single decimal quantity with no unit-level
//! tracking. Consumption is final: there is no return path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CategoryId, ConsumptionId, MaterialId};

/// A consumable stocked by quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Material id.
    pub id: MaterialId,
    /// Category the material is filed under.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// Quantity on hand. Never negative.
    pub current_quantity: Decimal,
    /// Reorder level.
    pub threshold_quantity: Decimal,
    /// Unit of measure (`kg`, `box`, `m`).
    pub unit: String,
}

impl Material {
    /// Whether stock is at or below the reorder level.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.current_quantity <= self.threshold_quantity
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} {}",
            self.id, self.name, self.current_quantity, self.unit
        )?;
        if self.is_low_stock() {
            write!(f, ", low stock")?;
        }
        write!(f, ")")
    }
}

/// One material line of a consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionItem {
    /// Material consumed.
    pub material_id: MaterialId,
    /// Quantity consumed.
    pub quantity: Decimal,
    /// Price per unit of measure, if known.
    pub unit_price: Option<Decimal>,
    /// `quantity * unit_price`, when a price is known.
    pub total_value: Option<Decimal>,
}

impl ConsumptionItem {
    /// Create a line, deriving `total_value` from the price.
    #[must_use]
    pub fn new(material_id: MaterialId, quantity: Decimal, unit_price: Option<Decimal>) -> Self {
        Self {
            material_id,
            quantity,
            unit_price,
            total_value: unit_price.map(|p| p * quantity),
        }
    }
}

/// One consumption event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionTransaction {
    /// Transaction id.
    pub id: ConsumptionId,
    /// Who used the materials.
    pub consumer_name: String,
    /// When the materials were taken.
    pub consumption_date: DateTime<Utc>,
    /// What they were used for.
    pub purpose: String,
    /// Project to book the usage against.
    pub project_name: Option<String>,
    /// Material lines.
    pub items: Vec<ConsumptionItem>,
}

impl ConsumptionTransaction {
    /// Sum of the known line values, `None` when no line has a price.
    #[must_use]
    pub fn total_value(&self) -> Option<Decimal> {
        self.items
            .iter()
            .filter_map(|i| i.total_value)
            .reduce(|a, b| a + b)
    }
}
