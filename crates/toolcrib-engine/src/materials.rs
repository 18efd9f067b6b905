//! Material stock and consumption.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use toolcrib_core::{
    ConsumeRequest, ConsumptionItem, ConsumptionTransaction, Material, MaterialId, NewMaterial,
};
use toolcrib_store::{Changeset, LedgerStore, RowRef, Versioned, Write};

use crate::engine::require_name;
use crate::{Clock, Engine, LedgerError};

fn require_non_negative(field: &str, value: Decimal) -> Result<(), LedgerError> {
    if value < Decimal::ZERO {
        return Err(LedgerError::InvalidQuantity(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Create a material.
    pub fn create_material(&self, new: NewMaterial) -> Result<Material, LedgerError> {
        require_name("material name", &new.name)?;
        require_non_negative("current quantity", new.current_quantity)?;
        require_non_negative("threshold quantity", new.threshold_quantity)?;

        let material = Material {
            id: self.next_id(),
            category_id: new.category_id,
            name: new.name.trim().to_string(),
            current_quantity: new.current_quantity,
            threshold_quantity: new.threshold_quantity,
            unit: new.unit,
        };
        let mut changeset = Changeset::new();
        changeset.push(Write::PutMaterial(material.clone()));
        self.commit(changeset)?;
        Ok(material)
    }

    /// Set a material's stock and reorder threshold.
    pub fn update_material_quantity(
        &self,
        material_id: MaterialId,
        current_quantity: Decimal,
        threshold_quantity: Decimal,
    ) -> Result<Material, LedgerError> {
        require_non_negative("current quantity", current_quantity)?;
        require_non_negative("threshold quantity", threshold_quantity)?;

        let Versioned {
            version,
            value: mut material,
        } = self.load_material(material_id)?;
        material.current_quantity = current_quantity;
        material.threshold_quantity = threshold_quantity;

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Material(material_id), version)
            .push(Write::PutMaterial(material.clone()));
        self.commit(changeset)?;
        Ok(material)
    }

    /// Consume materials. Consumption is final.
    ///
    /// Lines naming the same material are summed before the stock check, so
    /// a request can never drive stock negative by splitting a line.
    pub fn consume(&self, request: ConsumeRequest) -> Result<ConsumptionTransaction, LedgerError> {
        require_name("consumer name", &request.consumer_name)?;
        if request.items.is_empty() {
            return Err(LedgerError::InvalidInput(
                "a consumption needs at least one item".to_string(),
            ));
        }

        let mut totals: BTreeMap<MaterialId, Decimal> = BTreeMap::new();
        for line in &request.items {
            if line.quantity <= Decimal::ZERO {
                return Err(LedgerError::InvalidQuantity(format!(
                    "quantity of {} must be positive, got {}",
                    line.material_id, line.quantity
                )));
            }
            if let Some(price) = line.unit_price {
                require_non_negative("unit price", price)?;
            }
            *totals.entry(line.material_id).or_default() += line.quantity;
        }

        let mut changeset = Changeset::new();
        for (&material_id, &quantity) in &totals {
            let material = self.load_material(material_id)?.value;
            if quantity > material.current_quantity {
                return Err(LedgerError::InsufficientStock {
                    material: material_id,
                    requested: quantity,
                    available: material.current_quantity,
                });
            }
            changeset.push(Write::ConsumeStock {
                material: material_id,
                quantity,
            });
        }

        let transaction = ConsumptionTransaction {
            id: self.next_id(),
            consumer_name: request.consumer_name.trim().to_string(),
            consumption_date: self.now(),
            purpose: request.purpose,
            project_name: request.project_name,
            items: request
                .items
                .into_iter()
                .map(|l| ConsumptionItem::new(l.material_id, l.quantity, l.unit_price))
                .collect(),
        };
        changeset.push(Write::PutConsumption(transaction.clone()));
        self.commit(changeset)?;
        Ok(transaction)
    }

    /// Look up a material.
    pub fn material(&self, material_id: MaterialId) -> Result<Material, LedgerError> {
        Ok(self.load_material(material_id)?.value)
    }

    /// All materials.
    pub fn materials(&self) -> Result<Vec<Material>, LedgerError> {
        Ok(self
            .store()
            .materials()?
            .into_iter()
            .map(|m| m.value)
            .collect())
    }

    /// Materials at or below their reorder threshold.
    pub fn low_stock_materials(&self) -> Result<Vec<Material>, LedgerError> {
        let mut materials = self.materials()?;
        materials.retain(Material::is_low_stock);
        Ok(materials)
    }

    /// All consumption transactions.
    pub fn consumptions(&self) -> Result<Vec<ConsumptionTransaction>, LedgerError> {
        Ok(self.store().consumptions()?)
    }
}
