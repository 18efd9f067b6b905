//! Unit store operations.

use toolcrib_core::{Condition, ToolId, ToolUnit, UnitId};
use toolcrib_store::{Changeset, LedgerStore, RowRef, Versioned, Write};

use crate::{Clock, Engine, LedgerError};

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Add `count` new available units to a tool.
    ///
    /// Unit numbers continue from the tool's highest number ever issued and
    /// both counters grow by `count`.
    pub fn create_units(
        &self,
        tool_id: ToolId,
        count: u32,
        condition: Condition,
    ) -> Result<Vec<ToolUnit>, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidQuantity(
                "unit count must be at least 1".to_string(),
            ));
        }
        let Versioned { version, value: mut tool } = self.load_live_tool(tool_id)?;
        let units = tool.allocate_units(count, condition, || self.next_id());

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Tool(tool_id), version)
            .push(Write::PutTool(tool))
            .extend(units.iter().cloned().map(Write::PutUnit));
        self.commit(changeset)?;
        Ok(units)
    }

    /// Set a unit's condition by administrative edit.
    ///
    /// `notes` replaces the unit's notes when given and leaves them alone
    /// otherwise. Availability is never touched here.
    pub fn set_condition(
        &self,
        unit_id: UnitId,
        condition: Condition,
        notes: Option<String>,
    ) -> Result<ToolUnit, LedgerError> {
        let Versioned { version, value: mut unit } = self.load_unit(unit_id)?;
        unit.condition = condition;
        if notes.is_some() {
            unit.notes = notes;
        }

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Unit(unit_id), version)
            .push(Write::PutUnit(unit.clone()));
        self.commit(changeset)?;
        Ok(unit)
    }

    /// Look up a unit, retired or not.
    pub fn unit(&self, unit_id: UnitId) -> Result<ToolUnit, LedgerError> {
        Ok(self.load_unit(unit_id)?.value)
    }

    /// Live units of a tool, by unit number.
    pub fn list_units(&self, tool_id: ToolId) -> Result<Vec<ToolUnit>, LedgerError> {
        self.load_tool(tool_id)?;
        let mut units: Vec<ToolUnit> = self
            .store()
            .units_of(tool_id)?
            .into_iter()
            .map(|u| u.value)
            .filter(ToolUnit::is_live)
            .collect();
        units.sort_by_key(|u| u.unit_number);
        Ok(units)
    }

    /// Units of a tool that can be borrowed right now, by unit number.
    pub fn list_available(&self, tool_id: ToolId) -> Result<Vec<ToolUnit>, LedgerError> {
        let mut units = self.list_units(tool_id)?;
        units.retain(ToolUnit::is_borrowable);
        Ok(units)
    }
}

/// Stage an edit of a unit read at `unit.version`.
///
/// Borrow and return are the only flows that flip availability, and they
/// do it through here.
pub(crate) fn stage_unit(
    changeset: &mut Changeset,
    unit: &Versioned<ToolUnit>,
    edit: impl FnOnce(&mut ToolUnit),
) -> ToolUnit {
    let mut row = unit.value.clone();
    edit(&mut row);
    changeset
        .expect_version(RowRef::Unit(row.id), unit.version)
        .push(Write::PutUnit(row.clone()));
    row
}
