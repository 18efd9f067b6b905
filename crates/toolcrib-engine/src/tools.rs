//! Tool aggregate operations and the quantity-adjustment rule.

use toolcrib_core::{
    has_active_borrowing, select_units, BorrowingTransaction, NewTool, SelectionPreference, Tool,
    ToolEdit, ToolId, ToolUnit,
};
use toolcrib_store::{Changeset, LedgerStore, RowRef, Versioned, Write};

use crate::engine::require_name;
use crate::units::stage_unit;
use crate::{Clock, Engine, LedgerError};

/// What a total-quantity edit does to a tool's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// The total is unchanged.
    Unchanged,
    /// Allocate this many new units.
    Grow(u32),
    /// Retire this many available units.
    Shrink(u32),
}

/// Outcome of [`resize`]: the unit change plus the new available count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Unit change.
    pub resize: Resize,
    /// Available quantity after the change.
    pub available: u32,
}

/// The quantity-adjustment rule.
///
/// The total may not drop below the borrowed count. Otherwise the available
/// count moves by the same delta as the total, clamped to `0..=new_total`.
/// A shrink retires only available units, so there are always enough of them
/// and the clamp never bites.
///
/// ```
/// use toolcrib_engine::{resize, Resize};
///
/// // 5 total, 1 available: 4 are out on loan
/// assert!(resize(5, 1, 3).is_err());
///
/// let plan = resize(5, 3, 4).unwrap();
/// assert_eq!(plan.resize, Resize::Shrink(1));
/// assert_eq!(plan.available, 2);
/// ```
pub fn resize(total: u32, available: u32, new_total: u32) -> Result<ResizePlan, LedgerError> {
    let borrowed = total.saturating_sub(available);
    if new_total < borrowed {
        return Err(LedgerError::InvalidQuantity(format!(
            "cannot reduce total to {new_total}: {borrowed} units are borrowed"
        )));
    }

    let delta = i64::from(new_total) - i64::from(total);
    let available = (i64::from(available) + delta).clamp(0, i64::from(new_total));
    let available = u32::try_from(available).unwrap_or(new_total);

    let resize = match new_total.cmp(&total) {
        std::cmp::Ordering::Equal => Resize::Unchanged,
        std::cmp::Ordering::Greater => Resize::Grow(new_total - total),
        std::cmp::Ordering::Less => Resize::Shrink(total - new_total),
    };
    Ok(ResizePlan { resize, available })
}

/// What [`Engine::delete_tool`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolDeletion {
    /// The tool had never been lent and was removed with its units.
    Removed,
    /// The tool has loan history and was archived instead.
    Archived,
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Create a tool together with its initial units.
    pub fn create_tool(&self, new: NewTool) -> Result<Tool, LedgerError> {
        require_name("tool name", &new.name)?;

        let mut tool = Tool::new(self.next_id(), new.category_id, new.name.trim());
        tool.location = new.location;
        tool.supplier = new.supplier;
        let units = tool.allocate_units(new.total_quantity, new.initial_condition, || {
            self.next_id()
        });

        let mut changeset = Changeset::new();
        changeset
            .push(Write::PutTool(tool.clone()))
            .extend(units.into_iter().map(Write::PutUnit));
        self.commit(changeset)?;
        Ok(tool)
    }

    /// Edit a tool's descriptive fields. Counters are not touched.
    pub fn update_tool(&self, tool_id: ToolId, edit: ToolEdit) -> Result<Tool, LedgerError> {
        let Versioned { version, value: mut tool } = self.load_live_tool(tool_id)?;
        if let Some(name) = edit.name {
            require_name("tool name", &name)?;
            tool.name = name.trim().to_string();
        }
        if let Some(category_id) = edit.category_id {
            tool.category_id = category_id;
        }
        if edit.location.is_some() {
            tool.location = edit.location;
        }
        if edit.supplier.is_some() {
            tool.supplier = edit.supplier;
        }

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Tool(tool_id), version)
            .push(Write::PutTool(tool.clone()));
        self.commit(changeset)?;
        Ok(tool)
    }

    /// Set a tool's total quantity and return the new available quantity.
    ///
    /// Growing allocates units in the configured replenish condition.
    /// Shrinking retires available units, worst condition first. Any loan or
    /// return committed between the read and the commit fails the call with
    /// [`LedgerError::Conflict`].
    pub fn adjust_quantity(&self, tool_id: ToolId, new_total: u32) -> Result<u32, LedgerError> {
        let Versioned { version, value: mut tool } = self.load_live_tool(tool_id)?;
        let plan = resize(tool.total_quantity, tool.available_quantity, new_total)?;

        let mut changeset = Changeset::new();
        changeset.expect_version(RowRef::Tool(tool_id), version);

        match plan.resize {
            Resize::Unchanged => return Ok(tool.available_quantity),
            Resize::Grow(count) => {
                let units = tool.allocate_units(count, self.options().replenish_condition, || {
                    self.next_id()
                });
                changeset.extend(units.into_iter().map(Write::PutUnit));
            }
            Resize::Shrink(count) => {
                let units = self.store().units_of(tool_id)?;
                let live: Vec<ToolUnit> = units.iter().map(|u| u.value.clone()).collect();
                let retired = select_units(&live, count, SelectionPreference::WorstFirst)
                    .map_err(|e| LedgerError::from_selection(tool_id, e))?;
                let now = self.now();
                for unit in units.iter().filter(|u| retired.contains(&u.value.id)) {
                    stage_unit(&mut changeset, unit, |u| {
                        u.is_available = false;
                        u.retired_at = Some(now);
                    });
                }
            }
        }

        tool.total_quantity = new_total;
        tool.available_quantity = plan.available;
        changeset.push(Write::PutTool(tool));
        self.commit(changeset)?;
        Ok(plan.available)
    }

    /// Delete a tool.
    ///
    /// Fails with [`LedgerError::Conflict`] while any open loan references
    /// the tool. A tool with only completed loans is archived so its history
    /// stays resolvable; a tool that was never lent is removed outright.
    pub fn delete_tool(&self, tool_id: ToolId) -> Result<ToolDeletion, LedgerError> {
        let Versioned { version, value: mut tool } = self.load_live_tool(tool_id)?;
        let loans: Vec<BorrowingTransaction> = self
            .store()
            .transactions()?
            .into_iter()
            .map(|t| t.value)
            .filter(|t| t.references_tool(tool_id))
            .collect();

        if let Some(open) = loans.iter().find(|t| t.is_open()) {
            return Err(LedgerError::Conflict(format!(
                "{tool_id} is referenced by open loan {}",
                open.id
            )));
        }

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Tool(tool_id), version)
            .expect_no_open_loans(tool_id);

        let deletion = if loans.is_empty() {
            changeset.push(Write::RemoveTool(tool_id));
            ToolDeletion::Removed
        } else {
            tool.archived_at = Some(self.now());
            changeset.push(Write::PutTool(tool));
            ToolDeletion::Archived
        };
        self.commit(changeset)?;
        Ok(deletion)
    }

    /// Look up a tool, archived ones included.
    pub fn tool(&self, tool_id: ToolId) -> Result<Tool, LedgerError> {
        Ok(self.load_tool(tool_id)?.value)
    }

    /// All tools that are not archived.
    pub fn tools(&self) -> Result<Vec<Tool>, LedgerError> {
        Ok(self
            .store()
            .tools()?
            .into_iter()
            .map(|t| t.value)
            .filter(|t| !t.is_archived())
            .collect())
    }

    /// Open loans that include the tool.
    pub fn open_loans_for_tool(
        &self,
        tool_id: ToolId,
    ) -> Result<Vec<BorrowingTransaction>, LedgerError> {
        self.load_tool(tool_id)?;
        Ok(self
            .store()
            .transactions()?
            .into_iter()
            .map(|t| t.value)
            .filter(|t| t.is_open() && t.references_tool(tool_id))
            .collect())
    }

    /// Whether any open loan includes the tool.
    pub fn has_active_borrowing(&self, tool_id: ToolId) -> Result<bool, LedgerError> {
        let loans = self.store().transactions()?;
        Ok(has_active_borrowing(
            tool_id,
            loans.iter().map(|t| &t.value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_resize_below_borrowed_fails() {
        let err = resize(5, 1, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
    }

    #[test]
    fn test_resize_to_exactly_borrowed() {
        let plan = resize(5, 1, 4).unwrap();
        assert_eq!(plan.resize, Resize::Shrink(1));
        assert_eq!(plan.available, 0);
    }

    #[test]
    fn test_resize_grow_adds_to_available() {
        let plan = resize(5, 2, 8).unwrap();
        assert_eq!(plan.resize, Resize::Grow(3));
        assert_eq!(plan.available, 5);
    }

    #[test]
    fn test_resize_unchanged() {
        let plan = resize(5, 2, 5).unwrap();
        assert_eq!(plan.resize, Resize::Unchanged);
        assert_eq!(plan.available, 2);
    }

    #[test]
    fn test_resize_to_zero_with_nothing_borrowed() {
        let plan = resize(3, 3, 0).unwrap();
        assert_eq!(plan.resize, Resize::Shrink(3));
        assert_eq!(plan.available, 0);
    }
}
