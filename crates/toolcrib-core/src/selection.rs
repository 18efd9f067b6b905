//! Unit selection policy.
//!
//! When a borrow asks for a quantity instead of naming units, the units are
//! picked by [`select_units`]. The function is pure so its ordering rules can
//! be tested on their own:
//!
//! 1. Only borrowable units (available and not retired) are considered.
//! 2. Units are ordered by the [`SelectionPreference`].
//! 3. Ties are broken by ascending unit number.
//! 4. The first `quantity` units are taken.

use thiserror::Error;

use crate::{SelectionPreference, ToolUnit, UnitId};

/// Error returned when units cannot be selected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A quantity of zero was requested.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Fewer units are available than requested.
    #[error("insufficient units: requested {requested}, available {available}")]
    InsufficientUnits {
        /// Units requested.
        requested: u32,
        /// Units available.
        available: u32,
    },
}

/// Pick `quantity` unit ids from `units` under `preference`.
///
/// Units that are not borrowable are skipped, so callers may pass a tool's
/// whole unit list.
pub fn select_units(
    units: &[ToolUnit],
    quantity: u32,
    preference: SelectionPreference,
) -> Result<Vec<UnitId>, SelectionError> {
    if quantity == 0 {
        return Err(SelectionError::ZeroQuantity);
    }

    let mut candidates: Vec<&ToolUnit> = units.iter().filter(|u| u.is_borrowable()).collect();

    let available = candidates.len() as u32;
    if available < quantity {
        return Err(SelectionError::InsufficientUnits {
            requested: quantity,
            available,
        });
    }

    match preference {
        SelectionPreference::BestFirst => {
            candidates.sort_by(|a, b| {
                b.condition
                    .cmp(&a.condition)
                    .then(a.unit_number.cmp(&b.unit_number))
            });
        }
        SelectionPreference::WorstFirst => {
            candidates.sort_by(|a, b| {
                a.condition
                    .cmp(&b.condition)
                    .then(a.unit_number.cmp(&b.unit_number))
            });
        }
        SelectionPreference::LowestNumber => {
            candidates.sort_by_key(|u| u.unit_number);
        }
    }

    Ok(candidates
        .into_iter()
        .take(quantity as usize)
        .map(|u| u.id)
        .collect())
}
