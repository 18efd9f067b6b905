//! Engine configuration.

use serde::{Deserialize, Serialize};
use toolcrib_core::{Condition, SelectionPreference};

/// Tunable engine behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Order in which quantity borrows pick units.
    pub selection: SelectionPreference,
    /// Condition of units added when a tool's total is raised.
    pub replenish_condition: Condition,
    /// Longest allowed loan, measured from the borrow date, in days.
    pub max_loan_days: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            selection: SelectionPreference::BestFirst,
            replenish_condition: Condition::Excellent,
            max_loan_days: None,
        }
    }
}

impl EngineOptions {
    /// Set the selection preference.
    #[must_use]
    pub const fn with_selection(mut self, selection: SelectionPreference) -> Self {
        self.selection = selection;
        self
    }

    /// Set the condition of replenished units.
    #[must_use]
    pub const fn with_replenish_condition(mut self, condition: Condition) -> Self {
        self.replenish_condition = condition;
        self
    }

    /// Cap loan length.
    #[must_use]
    pub const fn with_max_loan_days(mut self, days: u32) -> Self {
        self.max_loan_days = Some(days);
        self
    }
}
