//! Borrowing transactions and their derived state.
//!
//! A [`BorrowingTransaction`] moves through
//! `ACTIVE -> OVERDUE -> COMPLETED` or straight from `ACTIVE` to
//! `COMPLETED`. `COMPLETED` is terminal and only reached through a return.
//!
//! The stored `OVERDUE` status is a cache maintained by a sweep. Whether a
//! loan is overdue is always derivable from `(now, transaction)` through
//! [`BorrowingTransaction::effective_status`],
//! [`BorrowingTransaction::is_overdue`] and
//! [`BorrowingTransaction::days_overdue`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{BorrowedUnitId, Condition, ItemId, ToolId, TransactionId, UnitId};

/// Lifecycle status of a borrowing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Lent out, not yet due.
    Active,
    /// Lent out, past its due date.
    Overdue,
    /// Returned. Terminal.
    Completed,
}

impl TransactionStatus {
    /// Whether units are still out under this status.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Overdue)
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "OVERDUE" => Ok(Self::Overdue),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(format!("unknown transaction status: {s}")),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Overdue => write!(f, "OVERDUE"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Reference to one physical unit lent under a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedUnit {
    /// Row id.
    pub id: BorrowedUnitId,
    /// Owning line item.
    pub borrowing_item_id: ItemId,
    /// The lent unit. Lookup only, the unit is not owned.
    pub tool_unit_id: UnitId,
    /// Unit condition when it left the shelf.
    pub original_condition: Condition,
    /// Unit condition when it came back.
    pub return_condition: Option<Condition>,
    /// Notes recorded at return.
    pub notes: Option<String>,
}

/// One tool's share of a borrowing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingItem {
    /// Row id.
    pub id: ItemId,
    /// Owning transaction.
    pub borrowing_transaction_id: TransactionId,
    /// Tool the units belong to.
    pub tool_id: ToolId,
    /// Number of units lent. Always equals `units.len()`.
    pub quantity: u32,
    /// Worst condition among the units at borrow time.
    pub original_condition: Condition,
    /// Worst condition among the units at return time.
    pub return_condition: Option<Condition>,
    /// When the units came back.
    pub return_date: Option<DateTime<Utc>>,
    /// The lent units.
    pub units: Vec<BorrowedUnit>,
}

impl BorrowingItem {
    /// Find a borrowed unit row by id.
    #[must_use]
    pub fn unit(&self, id: BorrowedUnitId) -> Option<&BorrowedUnit> {
        self.units.iter().find(|u| u.id == id)
    }
}

/// Append-only audit record of a due date change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateExtension {
    /// Due date before the change.
    pub previous_due_date: DateTime<Utc>,
    /// Due date after the change.
    pub new_due_date: DateTime<Utc>,
    /// Why the loan was extended.
    pub reason: String,
    /// When the extension was granted.
    pub extended_at: DateTime<Utc>,
}

/// One lending event covering one or more tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingTransaction {
    /// Transaction id.
    pub id: TransactionId,
    /// Who took the units.
    pub borrower_name: String,
    /// When the units left the shelf.
    pub borrow_date: DateTime<Utc>,
    /// When the units are due back.
    pub due_date: DateTime<Utc>,
    /// When the units came back.
    pub return_date: Option<DateTime<Utc>>,
    /// Stored status. See [`Self::effective_status`] for the derived one.
    pub status: TransactionStatus,
    /// What the units are needed for.
    pub purpose: String,
    /// Notes recorded at return.
    pub notes: Option<String>,
    /// One line per tool.
    pub items: Vec<BorrowingItem>,
    /// Due date changes, oldest first.
    pub extensions: Vec<DueDateExtension>,
}

impl BorrowingTransaction {
    /// Whether units are still out.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Status as of `now`, regardless of when the sweep last ran.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> TransactionStatus {
        match self.status {
            TransactionStatus::Completed => TransactionStatus::Completed,
            TransactionStatus::Active | TransactionStatus::Overdue => {
                if now > self.due_date {
                    TransactionStatus::Overdue
                } else {
                    TransactionStatus::Active
                }
            }
        }
    }

    /// Whether the loan is open and past its due date.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == TransactionStatus::Overdue
    }

    /// Started days past the due date, zero when not overdue.
    ///
    /// Any part of a day counts as a full day, so a loan one hour late is
    /// one day overdue.
    #[must_use]
    pub fn days_overdue(&self, now: DateTime<Utc>) -> u32 {
        if !self.is_overdue(now) {
            return 0;
        }
        let late = now - self.due_date;
        let whole = late.num_days();
        let days = if late > Duration::days(whole) {
            whole + 1
        } else {
            whole
        };
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Total units lent under this transaction.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Find a line item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&BorrowingItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Whether any line item lends units of `tool_id`.
    #[must_use]
    pub fn references_tool(&self, tool_id: ToolId) -> bool {
        self.items.iter().any(|i| i.tool_id == tool_id)
    }

    /// All unit ids lent under this transaction.
    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.items
            .iter()
            .flat_map(|i| i.units.iter().map(|u| u.tool_unit_id))
    }
}

/// Whether any open transaction lends units of `tool_id`.
pub fn has_active_borrowing<'a, I>(tool_id: ToolId, transactions: I) -> bool
where
    I: IntoIterator<Item = &'a BorrowingTransaction>,
{
    transactions
        .into_iter()
        .any(|t| t.is_open() && t.references_tool(tool_id))
}
