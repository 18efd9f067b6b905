//! Engine error taxonomy.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use toolcrib_core::{MaterialId, SelectionError, ToolId, TransactionId, TransactionStatus, UnitId};
use toolcrib_store::{CommitError, RowRef, StoreError};

/// Error kind, stable across message wording.
///
/// Codes are grouped by family:
/// - `L1xxx` lookup and input errors
/// - `L2xxx` transaction state errors
/// - `L3xxx` quantity and supply errors
/// - `L4xxx` unit errors
/// - `L5xxx` reference conflicts
/// - `L9xxx` backing store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// L1001: Entity id unknown.
    NotFound,
    /// L1002: Malformed request.
    InvalidInput,
    /// L2001: Operation not valid for the transaction's status.
    InvalidState,
    /// L2002: Transaction already returned.
    AlreadyCompleted,
    /// L2003: Date out of range.
    InvalidDate,
    /// L3001: Violates total/available bounds.
    InvalidQuantity,
    /// L3002: Not enough units available.
    InsufficientUnits,
    /// L3003: Not enough material in stock.
    InsufficientStock,
    /// L4001: A requested unit is not available.
    UnitUnavailable,
    /// L4002: A return does not cover every borrowed unit.
    IncompleteReturn,
    /// L5001: Blocked by references or a concurrent change.
    Conflict,
    /// L9001: Backing store failure.
    Storage,
}

impl ErrorKind {
    /// Get the error code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "L1001",
            Self::InvalidInput => "L1002",
            Self::InvalidState => "L2001",
            Self::AlreadyCompleted => "L2002",
            Self::InvalidDate => "L2003",
            Self::InvalidQuantity => "L3001",
            Self::InsufficientUnits => "L3002",
            Self::InsufficientStock => "L3003",
            Self::UnitUnavailable => "L4001",
            Self::IncompleteReturn => "L4002",
            Self::Conflict => "L5001",
            Self::Storage => "L9001",
        }
    }

    /// HTTP status a transport layer should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput
            | Self::InvalidState
            | Self::InvalidDate
            | Self::InvalidQuantity
            | Self::IncompleteReturn => 400,
            Self::AlreadyCompleted
            | Self::InsufficientUnits
            | Self::InsufficientStock
            | Self::UnitUnavailable
            | Self::Conflict => 409,
            Self::Storage => 503,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned by every engine operation.
///
/// A failed operation never leaves partial effects behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Entity id unknown.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity, e.g. `"tool"`.
        entity: &'static str,
        /// Display form of the id.
        id: String,
    },
    /// Malformed request.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation not valid for the transaction's status.
    #[error("cannot {action} {transaction}: status is {status}")]
    InvalidState {
        /// Transaction addressed.
        transaction: TransactionId,
        /// Its current status.
        status: TransactionStatus,
        /// Operation attempted.
        action: &'static str,
    },
    /// Date out of range.
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// Violates total/available bounds.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    /// Not enough units available.
    #[error("insufficient units of {tool}: requested {requested}, available {available}")]
    InsufficientUnits {
        /// Tool requested.
        tool: ToolId,
        /// Units requested.
        requested: u32,
        /// Units available.
        available: u32,
    },
    /// Not enough material in stock.
    #[error("insufficient stock of {material}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Material requested.
        material: MaterialId,
        /// Quantity requested.
        requested: Decimal,
        /// Quantity in stock.
        available: Decimal,
    },
    /// A requested unit is not available.
    #[error("{0} is not available")]
    UnitUnavailable(UnitId),
    /// A return does not cover every borrowed unit exactly once.
    #[error("incomplete return: {0}")]
    IncompleteReturn(String),
    /// Transaction already returned.
    #[error("{0} is already completed")]
    AlreadyCompleted(TransactionId),
    /// Blocked by references or a concurrent change.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Backing store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Build a [`LedgerError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidDate(_) => ErrorKind::InvalidDate,
            Self::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            Self::InsufficientUnits { .. } => ErrorKind::InsufficientUnits,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::UnitUnavailable(_) => ErrorKind::UnitUnavailable,
            Self::IncompleteReturn(_) => ErrorKind::IncompleteReturn,
            Self::AlreadyCompleted(_) => ErrorKind::AlreadyCompleted,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Map a selection failure for `tool`.
    pub(crate) fn from_selection(tool: ToolId, err: SelectionError) -> Self {
        match err {
            SelectionError::ZeroQuantity => {
                Self::InvalidInput(format!("quantity for {tool} must be at least 1"))
            }
            SelectionError::InsufficientUnits {
                requested,
                available,
            } => Self::InsufficientUnits {
                tool,
                requested,
                available,
            },
        }
    }
}

impl From<CommitError> for LedgerError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Stale(row) => Self::Conflict(format!("{row} was modified concurrently")),
            CommitError::Missing(row) => match row {
                RowRef::Tool(id) => Self::not_found("tool", id),
                RowRef::Unit(id) => Self::not_found("unit", id),
                RowRef::Transaction(id) => Self::not_found("transaction", id),
                RowRef::Material(id) => Self::not_found("material", id),
                RowRef::Consumption(id) => Self::not_found("consumption", id),
            },
            CommitError::AlreadyExists(row) => Self::Conflict(format!("{row} already exists")),
            CommitError::NotEnoughAvailable {
                tool,
                requested,
                available,
            } => Self::InsufficientUnits {
                tool,
                requested,
                available,
            },
            CommitError::InsufficientStock {
                material,
                requested,
                available,
            } => Self::InsufficientStock {
                material,
                requested,
                available,
            },
            CommitError::OpenLoans { tool, transaction } => {
                Self::Conflict(format!("{tool} is referenced by open loan {transaction}"))
            }
            CommitError::Store(e) => Self::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::InvalidInput,
            ErrorKind::InvalidState,
            ErrorKind::AlreadyCompleted,
            ErrorKind::InvalidDate,
            ErrorKind::InvalidQuantity,
            ErrorKind::InsufficientUnits,
            ErrorKind::InsufficientStock,
            ErrorKind::UnitUnavailable,
            ErrorKind::IncompleteReturn,
            ErrorKind::Conflict,
            ErrorKind::Storage,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_http_mapping() {
        assert_eq!(ErrorKind::Conflict.http_status(), 409);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::InvalidState.http_status(), 400);
        assert_eq!(ErrorKind::InvalidQuantity.http_status(), 400);
    }

    #[test]
    fn test_commit_errors_map_to_kinds() {
        let stale: LedgerError = CommitError::Stale(RowRef::Tool(ToolId(1))).into();
        assert_eq!(stale.kind(), ErrorKind::Conflict);

        let missing: LedgerError = CommitError::Missing(RowRef::Unit(UnitId(3))).into();
        assert_eq!(missing, LedgerError::not_found("unit", UnitId(3)));
        assert_eq!(missing.to_string(), "unit unit-3 not found");

        let short: LedgerError = CommitError::NotEnoughAvailable {
            tool: ToolId(1),
            requested: 4,
            available: 3,
        }
        .into();
        assert_eq!(short.kind(), ErrorKind::InsufficientUnits);
    }
}
