//! Store error types.

use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;
use toolcrib_core::{MaterialId, ToolId, TransactionId};

use crate::RowRef;

/// Error returned when the backing store itself fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A snapshot file could not be read.
    #[error("failed to read {}: {message}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// A snapshot file could not be written.
    #[error("failed to write {}: {message}", .path.display())]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// A snapshot file is not valid JSON for a snapshot.
    #[error("invalid snapshot {}: {message}", .path.display())]
    Format {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// A snapshot was written by an incompatible version.
    #[error("unsupported snapshot format {found} (expected {expected})")]
    UnsupportedFormat {
        /// Format found in the file.
        found: u32,
        /// Format this build reads.
        expected: u32,
    },
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Error returned when a changeset is rejected. Nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// A guarded row changed since it was read.
    #[error("{0} was modified concurrently")]
    Stale(RowRef),
    /// A guarded or written row does not exist.
    #[error("{0} not found")]
    Missing(RowRef),
    /// An immutable row already exists.
    #[error("{0} already exists")]
    AlreadyExists(RowRef),
    /// Taking units would drive the tool's available counter negative.
    #[error("{tool} has {available} units available, cannot take {requested}")]
    NotEnoughAvailable {
        /// Tool being decremented.
        tool: ToolId,
        /// Units requested.
        requested: u32,
        /// Units available at commit time.
        available: u32,
    },
    /// Consuming would drive the material's stock negative.
    #[error("{material} has {available} in stock, cannot consume {requested}")]
    InsufficientStock {
        /// Material being decremented.
        material: MaterialId,
        /// Quantity requested.
        requested: Decimal,
        /// Quantity in stock at commit time.
        available: Decimal,
    },
    /// An open loan references a tool that was required to be free.
    #[error("{tool} is referenced by open loan {transaction}")]
    OpenLoans {
        /// Tool being checked.
        tool: ToolId,
        /// First open loan found.
        transaction: TransactionId,
    },
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
