//! Backing store for the toolcrib engine.
//!
//! The engine never mutates rows directly. It reads [`Versioned`] rows,
//! plans its changes as a [`Changeset`] and hands the changeset to
//! [`LedgerStore::commit`]. A commit is all-or-nothing:
//!
//! 1. Every [`Guard`] is re-checked against the live rows. A row whose
//!    version moved since it was read fails the commit, which is how two
//!    concurrent borrows of the same unit are kept from both succeeding.
//! 2. Every [`Write`] is applied to a staging area. Counter writes
//!    ([`Write::TakeUnits`], [`Write::RestoreUnits`], [`Write::ConsumeStock`])
//!    are relative, so concurrent borrows of different units of one tool do
//!    not conflict with each other.
//! 3. Only when every write succeeded is the staging area merged and every
//!    touched row's version bumped.
//!
//! [`MemoryStore`] is the reference implementation. It can be persisted as a
//! JSON [`Snapshot`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod changeset;
mod error;
mod memory;
mod snapshot;

pub use changeset::{Changeset, Guard, RowRef, Write};
pub use error::{CommitError, StoreError};
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SNAPSHOT_FORMAT};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use toolcrib_core::{
    BorrowingTransaction, ConsumptionId, ConsumptionTransaction, Material, MaterialId, Tool,
    ToolId, ToolUnit, TransactionId, UnitId,
};

/// A row together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Bumped on every committed write to the row.
    pub version: u64,
    /// The row.
    pub value: T,
}

impl<T> Versioned<T> {
    /// Wrap a row.
    pub const fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

/// Read access to the rows plus atomic commit of changesets.
///
/// Reads return owned copies. Nothing read is locked; consistency is
/// enforced at commit time through guards.
pub trait LedgerStore: Send + Sync {
    /// Allocate a fresh row id. Ids are unique across all tables.
    fn next_id(&self) -> u64;

    /// Look up a tool.
    fn tool(&self, id: ToolId) -> Result<Option<Versioned<Tool>>, StoreError>;
    /// All tools, archived ones included, ordered by id.
    fn tools(&self) -> Result<Vec<Versioned<Tool>>, StoreError>;

    /// Look up a unit.
    fn unit(&self, id: UnitId) -> Result<Option<Versioned<ToolUnit>>, StoreError>;
    /// All units of a tool, retired ones included, ordered by id.
    fn units_of(&self, tool_id: ToolId) -> Result<Vec<Versioned<ToolUnit>>, StoreError>;

    /// Look up a borrowing transaction.
    fn transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Versioned<BorrowingTransaction>>, StoreError>;
    /// All borrowing transactions, ordered by id.
    fn transactions(&self) -> Result<Vec<Versioned<BorrowingTransaction>>, StoreError>;

    /// Look up a material.
    fn material(&self, id: MaterialId) -> Result<Option<Versioned<Material>>, StoreError>;
    /// All materials, ordered by id.
    fn materials(&self) -> Result<Vec<Versioned<Material>>, StoreError>;

    /// Look up a consumption transaction.
    fn consumption(&self, id: ConsumptionId) -> Result<Option<ConsumptionTransaction>, StoreError>;
    /// All consumption transactions, ordered by id.
    fn consumptions(&self) -> Result<Vec<ConsumptionTransaction>, StoreError>;

    /// Apply a changeset atomically, or not at all.
    fn commit(&self, changeset: Changeset) -> Result<(), CommitError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn next_id(&self) -> u64 {
        (**self).next_id()
    }

    fn tool(&self, id: ToolId) -> Result<Option<Versioned<Tool>>, StoreError> {
        (**self).tool(id)
    }

    fn tools(&self) -> Result<Vec<Versioned<Tool>>, StoreError> {
        (**self).tools()
    }

    fn unit(&self, id: UnitId) -> Result<Option<Versioned<ToolUnit>>, StoreError> {
        (**self).unit(id)
    }

    fn units_of(&self, tool_id: ToolId) -> Result<Vec<Versioned<ToolUnit>>, StoreError> {
        (**self).units_of(tool_id)
    }

    fn transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Versioned<BorrowingTransaction>>, StoreError> {
        (**self).transaction(id)
    }

    fn transactions(&self) -> Result<Vec<Versioned<BorrowingTransaction>>, StoreError> {
        (**self).transactions()
    }

    fn material(&self, id: MaterialId) -> Result<Option<Versioned<Material>>, StoreError> {
        (**self).material(id)
    }

    fn materials(&self) -> Result<Vec<Versioned<Material>>, StoreError> {
        (**self).materials()
    }

    fn consumption(&self, id: ConsumptionId) -> Result<Option<ConsumptionTransaction>, StoreError> {
        (**self).consumption(id)
    }

    fn consumptions(&self) -> Result<Vec<ConsumptionTransaction>, StoreError> {
        (**self).consumptions()
    }

    fn commit(&self, changeset: Changeset) -> Result<(), CommitError> {
        (**self).commit(changeset)
    }
}
