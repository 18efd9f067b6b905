//! The engine handle and shared lookups.

use chrono::{DateTime, Utc};
use toolcrib_core::{
    BorrowingTransaction, Material, MaterialId, Outcome, Request, Tool, ToolId, ToolUnit,
    TransactionId, UnitId,
};
use toolcrib_store::{Changeset, LedgerStore, Versioned};

use crate::{Clock, EngineOptions, LedgerError, SystemClock};

/// Entry point for every ledger operation.
///
/// The engine holds no ledger state of its own. Each call reads from the
/// store, plans a [`Changeset`] and commits it, so any number of engines may
/// share one store.
#[derive(Debug)]
pub struct Engine<S, C = SystemClock> {
    store: S,
    clock: C,
    options: EngineOptions,
}

impl<S: LedgerStore> Engine<S> {
    /// Create an engine on the wall clock with default options.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Create an engine with an explicit clock.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            options: EngineOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The clock.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// The options in effect.
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The current instant according to the engine's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Handle a borrow or consume request.
    pub fn submit(&self, request: Request) -> Result<Outcome, LedgerError> {
        match request {
            Request::Borrow(borrow) => {
                let transaction = self.borrow(borrow)?;
                Ok(Outcome::Borrowed {
                    transaction_id: transaction.id,
                })
            }
            Request::Consume(consume) => {
                let transaction = self.consume(consume)?;
                Ok(Outcome::Consumed {
                    transaction_id: transaction.id,
                })
            }
        }
    }

    pub(crate) fn next_id<T: From<u64>>(&self) -> T {
        T::from(self.store.next_id())
    }

    pub(crate) fn commit(&self, changeset: Changeset) -> Result<(), LedgerError> {
        Ok(self.store.commit(changeset)?)
    }

    /// Load a tool, archived or not.
    pub(crate) fn load_tool(&self, id: ToolId) -> Result<Versioned<Tool>, LedgerError> {
        self.store
            .tool(id)?
            .ok_or_else(|| LedgerError::not_found("tool", id))
    }

    /// Load a tool that can still be lent, adjusted or edited.
    pub(crate) fn load_live_tool(&self, id: ToolId) -> Result<Versioned<Tool>, LedgerError> {
        let tool = self.load_tool(id)?;
        if tool.value.is_archived() {
            return Err(LedgerError::not_found("tool", id));
        }
        Ok(tool)
    }

    pub(crate) fn load_unit(&self, id: UnitId) -> Result<Versioned<ToolUnit>, LedgerError> {
        self.store
            .unit(id)?
            .ok_or_else(|| LedgerError::not_found("unit", id))
    }

    pub(crate) fn load_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Versioned<BorrowingTransaction>, LedgerError> {
        self.store
            .transaction(id)?
            .ok_or_else(|| LedgerError::not_found("transaction", id))
    }

    pub(crate) fn load_material(&self, id: MaterialId) -> Result<Versioned<Material>, LedgerError> {
        self.store
            .material(id)?
            .ok_or_else(|| LedgerError::not_found("material", id))
    }
}

/// Reject blank names.
pub(crate) fn require_name(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(())
}
