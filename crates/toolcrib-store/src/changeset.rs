//! Guarded changesets.

use rust_decimal::Decimal;
use std::fmt;
use toolcrib_core::{
    BorrowingTransaction, ConsumptionId, ConsumptionTransaction, Material, MaterialId, Tool,
    ToolId, ToolUnit, TransactionId, UnitId,
};

/// Reference to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRef {
    /// A tool row.
    Tool(ToolId),
    /// A unit row.
    Unit(UnitId),
    /// A borrowing transaction row.
    Transaction(TransactionId),
    /// A material row.
    Material(MaterialId),
    /// A consumption transaction row.
    Consumption(ConsumptionId),
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool(id) => write!(f, "{id}"),
            Self::Unit(id) => write!(f, "{id}"),
            Self::Transaction(id) => write!(f, "{id}"),
            Self::Material(id) => write!(f, "{id}"),
            Self::Consumption(id) => write!(f, "{id}"),
        }
    }
}

/// A precondition checked at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The row must still exist at exactly this version.
    Version {
        /// Row to check.
        row: RowRef,
        /// Version the row was read at.
        version: u64,
    },
    /// No open borrowing transaction may reference the tool.
    NoOpenLoans(ToolId),
}

/// A single change applied at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Insert or replace a tool.
    PutTool(Tool),
    /// Insert or replace a unit.
    PutUnit(ToolUnit),
    /// Insert or replace a borrowing transaction.
    PutTransaction(BorrowingTransaction),
    /// Insert or replace a material.
    PutMaterial(Material),
    /// Insert a consumption transaction. Existing ones are immutable.
    PutConsumption(ConsumptionTransaction),
    /// Decrement a tool's available counter; fails if it would go negative
    /// or the tool is archived.
    TakeUnits {
        /// Tool to decrement.
        tool: ToolId,
        /// Units taken off the shelf.
        count: u32,
    },
    /// Increment a tool's available counter, saturating at its total.
    RestoreUnits {
        /// Tool to increment.
        tool: ToolId,
        /// Units put back on the shelf.
        count: u32,
    },
    /// Decrement a material's stock; fails if it would go negative.
    ConsumeStock {
        /// Material to decrement.
        material: MaterialId,
        /// Quantity taken.
        quantity: Decimal,
    },
    /// Delete a tool together with all of its units.
    RemoveTool(ToolId),
}

/// An ordered list of guards and writes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Preconditions, all checked before any write is applied.
    pub guards: Vec<Guard>,
    /// Writes, applied in order.
    pub writes: Vec<Write>,
}

impl Changeset {
    /// Create an empty changeset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the changeset has no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Require `row` to still be at `version`.
    pub fn expect_version(&mut self, row: RowRef, version: u64) -> &mut Self {
        self.guards.push(Guard::Version { row, version });
        self
    }

    /// Require that no open loan references `tool`.
    pub fn expect_no_open_loans(&mut self, tool: ToolId) -> &mut Self {
        self.guards.push(Guard::NoOpenLoans(tool));
        self
    }

    /// Append a write.
    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Append several writes.
    pub fn extend<I: IntoIterator<Item = Write>>(&mut self, writes: I) -> &mut Self {
        self.writes.extend(writes);
        self
    }
}
