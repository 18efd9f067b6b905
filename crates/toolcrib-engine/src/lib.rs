//! Borrowing and unit-ledger engine for toolcrib.
//!
//! The engine keeps a tool's aggregate counters in step with its
//! individually tracked units through every operation:
//!
//! - [`Engine::borrow`] - Lend explicit units or a quantity picked by policy
//! - [`Engine::return_loan`] - Close a loan, recording each unit's condition
//! - [`Engine::extend`] - Move an open loan's due date
//! - [`Engine::adjust_quantity`] - Grow or shrink a tool's stock
//! - [`Engine::delete_tool`] - Remove or archive a tool
//! - [`Engine::consume`] - Take materials out of stock for good
//! - [`Engine::sweep_overdue`] - Promote past-due loans to `OVERDUE`
//! - [`Engine::check`] - Report any invariant that does not hold
//!
//! After every successful operation, for every tool:
//! `0 <= available <= total`, `total == |live units|` and
//! `available == |available live units|`.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use toolcrib_core::{BorrowRequest, CategoryId, Condition, NewTool, ReturnRequest};
//! use toolcrib_engine::Engine;
//! use toolcrib_store::MemoryStore;
//!
//! let engine = Engine::new(MemoryStore::new());
//! let drill = engine.create_tool(NewTool::new("Drill", CategoryId(1), 5)).unwrap();
//!
//! let due = Utc::now() + Duration::days(3);
//! let loan = engine
//!     .borrow(BorrowRequest::new("Ana", due).with_quantity(drill.id, 2))
//!     .unwrap();
//! assert_eq!(engine.tool(drill.id).unwrap().available_quantity, 3);
//!
//! engine.return_loan(ReturnRequest::uniform(&loan, Condition::Good)).unwrap();
//! assert_eq!(engine.tool(drill.id).unwrap().available_quantity, 5);
//! assert!(engine.check().unwrap().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod borrow;
mod check;
mod clock;
mod engine;
mod error;
mod extend;
mod materials;
mod options;
mod returns;
mod sweep;
mod tools;
mod units;

pub use check::{Violation, ViolationCode};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::Engine;
pub use error::{ErrorKind, LedgerError};
pub use options::EngineOptions;
pub use tools::{resize, Resize, ResizePlan, ToolDeletion};
