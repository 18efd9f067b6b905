//! Core types for toolcrib
//!
//! This crate provides the fundamental types used throughout the toolcrib project:
//!
//! - [`Tool`] / [`ToolUnit`] - A lendable tool and its individually tracked units
//! - [`Condition`] - Ordinal quality rating of a unit
//! - [`Material`] - A consumable stocked as a scalar quantity
//! - [`BorrowingTransaction`] - One lending event with its line items
//! - [`ConsumptionTransaction`] - One irreversible consumption of materials
//! - [`select_units`] - The unit selection policy used for quantity borrows
//! - [`Request`] - Borrow and consume requests as a tagged union
//!
//! # Example
//!
//! ```
//! use toolcrib_core::{select_units, Condition, SelectionPreference, ToolId, ToolUnit, UnitId};
//!
//! let units = vec![
//!     ToolUnit::new(UnitId(1), ToolId(1), 1, Condition::Fair),
//!     ToolUnit::new(UnitId(2), ToolId(1), 2, Condition::Excellent),
//!     ToolUnit::new(UnitId(3), ToolId(1), 3, Condition::Good),
//! ];
//!
//! // Best condition first: the EXCELLENT unit, then the GOOD one
//! let picked = select_units(&units, 2, SelectionPreference::BestFirst).unwrap();
//! assert_eq!(picked, vec![UnitId(2), UnitId(3)]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod borrowing;
pub mod condition;
pub mod ids;
pub mod material;
pub mod request;
pub mod selection;
pub mod tool;

pub use borrowing::{
    has_active_borrowing, BorrowedUnit, BorrowingItem, BorrowingTransaction, DueDateExtension,
    TransactionStatus,
};
pub use condition::{Condition, SelectionPreference};
pub use ids::{
    BorrowedUnitId, CategoryId, ConsumptionId, ItemId, MaterialId, ToolId, TransactionId, UnitId,
};
pub use material::{ConsumptionItem, ConsumptionTransaction, Material};
pub use request::{
    BorrowLine, BorrowRequest, ConsumeLine, ConsumeRequest, ExtendRequest, ItemReturn, NewMaterial,
    NewTool, Outcome, Request, ReturnRequest, ToolEdit, UnitReturn, UnitSelection,
};
pub use selection::{select_units, SelectionError};
pub use tool::{Tool, ToolUnit};

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
