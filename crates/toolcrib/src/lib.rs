//! Toolcrib CLI tools.
//!
//! This crate provides command-line tools over a toolcrib ledger state file:
//!
//! - `toolcrib`: Create tools and materials, lend, return, extend and consume
//! - `toolcrib-check`: Verify the ledger invariants
//! - `toolcrib-sweep`: Mark past-due loans as overdue
//!
//! # Example Usage
//!
//! ```bash
//! toolcrib tool add "Cordless drill" --category 1 --quantity 5
//! toolcrib borrow --borrower Ana --due 2024-03-05 --quantity tool-1=2
//! toolcrib return loan-9 --condition good
//! toolcrib-check --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod config;
