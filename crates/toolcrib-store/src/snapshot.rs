//! JSON persistence for [`MemoryStore`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toolcrib_core::{BorrowingTransaction, ConsumptionTransaction, Material, Tool, ToolUnit};

use crate::{MemoryStore, StoreError, Versioned};

/// Snapshot layout version written by this build.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Every row of a store, as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Layout version, see [`SNAPSHOT_FORMAT`].
    pub format: u32,
    /// Last id handed out by [`crate::LedgerStore::next_id`].
    pub last_id: u64,
    /// Tool rows.
    #[serde(default)]
    pub tools: Vec<Versioned<Tool>>,
    /// Unit rows, retired ones included.
    #[serde(default)]
    pub units: Vec<Versioned<ToolUnit>>,
    /// Borrowing transaction rows.
    #[serde(default)]
    pub transactions: Vec<Versioned<BorrowingTransaction>>,
    /// Material rows.
    #[serde(default)]
    pub materials: Vec<Versioned<Material>>,
    /// Consumption transactions.
    #[serde(default)]
    pub consumptions: Vec<ConsumptionTransaction>,
}

impl MemoryStore {
    /// Load a store from a snapshot file.
    ///
    /// A missing file yields an empty store, so a fresh state file can be
    /// created by the first save.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let text = fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let snapshot: Snapshot = serde_json::from_str(&text).map_err(|e| StoreError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            tools = snapshot.tools.len(),
            transactions = snapshot.transactions.len(),
            "Loaded snapshot {}",
            path.display()
        );
        Self::from_snapshot(snapshot)
    }

    /// Write the store to a snapshot file.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a crash never leaves a truncated snapshot behind.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let tmp = path.with_extension("json.tmp");
        let write_err = |e: std::io::Error| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;

        tracing::trace!("Saved snapshot {}", path.display());
        Ok(())
    }
}
