//! Loan queries and the overdue sweep.
//!
//! The stored `OVERDUE` status is only a cache. Every query here decides
//! overdueness from the due date and the engine clock, so results are right
//! whether or not a sweep has run.

use toolcrib_core::{BorrowingTransaction, TransactionId, TransactionStatus};
use toolcrib_store::{Changeset, CommitError, LedgerStore, RowRef, Write};

use crate::{Clock, Engine, LedgerError};

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Look up a loan.
    pub fn transaction(&self, id: TransactionId) -> Result<BorrowingTransaction, LedgerError> {
        Ok(self.load_transaction(id)?.value)
    }

    /// All loans, oldest first.
    pub fn transactions(&self) -> Result<Vec<BorrowingTransaction>, LedgerError> {
        Ok(self
            .store()
            .transactions()?
            .into_iter()
            .map(|t| t.value)
            .collect())
    }

    /// Loans not yet returned.
    pub fn open_transactions(&self) -> Result<Vec<BorrowingTransaction>, LedgerError> {
        let mut loans = self.transactions()?;
        loans.retain(BorrowingTransaction::is_open);
        Ok(loans)
    }

    /// Open loans past their due date right now, swept or not.
    pub fn overdue_transactions(&self) -> Result<Vec<BorrowingTransaction>, LedgerError> {
        let now = self.now();
        let mut loans = self.transactions()?;
        loans.retain(|t| t.is_overdue(now));
        Ok(loans)
    }

    /// Promote active loans past their due date to `OVERDUE`.
    ///
    /// Each loan commits on its own. A loan changed concurrently (returned or
    /// extended) is skipped and left to the next sweep. Returns the promoted
    /// ids.
    pub fn sweep_overdue(&self) -> Result<Vec<TransactionId>, LedgerError> {
        let now = self.now();
        let mut promoted = Vec::new();

        for row in self.store().transactions()? {
            let mut txn = row.value;
            if txn.status != TransactionStatus::Active || !txn.is_overdue(now) {
                continue;
            }
            let id = txn.id;
            txn.status = TransactionStatus::Overdue;

            let mut changeset = Changeset::new();
            changeset
                .expect_version(RowRef::Transaction(id), row.version)
                .push(Write::PutTransaction(txn));
            match self.store().commit(changeset) {
                Ok(()) => promoted.push(id),
                Err(CommitError::Stale(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(promoted)
    }
}
