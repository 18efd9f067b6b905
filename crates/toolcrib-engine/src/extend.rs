//! Due-date extension.

use chrono::{DateTime, Duration, Utc};
use toolcrib_core::{DueDateExtension, ExtendRequest, TransactionStatus};
use toolcrib_store::{Changeset, LedgerStore, RowRef, Versioned, Write};

use crate::{Clock, Engine, LedgerError};

impl<S: LedgerStore, C: Clock> Engine<S, C> {
    /// Move an open loan's due date into the future.
    ///
    /// An overdue loan becomes active again. Every extension is appended to
    /// the loan's audit trail with its reason. Returns the new due date.
    pub fn extend(&self, request: ExtendRequest) -> Result<DateTime<Utc>, LedgerError> {
        let Versioned {
            version,
            value: mut txn,
        } = self.load_transaction(request.transaction_id)?;
        if !txn.is_open() {
            return Err(LedgerError::InvalidState {
                transaction: txn.id,
                status: txn.status,
                action: "extend",
            });
        }

        let now = self.now();
        if request.new_due_date <= now {
            return Err(LedgerError::InvalidDate(format!(
                "new due date {} is not in the future",
                request.new_due_date
            )));
        }
        if let Some(days) = self.options().max_loan_days {
            if request.new_due_date - txn.borrow_date > Duration::days(i64::from(days)) {
                return Err(LedgerError::InvalidDate(format!(
                    "loans may last at most {days} days from {}",
                    txn.borrow_date
                )));
            }
        }

        txn.extensions.push(DueDateExtension {
            previous_due_date: txn.due_date,
            new_due_date: request.new_due_date,
            reason: request.reason,
            extended_at: now,
        });
        txn.due_date = request.new_due_date;
        txn.status = TransactionStatus::Active;

        let mut changeset = Changeset::new();
        changeset
            .expect_version(RowRef::Transaction(txn.id), version)
            .push(Write::PutTransaction(txn));
        self.commit(changeset)?;
        Ok(request.new_due_date)
    }
}
