//! Transaction helpers.

use rusqlite::{Transaction, TransactionBehavior};

use crate::error::Result;

use super::connection::Database;

impl Database {
    /// Runs `f` inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken up front, so a read-check-write sequence in
    /// `f` cannot interleave with another process. The transaction commits
    /// when `f` returns `Ok` and rolls back otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a database error if the transaction
    /// cannot be started or committed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stackplan::database::{Database, DatabaseConfig};
    ///
    /// let mut db = Database::open(DatabaseConfig::new("/tmp/bindings.db")).unwrap();
    /// let count = db
    ///     .with_immediate_transaction(|tx| Ok(Database::list_bindings(tx, None, None)?.len()))
    ///     .unwrap();
    /// ```
    pub fn with_immediate_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // dropping an uncommitted transaction rolls it back
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
