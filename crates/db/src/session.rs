//! One unit of work against a persistence unit.
//!
//! A [`Session`] is opened by a [`SessionFactory`], owns at most one active
//! transaction, and is closed exactly once: either explicitly through
//! [`Session::close`] or when it is dropped.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{FromRow, Sqlite, Transaction};
use workitem_core::types::DbId;

use crate::error::PersistenceError;
use crate::factory::SessionFactory;

/// A row type mapped to a table with a single integer primary key.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table the entity is stored in.
    const TABLE: &'static str;

    /// Column list selected when loading the entity.
    const COLUMNS: &'static str;

    /// Primary-key column.
    const ID_COLUMN: &'static str = "id";
}

pub struct Session {
    factory: SessionFactory,
    transaction: Option<Transaction<'static, Sqlite>>,
    open: bool,
}

impl Session {
    pub(crate) fn open(factory: SessionFactory) -> Self {
        factory.stats().session_opened();
        tracing::debug!(unit = %factory.unit_name(), "Session opened");
        Self {
            factory,
            transaction: None,
            open: true,
        }
    }

    pub fn unit_name(&self) -> &str {
        self.factory.unit_name()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_transaction_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Begin a transaction. Acquires a pooled connection for its duration.
    pub async fn begin(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        if self.transaction.is_some() {
            return Err(PersistenceError::TransactionAlreadyActive);
        }
        let transaction = self.factory.pool().begin().await?;
        self.transaction = Some(transaction);
        self.factory.stats().transaction_begun();
        Ok(())
    }

    /// Commit the active transaction.
    ///
    /// The transaction is consumed even when the commit fails, so a failed
    /// commit leaves no transaction active. sqlx rolls the failed transaction
    /// back when it is dropped, and that rollback is counted here.
    pub async fn commit(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        let transaction = self
            .transaction
            .take()
            .ok_or(PersistenceError::NoActiveTransaction)?;
        if let Err(e) = transaction.commit().await {
            self.factory.stats().transaction_rolled_back();
            tracing::warn!(
                unit = %self.factory.unit_name(),
                error = %e,
                "Commit failed, transaction rolled back"
            );
            return Err(e.into());
        }
        self.factory.stats().transaction_committed();
        Ok(())
    }

    /// Roll back the active transaction.
    pub async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        let transaction = self
            .transaction
            .take()
            .ok_or(PersistenceError::NoActiveTransaction)?;
        transaction.rollback().await?;
        self.factory.stats().transaction_rolled_back();
        Ok(())
    }

    /// The connection bound to the active transaction, for raw statements.
    pub fn connection(&mut self) -> Result<&mut SqliteConnection, PersistenceError> {
        self.ensure_open()?;
        let transaction = self
            .transaction
            .as_mut()
            .ok_or(PersistenceError::NoActiveTransaction)?;
        Ok(&mut **transaction)
    }

    /// Load an entity by primary key. Returns `None` when no row matches.
    pub async fn find<E: Entity>(&mut self, id: DbId) -> Result<Option<E>, PersistenceError> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            E::COLUMNS,
            E::TABLE,
            E::ID_COLUMN
        );
        let conn = self.connection()?;
        let found = sqlx::query_as::<_, E>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(found)
    }

    /// Close the session, discarding any transaction still active.
    pub fn close(mut self) {
        self.release();
    }

    fn ensure_open(&self) -> Result<(), PersistenceError> {
        if self.open {
            Ok(())
        } else {
            Err(PersistenceError::SessionClosed)
        }
    }

    fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        if let Some(transaction) = self.transaction.take() {
            // Dropping an unfinished sqlx transaction rolls it back when the
            // connection returns to the pool.
            drop(transaction);
            self.factory.stats().transaction_rolled_back();
            tracing::warn!(
                unit = %self.factory.unit_name(),
                "Session closed with an active transaction, rolled back"
            );
        }

        self.factory.stats().session_closed();
        tracing::debug!(unit = %self.factory.unit_name(), "Session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("unit", &self.factory.unit_name())
            .field("open", &self.open)
            .field("transaction_active", &self.transaction.is_some())
            .finish()
    }
}
