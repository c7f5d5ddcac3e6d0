//! Run a caller-supplied function as one atomic unit of work.

use futures::future::BoxFuture;

use crate::error::PersistenceError;
use crate::factory::SessionFactory;
use crate::session::Session;

/// Executes work inside a fresh session and transaction per call.
///
/// # Usage
///
/// ```rust,no_run
/// # async fn demo(factory: workitem_db::SessionFactory) -> Result<(), workitem_db::PersistenceError> {
/// use workitem_db::models::person::Person;
/// use workitem_db::TransactionalRepository;
///
/// let repository = TransactionalRepository::new(factory);
/// let person = repository
///     .do_in_transaction(|session| Box::pin(async move { session.find::<Person>(1).await }))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TransactionalRepository {
    factory: SessionFactory,
}

impl TransactionalRepository {
    pub fn new(factory: SessionFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    /// Open a session, begin a transaction, run `work`, and commit.
    ///
    /// If `work` or the commit fails, the transaction is rolled back when it
    /// is still active and the original error is returned as-is. A failed
    /// rollback is logged and does not replace that error. The session is
    /// closed on every path.
    pub async fn do_in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<PersistenceError>,
    {
        let mut session = self.factory.open_session()?;

        let outcome: Result<T, E> = async {
            session.begin().await?;
            let value = work(&mut session).await?;
            session.commit().await?;
            Ok(value)
        }
        .await;

        if outcome.is_err() && session.is_transaction_active() {
            if let Err(rollback_err) = session.rollback().await {
                tracing::warn!(
                    unit = %self.factory.unit_name(),
                    error = %rollback_err,
                    "Rollback failed after unit of work error"
                );
            }
        }

        session.close();
        outcome
    }
}
