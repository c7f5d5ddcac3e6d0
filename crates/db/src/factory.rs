//! Session factories: one connection pool per persistence unit.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::{PersistenceUnit, PersistenceUnitCatalog};
use crate::error::PersistenceError;
use crate::session::Session;
use crate::statistics::{SessionStatistics, StatisticsSnapshot};
use crate::DbPool;

/// Shared handle to a persistence unit's connection pool.
///
/// Expensive to create, cheap to clone: clones share the same pool and
/// statistics. Build one with [`SessionFactoryCreator::create`] or obtain the
/// shared instance from a
/// [`SessionFactoryRegistry`](crate::registry::SessionFactoryRegistry).
#[derive(Debug, Clone)]
pub struct SessionFactory {
    inner: Arc<FactoryInner>,
}

#[derive(Debug)]
struct FactoryInner {
    unit: PersistenceUnit,
    pool: DbPool,
    stats: SessionStatistics,
}

impl SessionFactory {
    /// Wrap an existing pool.
    pub fn new(unit: PersistenceUnit, pool: DbPool) -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                unit,
                pool,
                stats: SessionStatistics::default(),
            }),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.inner.unit.name
    }

    pub fn unit(&self) -> &PersistenceUnit {
        &self.inner.unit
    }

    pub fn pool(&self) -> &DbPool {
        &self.inner.pool
    }

    pub(crate) fn stats(&self) -> &SessionStatistics {
        &self.inner.stats
    }

    /// Open a new session. No connection is held until the session begins a
    /// transaction.
    pub fn open_session(&self) -> Result<Session, PersistenceError> {
        if !self.is_open() {
            return Err(PersistenceError::FactoryClosed(self.unit_name().to_string()));
        }
        Ok(Session::open(self.clone()))
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn is_open(&self) -> bool {
        !self.inner.pool.is_closed()
    }

    /// Close the underlying pool. Affects every clone of this factory.
    pub async fn close(&self) {
        self.inner.pool.close().await;
        tracing::info!(unit = %self.unit_name(), "Session factory closed");
    }

    /// Whether both handles refer to the same factory instance.
    pub fn ptr_eq(&self, other: &SessionFactory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Builds session factories from catalog entries.
pub struct SessionFactoryCreator;

impl SessionFactoryCreator {
    /// Resolve `unit_name` in `catalog` and build a factory for it.
    ///
    /// The catalog is only read. Unknown units, invalid metadata and
    /// connection failures are returned unchanged.
    pub async fn create(
        unit_name: &str,
        catalog: &PersistenceUnitCatalog,
    ) -> Result<SessionFactory, PersistenceError> {
        tracing::debug!(unit = unit_name, "Creating session factory");

        let unit = catalog.resolve(unit_name)?.clone();
        unit.check().map_err(|source| PersistenceError::InvalidUnit {
            unit: unit_name.to_string(),
            source,
        })?;

        let options = SqliteConnectOptions::from_str(&unit.database_url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(unit.max_connections)
            .acquire_timeout(Duration::from_secs(unit.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        tracing::debug!(unit = unit_name, "Created session factory");
        Ok(SessionFactory::new(unit, pool))
    }
}
