//! Persistence layer for the find-person work item.
//!
//! - [`PersistenceUnitCatalog`]: the persistence units visible to a caller.
//! - [`SessionFactoryCreator`] / [`SessionFactoryRegistry`]: build or share
//!   a [`SessionFactory`] for a unit.
//! - [`TransactionalRepository`]: run work inside one session and one
//!   transaction, with rollback on failure.
//! - [`bootstrap`]: named in-memory databases built from [`MIGRATOR`] and
//!   seeded from SQL scripts.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod factory;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod repository;
pub mod session;
pub mod statistics;

pub use config::{PersistenceUnit, PersistenceUnitCatalog};
pub use error::PersistenceError;
pub use factory::{SessionFactory, SessionFactoryCreator};
pub use registry::SessionFactoryRegistry;
pub use repository::TransactionalRepository;
pub use session::{Entity, Session};
pub use statistics::StatisticsSnapshot;

pub type DbPool = sqlx::SqlitePool;

/// Schema migrations under `crates/db/migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
