//! Shared fixtures for persistence integration tests.

#![allow(dead_code)]

use sqlx::SqlitePool;
use workitem_db::{PersistenceUnit, PersistenceUnitCatalog, SessionFactory};

pub const UNIT: &str = "jbpmapptest";

/// Wrap the pool handed out by `#[sqlx::test]` in a factory for [`UNIT`].
pub fn session_factory(pool: SqlitePool) -> SessionFactory {
    SessionFactory::new(PersistenceUnit::new(UNIT, "sqlite::memory:"), pool)
}

/// A catalog whose [`UNIT`] points at a private in-memory database.
pub fn memory_catalog() -> PersistenceUnitCatalog {
    PersistenceUnitCatalog::new().with_unit(PersistenceUnit::new(UNIT, "sqlite::memory:"))
}
