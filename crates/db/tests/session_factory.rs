//! Integration tests for factory creation, the shared registry, and session
//! state handling.

mod common;

use assert_matches::assert_matches;
use sqlx::SqlitePool;
use workitem_db::models::person::Person;
use workitem_db::{
    PersistenceError, PersistenceUnit, PersistenceUnitCatalog, SessionFactoryCreator,
    SessionFactoryRegistry,
};

use common::{memory_catalog, session_factory, UNIT};

// ---------------------------------------------------------------------------
// SessionFactoryCreator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_unit_is_reported() {
    let catalog = PersistenceUnitCatalog::new();
    let result = SessionFactoryCreator::create("missing", &catalog).await;
    assert_matches!(result, Err(PersistenceError::UnknownUnit(name)) if name == "missing");
}

#[tokio::test]
async fn invalid_unit_is_reported() {
    let catalog = PersistenceUnitCatalog::new()
        .with_unit(PersistenceUnit::new("pg", "postgres://localhost/app"));
    let result = SessionFactoryCreator::create("pg", &catalog).await;
    assert_matches!(result, Err(PersistenceError::InvalidUnit { unit, .. }) if unit == "pg");
}

#[tokio::test]
async fn failed_creation_leaves_catalog_untouched() {
    let catalog = PersistenceUnitCatalog::new()
        .with_unit(PersistenceUnit::new("pg", "postgres://localhost/app"))
        .with_unit(PersistenceUnit::new("mem", "sqlite::memory:"));
    let before: Vec<PersistenceUnit> = catalog
        .names()
        .map(|name| catalog.resolve(name).unwrap().clone())
        .collect();

    assert!(SessionFactoryCreator::create("pg", &catalog).await.is_err());
    assert!(SessionFactoryCreator::create("nope", &catalog).await.is_err());

    let after: Vec<PersistenceUnit> = catalog
        .names()
        .map(|name| catalog.resolve(name).unwrap().clone())
        .collect();
    assert_eq!(before, after);

    // The catalog still resolves and builds the valid unit.
    let factory = SessionFactoryCreator::create("mem", &catalog).await.unwrap();
    assert!(factory.is_open());
    factory.close().await;
}

#[tokio::test]
async fn standalone_creation_builds_distinct_factories() {
    let catalog = memory_catalog();
    let first = SessionFactoryCreator::create(UNIT, &catalog).await.unwrap();
    let second = SessionFactoryCreator::create(UNIT, &catalog).await.unwrap();

    assert!(!first.ptr_eq(&second));
    assert!(first.ptr_eq(&first.clone()));
    assert_eq!(first.unit_name(), UNIT);
    workitem_db::health_check(first.pool()).await.unwrap();

    first.close().await;
    second.close().await;
}

// ---------------------------------------------------------------------------
// SessionFactoryRegistry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_creates_once_and_reuses() {
    let catalog = memory_catalog();
    let registry = SessionFactoryRegistry::new();

    let first = registry.get_or_create(UNIT, &catalog).await.unwrap();
    let second = registry.get_or_create(UNIT, &catalog).await.unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(registry.len().await, 1);
    assert!(registry.get(UNIT).await.unwrap().ptr_eq(&first));

    registry.close_all().await;
    assert!(registry.is_empty().await);
    assert!(!first.is_open());
}

#[tokio::test]
async fn registry_registers_nothing_on_failure() {
    let registry = SessionFactoryRegistry::new();
    let catalog = PersistenceUnitCatalog::new();

    let result = registry.get_or_create(UNIT, &catalog).await;

    assert_matches!(result, Err(PersistenceError::UnknownUnit(_)));
    assert!(registry.is_empty().await);
    assert!(registry.get(UNIT).await.is_none());
}

#[tokio::test]
async fn registry_recreates_closed_factory() {
    let catalog = memory_catalog();
    let registry = SessionFactoryRegistry::new();

    let first = registry.get_or_create(UNIT, &catalog).await.unwrap();
    first.close().await;
    let second = registry.get_or_create(UNIT, &catalog).await.unwrap();

    assert!(!first.ptr_eq(&second));
    assert!(second.is_open());

    registry.close_all().await;
}

#[tokio::test]
async fn registry_shares_externally_built_factory() {
    let catalog = memory_catalog();
    let registry = SessionFactoryRegistry::new();
    let factory = SessionFactoryCreator::create(UNIT, &catalog).await.unwrap();

    assert!(registry.register(factory.clone()).await.is_none());
    let shared = registry.get_or_create(UNIT, &catalog).await.unwrap();

    assert!(shared.ptr_eq(&factory));

    registry.close_all().await;
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations", fixtures(path = "../sql", scripts("init")))]
async fn session_rejects_misuse(pool: SqlitePool) {
    let factory = session_factory(pool);
    let mut session = factory.open_session().unwrap();

    assert_matches!(session.commit().await, Err(PersistenceError::NoActiveTransaction));
    assert_matches!(session.rollback().await, Err(PersistenceError::NoActiveTransaction));
    assert_matches!(session.find::<Person>(1).await, Err(PersistenceError::NoActiveTransaction));

    session.begin().await.unwrap();
    assert_matches!(session.begin().await, Err(PersistenceError::TransactionAlreadyActive));
    assert_eq!(session.find::<Person>(1).await.unwrap().map(|p| p.name).as_deref(), Some("John Doe"));
    session.rollback().await.unwrap();
    assert!(!session.is_transaction_active());

    session.close();
    let stats = factory.statistics();
    assert_eq!(stats.sessions_closed, 1);
    assert_eq!(stats.transactions_rolled_back, 1);
}

#[sqlx::test(migrations = "./migrations", fixtures(path = "../sql", scripts("init")))]
async fn dropping_session_rolls_back_and_closes_once(pool: SqlitePool) {
    let factory = session_factory(pool);

    {
        let mut session = factory.open_session().unwrap();
        session.begin().await.unwrap();
        assert!(session.is_transaction_active());
    }

    let stats = factory.statistics();
    assert_eq!(stats.sessions_opened, 1);
    assert_eq!(stats.sessions_closed, 1);
    assert_eq!(stats.transactions_rolled_back, 1);
}
