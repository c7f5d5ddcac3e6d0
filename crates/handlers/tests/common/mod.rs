//! Shared fixtures for the find-person process tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::SqlitePool;
use workitem_db::{PersistenceUnit, SessionFactory};
use workitem_engine::{Environment, ProcessSession};
use workitem_handlers::{
    find_person_process, FindPersonWorkItemHandler, FIND_PERSON_WORK_ITEM, SESSION_FACTORY_KEY,
};

pub const UNIT: &str = "jbpmapptest";

/// Wrap the pool handed out by `#[sqlx::test]` in a factory for [`UNIT`].
pub fn session_factory(pool: SqlitePool) -> SessionFactory {
    SessionFactory::new(PersistenceUnit::new(UNIT, "sqlite::memory:"), pool)
}

/// A process session over `environment` with the find-person process and
/// handler registered.
pub fn process_session(environment: Environment) -> ProcessSession {
    let mut session = ProcessSession::new(environment);
    session
        .add_process(find_person_process().expect("bundled process should parse"))
        .expect("bundled process should be valid");
    let handler = Arc::new(FindPersonWorkItemHandler::new(session.environment()));
    session
        .register_work_item_handler(FIND_PERSON_WORK_ITEM, handler)
        .expect("handler should register");
    session
}

pub fn environment_with(factory: &SessionFactory) -> Environment {
    Environment::new().with_entry(SESSION_FACTORY_KEY, factory.clone())
}
