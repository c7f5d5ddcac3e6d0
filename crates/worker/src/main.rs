//! `workitem-worker` -- runs the find-person process once.
//!
//! Builds the persistence-unit catalog from the environment, optionally
//! starts a migrated and seeded in-memory database, creates the shared
//! session factory, and runs the find-person process once.
//!
//! # Environment variables
//!
//! | Variable                            | Required | Default | Description                     |
//! |-------------------------------------|----------|---------|---------------------------------|
//! | `PERSISTENCE_UNIT_<NAME>_URL`       | yes*     | --      | Database URL of unit `<name>`   |
//! | `WORKER_PERSISTENCE_UNIT`           | no       | `workitem` | Unit the worker binds        |
//! | `WORKER_EMBEDDED_DB`                | no       | --      | Seed an in-memory database      |
//!
//! \* Not needed when `WORKER_EMBEDDED_DB` is set.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workitem_db::bootstrap::{DatabaseInstance, EmbeddedDatabase};
use workitem_db::{PersistenceUnit, PersistenceUnitCatalog, SessionFactoryRegistry};
use workitem_engine::{Environment, ProcessSession};
use workitem_handlers::{
    find_person_process, FindPersonWorkItemHandler, FIND_PERSON_PROCESS_ID, FIND_PERSON_WORK_ITEM,
    SESSION_FACTORY_KEY,
};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "workitem_worker=debug,workitem_handlers=info,workitem_engine=info,workitem_db=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(?config, "Starting workitem-worker");

    let mut catalog =
        PersistenceUnitCatalog::from_env().context("Invalid persistence unit configuration")?;

    let embedded = match &config.embedded_db {
        Some(name) => {
            let instance = DatabaseInstance::new(name.clone())
                .with_migrations()
                .with_init_script("init.sql");
            catalog.insert(PersistenceUnit::new(
                config.persistence_unit.clone(),
                instance.url(),
            ));
            let db = EmbeddedDatabase::start(&config.sql_dir, vec![instance])
                .await
                .context("Failed to start embedded database")?;
            Some(db)
        }
        None => None,
    };

    let registry = SessionFactoryRegistry::new();
    let result = run(&config, &catalog, &registry).await;

    registry.close_all().await;
    if let Some(db) = embedded {
        db.shutdown().await;
    }
    result
}

async fn run(
    config: &WorkerConfig,
    catalog: &PersistenceUnitCatalog,
    registry: &SessionFactoryRegistry,
) -> anyhow::Result<()> {
    let factory = registry
        .get_or_create(&config.persistence_unit, catalog)
        .await
        .context("Failed to create session factory")?;
    workitem_db::health_check(factory.pool())
        .await
        .context("Database health check failed")?;
    tracing::info!(unit = factory.unit_name(), "Database connection established");

    workitem_db::run_migrations(factory.pool())
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let environment = Environment::new().with_entry(SESSION_FACTORY_KEY, factory.clone());
    let mut session = ProcessSession::new(environment);
    session.add_process(find_person_process()?)?;
    let handler = Arc::new(FindPersonWorkItemHandler::new(session.environment()));
    session.register_work_item_handler(FIND_PERSON_WORK_ITEM, handler)?;

    let instance = session.start_process(FIND_PERSON_PROCESS_ID).await?;
    tracing::info!(
        process_instance_id = instance.id,
        state = ?instance.state,
        statistics = %serde_json::to_string(&factory.statistics())?,
        "Process instance finished"
    );
    Ok(())
}
