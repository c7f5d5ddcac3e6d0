//! Service task that looks up a person through the shared session factory.
//!
//! The embedding application must put a [`SessionFactory`] into the engine
//! environment under [`SESSION_FACTORY_KEY`] before the process session is
//! created, and register the handler under [`FIND_PERSON_WORK_ITEM`].

use std::sync::Arc;

use async_trait::async_trait;
use workitem_core::types::DbId;
use workitem_db::models::person::Person;
use workitem_db::repositories::PersonRepo;
use workitem_db::{PersistenceError, SessionFactory, TransactionalRepository};
use workitem_engine::{
    EngineError, Environment, HandlerError, ProcessDefinition, WorkItem, WorkItemHandler,
    WorkItemManager, WorkItemResults,
};

/// Environment key holding the shared [`SessionFactory`].
pub const SESSION_FACTORY_KEY: &str = "etlSessionFactory";

/// Work-item name the handler is registered under.
pub const FIND_PERSON_WORK_ITEM: &str = "FindPersonWorkItemHandler";

/// Id of the bundled find-person process.
pub const FIND_PERSON_PROCESS_ID: &str = "com.example.bpm.FindPersonProcess";

/// The person every invocation looks up.
// TODO: read the id from the work item parameters once the process passes one.
pub const PERSON_ID: DbId = 1;

const FIND_PERSON_PROCESS_JSON: &str = include_str!("../processes/find_person_process.json");

/// The bundled `start -> FindPersonWorkItemHandler -> end` process.
pub fn find_person_process() -> Result<ProcessDefinition, EngineError> {
    ProcessDefinition::from_json(FIND_PERSON_PROCESS_JSON)
}

pub struct FindPersonWorkItemHandler {
    environment: Arc<Environment>,
}

impl FindPersonWorkItemHandler {
    pub fn new(environment: Arc<Environment>) -> Self {
        tracing::info!(environment = ?environment, "Creating FindPersonWorkItemHandler");
        Self { environment }
    }

    /// Fetch person [`PERSON_ID`] in its own transaction.
    pub async fn find_person(factory: &SessionFactory) -> Result<Option<Person>, PersistenceError> {
        TransactionalRepository::new(factory.clone())
            .do_in_transaction(|session| {
                Box::pin(async move { PersonRepo::find_by_id(session, PERSON_ID).await })
            })
            .await
    }
}

#[async_trait]
impl WorkItemHandler for FindPersonWorkItemHandler {
    async fn execute_work_item(
        &self,
        work_item: &WorkItem,
        manager: &dyn WorkItemManager,
    ) -> Result<(), HandlerError> {
        tracing::info!(work_item_id = work_item.id, "Executing FindPersonWorkItemHandler");

        let factory = self
            .environment
            .get::<SessionFactory>(SESSION_FACTORY_KEY)?;
        let person = Self::find_person(&factory).await?;

        // Not-found still completes the work item.
        match &person {
            Some(person) => {
                tracing::info!(person_id = person.id, person_name = %person.name, "Found the person")
            }
            None => tracing::info!(person_id = PERSON_ID, "No person found"),
        }

        manager
            .complete_work_item(work_item.id, WorkItemResults::new())
            .await?;
        Ok(())
    }

    async fn abort_work_item(
        &self,
        work_item: &WorkItem,
        manager: &dyn WorkItemManager,
    ) -> Result<(), HandlerError> {
        manager.abort_work_item(work_item.id).await?;
        Ok(())
    }
}
