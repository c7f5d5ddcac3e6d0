//! Runs process instances and dispatches service tasks to handlers.
//!
//! Nodes are visited in order. A service task creates a [`WorkItem`](crate::WorkItem) and
//! calls the handler registered under its work-item name:
//!
//! - handler completes the item: the instance moves to the next node;
//! - handler aborts the item: the instance is aborted;
//! - handler returns without settling: the instance waits until
//!   [`ProcessSession::complete_work_item`] or
//!   [`ProcessSession::abort_process_instance`] is called;
//! - handler returns an error: the instance fails and the error is returned
//!   in [`EngineError::WorkItemFailed`].
//!
//! No lock is held while a handler runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use workitem_core::naming::validate_name;
use workitem_core::types::{ProcessInstanceId, Timestamp, WorkItemId};

use crate::audit::{AuditLog, NodeInstanceLog};
use crate::definition::{Node, ProcessDefinition};
use crate::environment::Environment;
use crate::error::EngineError;
use crate::handler::WorkItemHandler;
use crate::work_item::{WorkItemLedger, WorkItemManager, WorkItemResults, WorkItemState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProcessState {
    Active,
    Completed,
    Aborted,
    Failed { node: String, reason: String },
}

/// Snapshot of a process instance.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessInstance {
    pub id: ProcessInstanceId,
    pub process_id: String,
    pub state: ProcessState,
    /// Work item the instance is blocked on, if any.
    pub waiting_on: Option<WorkItemId>,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    #[serde(skip)]
    next_node: usize,
}

impl ProcessInstance {
    fn new(id: ProcessInstanceId, process_id: &str) -> Self {
        Self {
            id,
            process_id: process_id.to_string(),
            state: ProcessState::Active,
            waiting_on: None,
            started_at: Utc::now(),
            ended_at: None,
            next_node: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ProcessState::Active
    }
}

pub struct ProcessSession {
    environment: Arc<Environment>,
    definitions: HashMap<String, Arc<ProcessDefinition>>,
    handlers: HashMap<String, Arc<dyn WorkItemHandler>>,
    ledger: Arc<WorkItemLedger>,
    instances: Mutex<HashMap<ProcessInstanceId, ProcessInstance>>,
    audit: AuditLog,
    last_instance_id: AtomicI64,
}

impl ProcessSession {
    /// Create a session over a fully populated environment.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment: Arc::new(environment),
            definitions: HashMap::new(),
            handlers: HashMap::new(),
            ledger: Arc::new(WorkItemLedger::new()),
            instances: Mutex::new(HashMap::new()),
            audit: AuditLog::new(),
            last_instance_id: AtomicI64::new(0),
        }
    }

    /// Add a process definition, replacing one with the same id.
    pub fn add_process(&mut self, definition: ProcessDefinition) -> Result<(), EngineError> {
        definition.validate()?;
        tracing::debug!(process_id = %definition.id, "Process definition added");
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Register `handler` for service tasks naming `work_item`.
    pub fn register_work_item_handler(
        &mut self,
        work_item: impl Into<String>,
        handler: Arc<dyn WorkItemHandler>,
    ) -> Result<(), EngineError> {
        let work_item = work_item.into();
        validate_name("Work item name", &work_item)?;
        tracing::debug!(work_item = %work_item, "Work item handler registered");
        self.handlers.insert(work_item, handler);
        Ok(())
    }

    pub fn environment(&self) -> Arc<Environment> {
        Arc::clone(&self.environment)
    }

    pub fn work_item_manager(&self) -> &WorkItemLedger {
        &self.ledger
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub async fn process_instance(&self, id: ProcessInstanceId) -> Option<ProcessInstance> {
        self.instances.lock().await.get(&id).cloned()
    }

    /// Start a new instance of `process_id` and run it until it ends or waits.
    pub async fn start_process(&self, process_id: &str) -> Result<ProcessInstance, EngineError> {
        let definition = self
            .definitions
            .get(process_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProcess(process_id.to_string()))?;

        let id = self.last_instance_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.instances
            .lock()
            .await
            .insert(id, ProcessInstance::new(id, process_id));
        tracing::info!(process_id, process_instance_id = id, "Process instance started");

        self.run_from(&definition, id, 0).await
    }

    /// Complete a work item the instance is waiting on and continue it.
    pub async fn complete_work_item(
        &self,
        work_item_id: WorkItemId,
        results: WorkItemResults,
    ) -> Result<ProcessInstance, EngineError> {
        let item = self
            .ledger
            .get(work_item_id)
            .await
            .ok_or(EngineError::UnknownWorkItem(work_item_id))?;
        let instance = self.waiting_instance(item.process_instance_id, work_item_id).await?;

        self.ledger.complete_work_item(work_item_id, results).await?;

        let definition = self
            .definitions
            .get(&instance.process_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProcess(instance.process_id.clone()))?;
        self.run_from(&definition, instance.id, instance.next_node).await
    }

    /// Abort an active instance. When it is waiting on a pending work item,
    /// that item's handler is asked to abort it first.
    pub async fn abort_process_instance(
        &self,
        id: ProcessInstanceId,
    ) -> Result<ProcessInstance, EngineError> {
        let instance = self
            .process_instance(id)
            .await
            .ok_or(EngineError::UnknownInstance(id))?;
        if !instance.is_active() {
            return Err(EngineError::InstanceNotActive(id));
        }

        if let Some(work_item_id) = instance.waiting_on {
            let item = self
                .ledger
                .get(work_item_id)
                .await
                .ok_or(EngineError::UnknownWorkItem(work_item_id))?;
            let pending = self.ledger.state(work_item_id).await == Some(WorkItemState::Pending);
            if let (true, Some(handler)) = (pending, self.handlers.get(&item.name)) {
                handler
                    .abort_work_item(&item, self.ledger.as_ref())
                    .await
                    .map_err(|source| EngineError::WorkItemFailed {
                        node: item.node_name.clone(),
                        work_item: item.name.clone(),
                        source,
                    })?;
            }
        }

        self.finish(id, ProcessState::Aborted).await
    }

    async fn waiting_instance(
        &self,
        id: ProcessInstanceId,
        work_item_id: WorkItemId,
    ) -> Result<ProcessInstance, EngineError> {
        let instance = self
            .process_instance(id)
            .await
            .ok_or(EngineError::UnknownInstance(id))?;
        if !instance.is_active() || instance.waiting_on != Some(work_item_id) {
            return Err(EngineError::InstanceNotActive(id));
        }
        Ok(instance)
    }

    async fn run_from(
        &self,
        definition: &ProcessDefinition,
        id: ProcessInstanceId,
        start: usize,
    ) -> Result<ProcessInstance, EngineError> {
        for (index, node) in definition.nodes.iter().enumerate().skip(start) {
            self.audit.record(NodeInstanceLog::new(id, node)).await;
            tracing::debug!(process_instance_id = id, node = node.name(), "Node triggered");

            let (node_name, work_item, parameters) = match node {
                Node::Start { .. } => continue,
                Node::End { .. } => return self.finish(id, ProcessState::Completed).await,
                Node::ServiceTask {
                    name,
                    work_item,
                    parameters,
                } => (name, work_item, parameters),
            };

            let Some(handler) = self.handlers.get(work_item).cloned() else {
                let err = EngineError::HandlerNotFound(work_item.clone());
                self.fail(id, node_name, &err.to_string()).await?;
                return Err(err);
            };

            let item = self
                .ledger
                .create(work_item, id, node_name, parameters.clone())
                .await;
            self.update(id, |instance| {
                instance.waiting_on = Some(item.id);
                instance.next_node = index + 1;
            })
            .await?;

            if let Err(source) = handler.execute_work_item(&item, self.ledger.as_ref()).await {
                tracing::warn!(
                    process_instance_id = id,
                    node = %node_name,
                    error = %source,
                    "Work item handler failed"
                );
                self.fail(id, node_name, &source.to_string()).await?;
                return Err(EngineError::WorkItemFailed {
                    node: node_name.clone(),
                    work_item: work_item.clone(),
                    source,
                });
            }

            match self.ledger.state(item.id).await {
                Some(WorkItemState::Completed(_)) => {
                    self.update(id, |instance| instance.waiting_on = None).await?;
                }
                Some(WorkItemState::Aborted) => {
                    return self.finish(id, ProcessState::Aborted).await;
                }
                _ => {
                    tracing::debug!(
                        process_instance_id = id,
                        work_item_id = item.id,
                        "Waiting for work item"
                    );
                    return self.snapshot(id).await;
                }
            }
        }

        // Validated definitions always end with an end node.
        self.finish(id, ProcessState::Completed).await
    }

    async fn snapshot(&self, id: ProcessInstanceId) -> Result<ProcessInstance, EngineError> {
        self.process_instance(id)
            .await
            .ok_or(EngineError::UnknownInstance(id))
    }

    async fn update<F>(&self, id: ProcessInstanceId, apply: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut ProcessInstance),
    {
        let mut instances = self.instances.lock().await;
        let instance = instances
            .get_mut(&id)
            .ok_or(EngineError::UnknownInstance(id))?;
        apply(instance);
        Ok(())
    }

    async fn fail(&self, id: ProcessInstanceId, node: &str, reason: &str) -> Result<(), EngineError> {
        self.finish(
            id,
            ProcessState::Failed {
                node: node.to_string(),
                reason: reason.to_string(),
            },
        )
        .await
        .map(|_| ())
    }

    async fn finish(
        &self,
        id: ProcessInstanceId,
        state: ProcessState,
    ) -> Result<ProcessInstance, EngineError> {
        let mut instances = self.instances.lock().await;
        let instance = instances
            .get_mut(&id)
            .ok_or(EngineError::UnknownInstance(id))?;
        instance.state = state;
        instance.waiting_on = None;
        instance.ended_at = Some(Utc::now());
        tracing::info!(
            process_instance_id = id,
            process_id = %instance.process_id,
            state = ?instance.state,
            "Process instance ended"
        );
        Ok(instance.clone())
    }
}
