//! Work items and the manager handlers report their outcome to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use workitem_core::types::{ProcessInstanceId, WorkItemId};

use crate::error::EngineError;

/// Key/value payload passed into and out of a work item.
pub type WorkItemResults = serde_json::Map<String, serde_json::Value>;

/// One activation of a service-task node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    /// Work-item name the handler is registered under.
    pub name: String,
    pub process_instance_id: ProcessInstanceId,
    /// Name of the service-task node that created this item.
    pub node_name: String,
    pub parameters: WorkItemResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WorkItemState {
    Pending,
    Completed(WorkItemResults),
    Aborted,
}

impl WorkItemState {
    pub fn label(&self) -> &'static str {
        match self {
            WorkItemState::Pending => "pending",
            WorkItemState::Completed(_) => "completed",
            WorkItemState::Aborted => "aborted",
        }
    }
}

/// How a handler signals the outcome of a work item back to the engine.
#[async_trait]
pub trait WorkItemManager: Send + Sync {
    /// Mark the item completed with `results`.
    async fn complete_work_item(
        &self,
        id: WorkItemId,
        results: WorkItemResults,
    ) -> Result<(), EngineError>;

    /// Mark the item aborted.
    async fn abort_work_item(&self, id: WorkItemId) -> Result<(), EngineError>;
}

#[derive(Debug)]
struct WorkItemRecord {
    item: WorkItem,
    state: WorkItemState,
}

/// The engine's [`WorkItemManager`]: tracks every work item of a session and
/// its state. Items settle at most once.
///
/// Settled items are never evicted; the ledger grows for the life of the
/// owning [`ProcessSession`](crate::ProcessSession).
#[derive(Debug, Default)]
pub struct WorkItemLedger {
    items: Mutex<HashMap<WorkItemId, WorkItemRecord>>,
    last_id: AtomicI64,
}

impl WorkItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending work item.
    pub(crate) async fn create(
        &self,
        name: &str,
        process_instance_id: ProcessInstanceId,
        node_name: &str,
        parameters: WorkItemResults,
    ) -> WorkItem {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let item = WorkItem {
            id,
            name: name.to_string(),
            process_instance_id,
            node_name: node_name.to_string(),
            parameters,
        };
        self.items.lock().await.insert(
            id,
            WorkItemRecord {
                item: item.clone(),
                state: WorkItemState::Pending,
            },
        );
        item
    }

    pub async fn get(&self, id: WorkItemId) -> Option<WorkItem> {
        self.items.lock().await.get(&id).map(|r| r.item.clone())
    }

    pub async fn state(&self, id: WorkItemId) -> Option<WorkItemState> {
        self.items.lock().await.get(&id).map(|r| r.state.clone())
    }

    async fn settle(&self, id: WorkItemId, next: WorkItemState) -> Result<(), EngineError> {
        let mut items = self.items.lock().await;
        let record = items.get_mut(&id).ok_or(EngineError::UnknownWorkItem(id))?;
        if record.state != WorkItemState::Pending {
            return Err(EngineError::WorkItemSettled {
                id,
                state: record.state.label(),
            });
        }
        tracing::debug!(work_item_id = id, state = next.label(), "Work item settled");
        record.state = next;
        Ok(())
    }
}

#[async_trait]
impl WorkItemManager for WorkItemLedger {
    async fn complete_work_item(
        &self,
        id: WorkItemId,
        results: WorkItemResults,
    ) -> Result<(), EngineError> {
        self.settle(id, WorkItemState::Completed(results)).await
    }

    async fn abort_work_item(&self, id: WorkItemId) -> Result<(), EngineError> {
        self.settle(id, WorkItemState::Aborted).await
    }
}
