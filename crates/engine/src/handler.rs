use async_trait::async_trait;

use crate::work_item::{WorkItem, WorkItemManager};

/// Error returned by a handler. Boxed so the engine can carry any handler's
/// error unchanged and callers can downcast it back.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime behaviour of a service task, registered under the work-item name
/// that the process definition's service-task node refers to.
#[async_trait]
pub trait WorkItemHandler: Send + Sync {
    /// Run the work item. Report the outcome through `manager`; returning
    /// without completing or aborting leaves the process waiting.
    async fn execute_work_item(
        &self,
        work_item: &WorkItem,
        manager: &dyn WorkItemManager,
    ) -> Result<(), HandlerError>;

    /// Called when the process instance waiting on `work_item` is aborted.
    async fn abort_work_item(
        &self,
        work_item: &WorkItem,
        manager: &dyn WorkItemManager,
    ) -> Result<(), HandlerError>;
}
