use workitem_core::error::CoreError;
use workitem_core::types::{ProcessInstanceId, WorkItemId};

use crate::handler::HandlerError;

/// A lookup in the [`Environment`](crate::Environment) did not yield a value
/// of the requested type.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Environment entry '{key}' is not set")]
    Missing { key: String },

    #[error("Environment entry '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Failed to parse process definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Process not found: {0}")]
    UnknownProcess(String),

    #[error("Process instance not found: {0}")]
    UnknownInstance(ProcessInstanceId),

    #[error("Process instance {0} is not active")]
    InstanceNotActive(ProcessInstanceId),

    #[error("No handler registered for work item '{0}'")]
    HandlerNotFound(String),

    #[error("Work item not found: {0}")]
    UnknownWorkItem(WorkItemId),

    #[error("Work item {id} is already {state}")]
    WorkItemSettled { id: WorkItemId, state: &'static str },

    /// The handler returned an error. `source` is the handler's error value,
    /// unchanged.
    #[error("Work item '{work_item}' failed at node '{node}': {source}")]
    WorkItemFailed {
        node: String,
        work_item: String,
        #[source]
        source: HandlerError,
    },
}
