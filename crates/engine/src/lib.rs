//! Contract surface of the workflow engine that hosts work-item handlers.
//!
//! - [`Environment`]: typed key/value entries shared with handlers.
//! - [`WorkItem`], [`WorkItemManager`], [`WorkItemHandler`]: the service-task
//!   extension point.
//! - [`ProcessDefinition`]: a linear `start -> service task(s) -> end`
//!   process, loaded from JSON.
//! - [`ProcessSession`]: runs process instances and records which nodes
//!   were triggered in its [`AuditLog`].

pub mod audit;
pub mod definition;
pub mod environment;
pub mod error;
pub mod handler;
pub mod session;
pub mod work_item;

pub use audit::{AuditLog, NodeInstanceLog};
pub use definition::{Node, ProcessDefinition};
pub use environment::Environment;
pub use error::{EngineError, EnvironmentError};
pub use handler::{HandlerError, WorkItemHandler};
pub use session::{ProcessInstance, ProcessSession, ProcessState};
pub use work_item::{WorkItem, WorkItemLedger, WorkItemManager, WorkItemResults, WorkItemState};
