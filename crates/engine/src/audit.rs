//! Node-instance history of a process session.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use workitem_core::types::{ProcessInstanceId, Timestamp};

use crate::definition::Node;

/// A node was reached by a process instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInstanceLog {
    pub process_instance_id: ProcessInstanceId,
    pub node_name: String,
    pub node_type: &'static str,
    pub triggered_at: Timestamp,
}

impl NodeInstanceLog {
    pub fn new(process_instance_id: ProcessInstanceId, node: &Node) -> Self {
        Self {
            process_instance_id,
            node_name: node.name().to_string(),
            node_type: node.kind(),
            triggered_at: Utc::now(),
        }
    }
}

/// Append-only history of triggered nodes. Entries of finished instances
/// are kept for the life of the owning
/// [`ProcessSession`](crate::ProcessSession).
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<NodeInstanceLog>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, entry: NodeInstanceLog) {
        self.entries.lock().await.push(entry);
    }

    /// Entries for one instance in trigger order.
    pub async fn entries_for(&self, process_instance_id: ProcessInstanceId) -> Vec<NodeInstanceLog> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.process_instance_id == process_instance_id)
            .cloned()
            .collect()
    }

    pub async fn node_triggered(&self, process_instance_id: ProcessInstanceId, node_name: &str) -> bool {
        self.entries
            .lock()
            .await
            .iter()
            .any(|e| e.process_instance_id == process_instance_id && e.node_name == node_name)
    }
}
