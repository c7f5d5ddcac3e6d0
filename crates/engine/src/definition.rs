//! Linear process definitions.
//!
//! A definition is an ordered list of nodes: one `start`, any number of
//! `service_task`s, and a final `end`. Definitions are written as JSON:
//!
//! ```json
//! {
//!   "id": "com.example.bpm.FindPersonProcess",
//!   "name": "FindPersonProcess",
//!   "nodes": [
//!     { "type": "start", "name": "Start" },
//!     { "type": "service_task", "name": "FindPerson", "work_item": "FindPersonWorkItemHandler" },
//!     { "type": "end", "name": "End" }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use workitem_core::error::CoreError;
use workitem_core::naming::validate_name;

use crate::error::EngineError;
use crate::work_item::WorkItemResults;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Start {
        name: String,
    },
    ServiceTask {
        name: String,
        /// Work-item name a handler must be registered under.
        work_item: String,
        #[serde(default)]
        parameters: WorkItemResults,
    },
    End {
        name: String,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Start { name } | Node::ServiceTask { name, .. } | Node::End { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Start { .. } => "start",
            Node::ServiceTask { .. } => "service_task",
            Node::End { .. } => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    pub name: String,
    pub nodes: Vec<Node>,
}

impl ProcessDefinition {
    /// Parse and validate a JSON definition.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Check the definition's shape.
    ///
    /// Rules:
    /// - The id follows the workspace naming rules; the name is not empty.
    /// - The first node is the only `start`, the last node is the only `end`.
    /// - Node names are non-empty and unique.
    /// - Every service task names a valid work item.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("Process id", &self.id)?;
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Process name must not be empty".to_string()));
        }

        match (self.nodes.first(), self.nodes.last()) {
            (Some(Node::Start { .. }), Some(Node::End { .. })) if self.nodes.len() >= 2 => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "Process {} must begin with a start node and finish with an end node",
                    self.id
                )))
            }
        }

        let last = self.nodes.len() - 1;
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if node.name().trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Node at index {i} must have a name"
                )));
            }
            if !seen.insert(node.name()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate node name: \"{}\"",
                    node.name()
                )));
            }
            match node {
                Node::Start { .. } if i != 0 => {
                    return Err(CoreError::Validation(format!(
                        "Start node \"{}\" must be the first node",
                        node.name()
                    )))
                }
                Node::End { .. } if i != last => {
                    return Err(CoreError::Validation(format!(
                        "End node \"{}\" must be the last node",
                        node.name()
                    )))
                }
                Node::ServiceTask { work_item, .. } => {
                    validate_name("Work item name", work_item)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Work-item names referenced by the service tasks, in node order.
    pub fn work_items(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            Node::ServiceTask { work_item, .. } => Some(work_item.as_str()),
            _ => None,
        })
    }
}
