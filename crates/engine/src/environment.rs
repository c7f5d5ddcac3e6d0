//! Typed entries shared between the embedding application and handlers.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EnvironmentError;

type Entry = Arc<dyn Any + Send + Sync>;

/// Key/value entries visible to every handler of a process session.
///
/// Populated by the embedding application before the session is created and
/// read-only afterwards.
#[derive(Default)]
pub struct Environment {
    entries: HashMap<String, Entry>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_entry<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Fetch the entry under `key` as a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, EnvironmentError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| EnvironmentError::Missing {
                key: key.to_string(),
            })?;
        Arc::clone(entry)
            .downcast::<T>()
            .map_err(|_| EnvironmentError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Environment").field("keys", &keys).finish()
    }
}
