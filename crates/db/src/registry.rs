//! Process-wide registry of session factories keyed by unit name.
//!
//! The registry is an ordinary value owned by the embedding application and
//! passed by reference to whoever needs a shared factory. Each unit's factory
//! is created once on first request and reused afterwards.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::config::PersistenceUnitCatalog;
use crate::error::PersistenceError;
use crate::factory::{SessionFactory, SessionFactoryCreator};

#[derive(Debug, Default)]
pub struct SessionFactoryRegistry {
    factories: Mutex<HashMap<String, SessionFactory>>,
}

impl SessionFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the registered factory for `unit_name`, creating it from
    /// `catalog` if none is registered or the registered one was closed.
    ///
    /// The lock is held across creation so concurrent callers never build
    /// two factories for the same unit. A failed creation registers nothing.
    pub async fn get_or_create(
        &self,
        unit_name: &str,
        catalog: &PersistenceUnitCatalog,
    ) -> Result<SessionFactory, PersistenceError> {
        let mut factories = self.factories.lock().await;

        if let Some(existing) = factories.get(unit_name) {
            if existing.is_open() {
                return Ok(existing.clone());
            }
            tracing::debug!(unit = unit_name, "Registered session factory is closed, recreating");
        }

        let factory = SessionFactoryCreator::create(unit_name, catalog).await?;
        factories.insert(unit_name.to_string(), factory.clone());
        Ok(factory)
    }

    pub async fn get(&self, unit_name: &str) -> Option<SessionFactory> {
        self.factories.lock().await.get(unit_name).cloned()
    }

    /// Register a factory built elsewhere, returning the one it replaces.
    pub async fn register(&self, factory: SessionFactory) -> Option<SessionFactory> {
        self.factories
            .lock()
            .await
            .insert(factory.unit_name().to_string(), factory)
    }

    pub async fn len(&self) -> usize {
        self.factories.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.factories.lock().await.is_empty()
    }

    /// Close and remove every registered factory.
    pub async fn close_all(&self) {
        let drained: Vec<SessionFactory> = self
            .factories
            .lock()
            .await
            .drain()
            .map(|(_, factory)| factory)
            .collect();
        for factory in drained {
            factory.close().await;
        }
    }
}
