//! Persistence-unit metadata and the catalog that factory creation resolves
//! unit names against.
//!
//! A [`PersistenceUnitCatalog`] is passed explicitly to
//! [`SessionFactoryCreator::create`](crate::factory::SessionFactoryCreator::create);
//! nothing is looked up from ambient or thread-local state.

use std::collections::{BTreeMap, HashMap};

use validator::Validate;
use workitem_core::error::CoreError;
use workitem_core::naming::{env_segment_to_name, validate_name};

use crate::error::PersistenceError;

/// Pool size used when a unit does not set one.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Seconds to wait for a pooled connection when a unit does not set it.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

const ENV_PREFIX: &str = "PERSISTENCE_UNIT_";
const URL_SUFFIX: &str = "_URL";

/// A named persistence unit: which database to use and how to pool it.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct PersistenceUnit {
    pub name: String,
    #[validate(length(min = 1, message = "database_url must not be empty"))]
    pub database_url: String,
    #[validate(range(min = 1, max = 256, message = "max_connections must be in 1..=256"))]
    pub max_connections: u32,
    #[validate(range(min = 1, message = "acquire_timeout_secs must be at least 1"))]
    pub acquire_timeout_secs: u64,
}

impl PersistenceUnit {
    /// Create a unit with default pool settings.
    pub fn new(name: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout_secs(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }

    /// Check the unit metadata before a pool is built from it.
    ///
    /// Rules:
    /// - The name follows the workspace naming rules.
    /// - Field constraints declared on the struct hold.
    /// - The URL uses the `sqlite:` scheme.
    pub fn check(&self) -> Result<(), CoreError> {
        validate_name("Persistence unit name", &self.name)?;
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if !self.database_url.starts_with("sqlite:") {
            return Err(CoreError::Validation(format!(
                "database_url must use the sqlite: scheme, got \"{}\"",
                self.database_url
            )));
        }
        Ok(())
    }
}

/// The set of persistence units visible to a caller.
#[derive(Debug, Clone, Default)]
pub struct PersistenceUnitCatalog {
    units: BTreeMap<String, PersistenceUnit>,
}

impl PersistenceUnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_unit(mut self, unit: PersistenceUnit) -> Self {
        self.insert(unit);
        self
    }

    /// Add or replace a unit, returning the previous definition if any.
    pub fn insert(&mut self, unit: PersistenceUnit) -> Option<PersistenceUnit> {
        self.units.insert(unit.name.clone(), unit)
    }

    /// Look up a unit by name.
    pub fn resolve(&self, name: &str) -> Result<&PersistenceUnit, PersistenceError> {
        self.units
            .get(name)
            .ok_or_else(|| PersistenceError::UnknownUnit(name.to_string()))
    }

    /// Unit names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Load units from the process environment.
    ///
    /// | Env Var                                     | Default |
    /// |---------------------------------------------|---------|
    /// | `PERSISTENCE_UNIT_<NAME>_URL`               | --      |
    /// | `PERSISTENCE_UNIT_<NAME>_MAX_CONNECTIONS`   | `5`     |
    /// | `PERSISTENCE_UNIT_<NAME>_ACQUIRE_TIMEOUT_SECS` | `10` |
    ///
    /// `<NAME>` is lower-cased to form the unit name.
    pub fn from_env() -> Result<Self, PersistenceError> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable set.
    pub fn from_vars<I>(vars: I) -> Result<Self, PersistenceError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut catalog = Self::new();

        for (key, url) in &vars {
            let Some(segment) = key
                .strip_prefix(ENV_PREFIX)
                .and_then(|rest| rest.strip_suffix(URL_SUFFIX))
            else {
                continue;
            };
            let name = env_segment_to_name(segment);

            let max_connections = parse_var(
                &vars,
                &format!("{ENV_PREFIX}{segment}_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
                &name,
            )?;
            let acquire_timeout_secs = parse_var(
                &vars,
                &format!("{ENV_PREFIX}{segment}_ACQUIRE_TIMEOUT_SECS"),
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
                &name,
            )?;

            catalog.insert(
                PersistenceUnit::new(name, url.trim())
                    .with_max_connections(max_connections)
                    .with_acquire_timeout_secs(acquire_timeout_secs),
            );
        }

        Ok(catalog)
    }
}

fn parse_var<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
    unit: &str,
) -> Result<T, PersistenceError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| PersistenceError::InvalidUnit {
            unit: unit.to_string(),
            source: CoreError::Validation(format!("{key} must be a positive integer, got \"{raw}\"")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn loads_unit_with_defaults() {
        let catalog = PersistenceUnitCatalog::from_vars(vars(&[
            ("PERSISTENCE_UNIT_JBPMAPPTEST_URL", "sqlite::memory:"),
            ("HOME", "/root"),
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let unit = catalog.resolve("jbpmapptest").unwrap();
        assert_eq!(unit.database_url, "sqlite::memory:");
        assert_eq!(unit.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(unit.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn loads_pool_overrides() {
        let catalog = PersistenceUnitCatalog::from_vars(vars(&[
            ("PERSISTENCE_UNIT_ETL_URL", "sqlite:etl.db"),
            ("PERSISTENCE_UNIT_ETL_MAX_CONNECTIONS", "2"),
            ("PERSISTENCE_UNIT_ETL_ACQUIRE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        let unit = catalog.resolve("etl").unwrap();
        assert_eq!(unit.max_connections, 2);
        assert_eq!(unit.acquire_timeout_secs, 3);
    }

    #[test]
    fn rejects_non_numeric_pool_size() {
        let result = PersistenceUnitCatalog::from_vars(vars(&[
            ("PERSISTENCE_UNIT_ETL_URL", "sqlite:etl.db"),
            ("PERSISTENCE_UNIT_ETL_MAX_CONNECTIONS", "many"),
        ]));
        assert_matches!(result, Err(PersistenceError::InvalidUnit { unit, .. }) if unit == "etl");
    }

    #[test]
    fn resolve_unknown_unit_fails() {
        let catalog = PersistenceUnitCatalog::new();
        assert_matches!(
            catalog.resolve("missing"),
            Err(PersistenceError::UnknownUnit(name)) if name == "missing"
        );
    }

    #[test]
    fn check_accepts_sqlite_unit() {
        assert!(PersistenceUnit::new("app", "sqlite::memory:").check().is_ok());
    }

    #[test]
    fn check_rejects_other_schemes() {
        let err = PersistenceUnit::new("app", "postgres://localhost/app")
            .check()
            .unwrap_err();
        assert!(err.to_string().contains("sqlite:"));
    }

    #[test]
    fn check_rejects_zero_pool() {
        let unit = PersistenceUnit::new("app", "sqlite::memory:").with_max_connections(0);
        assert!(unit.check().is_err());
    }

    #[test]
    fn check_rejects_bad_name() {
        assert!(PersistenceUnit::new("my unit", "sqlite::memory:").check().is_err());
    }

    #[test]
    fn insert_replaces_existing_definition() {
        let mut catalog = PersistenceUnitCatalog::new()
            .with_unit(PersistenceUnit::new("app", "sqlite:a.db"));
        let previous = catalog.insert(PersistenceUnit::new("app", "sqlite:b.db"));

        assert_eq!(previous.map(|u| u.database_url).as_deref(), Some("sqlite:a.db"));
        assert_eq!(catalog.resolve("app").unwrap().database_url, "sqlite:b.db");
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["app"]);
    }
}
