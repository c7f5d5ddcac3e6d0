use std::collections::HashMap;

use workitem_db::bootstrap::SQL_DIR;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Persistence unit the session factory is created for (default: `workitem`).
    pub persistence_unit: String,
    /// Bootstrap and seed an in-memory database with this name before
    /// connecting. Unset means the unit's configured URL is used as is.
    pub embedded_db: Option<String>,
    /// Seed script root for the embedded database (default: the `sql/`
    /// directory of the `workitem-db` crate).
    pub sql_dir: String,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `WORKER_PERSISTENCE_UNIT` | `workitem`                     |
    /// | `WORKER_EMBEDDED_DB`      | unset                          |
    /// | `WORKER_SQL_DIR`          | `workitem_db::bootstrap::SQL_DIR` |
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = vars.into_iter().collect();
        let mut take = |key: &str| vars.remove(key).filter(|v| !v.trim().is_empty());

        Self {
            persistence_unit: take("WORKER_PERSISTENCE_UNIT").unwrap_or_else(|| "workitem".into()),
            embedded_db: take("WORKER_EMBEDDED_DB"),
            sql_dir: take("WORKER_SQL_DIR").unwrap_or_else(|| SQL_DIR.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = WorkerConfig::from_vars(Vec::new());
        assert_eq!(config.persistence_unit, "workitem");
        assert_eq!(config.embedded_db, None);
        assert_eq!(config.sql_dir, SQL_DIR);
    }

    #[test]
    fn sql_dir_default_is_absolute() {
        let config = WorkerConfig::from_vars(Vec::new());
        assert!(std::path::Path::new(&config.sql_dir).is_absolute());
        assert!(std::path::Path::new(&config.sql_dir).join("init.sql").is_file());
    }

    #[test]
    fn overrides_and_blank_values() {
        let config = WorkerConfig::from_vars(vars(&[
            ("WORKER_PERSISTENCE_UNIT", "etl"),
            ("WORKER_EMBEDDED_DB", "dbTest"),
            ("WORKER_SQL_DIR", "  "),
        ]));
        assert_eq!(config.persistence_unit, "etl");
        assert_eq!(config.embedded_db.as_deref(), Some("dbTest"));
        assert_eq!(config.sql_dir, SQL_DIR);
    }
}
