//! Named in-memory SQLite databases for tests and local runs.
//!
//! A shared-cache in-memory database lives only while at least one
//! connection to it is open. [`EmbeddedDatabase::start`] opens a
//! bootstrapping connection per database, applies [`MIGRATOR`] and the init
//! scripts through it, and keeps it open until
//! [`EmbeddedDatabase::shutdown`].
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), workitem_db::bootstrap::BootstrapError> {
//! use workitem_db::bootstrap::{DatabaseInstance, EmbeddedDatabase, SQL_DIR};
//!
//! let db = EmbeddedDatabase::start(
//!     SQL_DIR,
//!     vec![DatabaseInstance::new("dbTest")
//!         .with_migrations()
//!         .with_init_script("init.sql")],
//! )
//! .await?;
//! // ... connect with `DatabaseInstance::url()` ...
//! db.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;

use crate::MIGRATOR;

/// Directory holding the bundled seed scripts.
pub const SQL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/sql");

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to read script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to migrate database '{name}': {source}")]
    Migrate {
        name: String,
        #[source]
        source: MigrateError,
    },

    #[error("Failed to bootstrap database '{name}': {source}")]
    Database {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

/// URL of the shared-cache in-memory database called `name`.
pub fn database_url(name: &str) -> String {
    format!("sqlite:file:{name}?mode=memory&cache=shared")
}

/// One database to create: whether to apply the schema migrations, and the
/// scripts that seed it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInstance {
    pub name: String,
    pub migrate: bool,
    pub init_scripts: Vec<PathBuf>,
}

impl DatabaseInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            migrate: false,
            init_scripts: Vec::new(),
        }
    }

    pub fn with_migrations(mut self) -> Self {
        self.migrate = true;
        self
    }

    pub fn with_init_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_scripts.push(path.into());
        self
    }

    pub fn url(&self) -> String {
        database_url(&self.name)
    }

    /// Init scripts in execution order. They run after the migrations.
    pub fn scripts(&self) -> impl Iterator<Item = &PathBuf> {
        self.init_scripts.iter()
    }
}

/// A set of running in-memory databases kept alive by bootstrapping
/// connections.
pub struct EmbeddedDatabase {
    connections: HashMap<String, SqliteConnection>,
}

impl EmbeddedDatabase {
    /// Create, migrate and seed every instance. Script paths are resolved
    /// against `resource_root`.
    ///
    /// On failure, databases that were already started are shut down before
    /// the error is returned.
    pub async fn start(
        resource_root: impl AsRef<Path>,
        instances: Vec<DatabaseInstance>,
    ) -> Result<Self, BootstrapError> {
        let resource_root = resource_root.as_ref();
        let mut db = Self {
            connections: HashMap::with_capacity(instances.len()),
        };

        tracing::info!(count = instances.len(), "Starting embedded databases");
        for instance in instances {
            match create_and_init(resource_root, &instance).await {
                Ok(conn) => {
                    db.connections.insert(instance.name.clone(), conn);
                }
                Err(e) => {
                    db.shutdown().await;
                    return Err(e);
                }
            }
        }
        Ok(db)
    }

    /// Names of the running databases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Close every bootstrapping connection, which drops the databases once
    /// no other connection refers to them.
    pub async fn shutdown(mut self) {
        for (name, conn) in self.connections.drain() {
            tracing::info!(database = %name, "Closing bootstrapping connection");
            if let Err(e) = conn.close().await {
                tracing::warn!(database = %name, error = %e, "Failed to close bootstrapping connection");
            }
        }
    }
}

impl std::fmt::Debug for EmbeddedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("EmbeddedDatabase")
            .field("databases", &names)
            .finish()
    }
}

async fn create_and_init(
    resource_root: &Path,
    instance: &DatabaseInstance,
) -> Result<SqliteConnection, BootstrapError> {
    let db_err = |source| BootstrapError::Database {
        name: instance.name.clone(),
        source,
    };

    tracing::info!(database = %instance.name, url = %instance.url(), "Establishing bootstrapping connection");
    let options = SqliteConnectOptions::from_str(&instance.url())
        .map_err(db_err)?
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(db_err)?;

    if instance.migrate {
        tracing::info!(database = %instance.name, "Applying migrations");
        MIGRATOR
            .run(&mut conn)
            .await
            .map_err(|source| BootstrapError::Migrate {
                name: instance.name.clone(),
                source,
            })?;
    }

    for script in instance.scripts() {
        let path = resource_root.join(script);
        let sql = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| BootstrapError::Script {
                path: path.clone(),
                source,
            })?;
        tracing::info!(database = %instance.name, script = %path.display(), "Running script");
        sqlx::raw_sql(&sql).execute(&mut conn).await.map_err(db_err)?;
    }

    Ok(conn)
}
