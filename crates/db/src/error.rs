use workitem_core::error::CoreError;

/// Errors raised by the persistence layer.
///
/// Configuration errors (`UnknownUnit`, `InvalidUnit`) surface from factory
/// creation; session-state errors surface from misuse of a [`Session`]; every
/// driver failure is carried unchanged in `Database`.
///
/// [`Session`]: crate::session::Session
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// No persistence unit with this name is visible in the catalog.
    #[error("Persistence unit not found: {0}")]
    UnknownUnit(String),

    /// The unit exists but its metadata is unusable.
    #[error("Invalid persistence unit '{unit}': {source}")]
    InvalidUnit {
        unit: String,
        #[source]
        source: CoreError,
    },

    #[error("Session is closed")]
    SessionClosed,

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("A transaction is already active on this session")]
    TransactionAlreadyActive,

    #[error("Session factory for unit '{0}' is closed")]
    FactoryClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
