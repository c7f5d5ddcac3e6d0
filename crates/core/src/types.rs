/// Database primary keys are 64-bit integers (`INTEGER PRIMARY KEY` in SQLite).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a running process instance inside a process session.
pub type ProcessInstanceId = i64;

/// Identifier of a work item, unique within a process session.
pub type WorkItemId = i64;
