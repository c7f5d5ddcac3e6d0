//! Repository for the `person` table.
//!
//! Every operation runs on a [`Session`] with an active transaction, so it
//! composes with [`TransactionalRepository`](crate::TransactionalRepository).

use workitem_core::types::DbId;

use crate::error::PersistenceError;
use crate::models::person::{CreatePerson, Person};
use crate::session::Session;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name";

pub struct PersonRepo;

impl PersonRepo {
    /// Insert a new person, returning the created row.
    pub async fn create(
        session: &mut Session,
        input: &CreatePerson,
    ) -> Result<Person, PersistenceError> {
        let query = format!("INSERT INTO person (name) VALUES (?) RETURNING {COLUMNS}");
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(&input.name)
            .fetch_one(session.connection()?)
            .await?;
        Ok(person)
    }

    /// Find a person by id.
    pub async fn find_by_id(
        session: &mut Session,
        id: DbId,
    ) -> Result<Option<Person>, PersistenceError> {
        session.find::<Person>(id).await
    }

    /// Find a person by its unique name.
    pub async fn find_by_name(
        session: &mut Session,
        name: &str,
    ) -> Result<Option<Person>, PersistenceError> {
        let query = format!("SELECT {COLUMNS} FROM person WHERE name = ?");
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(name)
            .fetch_optional(session.connection()?)
            .await?;
        Ok(person)
    }

    /// Number of rows in the table.
    pub async fn count(session: &mut Session) -> Result<i64, PersistenceError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM person")
            .fetch_one(session.connection()?)
            .await?;
        Ok(count)
    }
}
