//! Person entity model and DTOs.

use std::hash::{Hash, Hasher};

use serde::Serialize;
use sqlx::FromRow;
use workitem_core::types::DbId;

use crate::session::Entity;

/// A row from the `person` table.
///
/// `id` is assigned by the database and never changes. Two persons are equal
/// when their names are equal, regardless of `id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub name: String,
}

impl Person {
    pub fn new(id: DbId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Entity for Person {
    const TABLE: &'static str = "person";
    const COLUMNS: &'static str = "id, name";
}

/// DTO for inserting a person. The id is generated.
#[derive(Debug, Clone)]
pub struct CreatePerson {
    pub name: String,
}
