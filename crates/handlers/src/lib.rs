//! Work-item handlers contributed to the workflow engine.

pub mod find_person;

pub use find_person::{
    find_person_process, FindPersonWorkItemHandler, FIND_PERSON_PROCESS_ID, FIND_PERSON_WORK_ITEM,
    PERSON_ID, SESSION_FACTORY_KEY,
};
