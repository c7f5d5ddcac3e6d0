//! Shared identifiers, error types and name validation used by every
//! crate in the workspace.

pub mod error;
pub mod naming;
pub mod types;
