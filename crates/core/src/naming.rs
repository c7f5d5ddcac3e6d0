//! Validation rules for the symbolic names that tie the pieces together:
//! persistence-unit names, work-item names, process ids and node names.

use crate::error::CoreError;

/// Maximum length of a symbolic name.
pub const MAX_NAME_LEN: usize = 128;

/// Validate a symbolic name.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_NAME_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
///
/// `kind` is used in the error message, e.g. `"Persistence unit name"`.
pub fn validate_name(kind: &str, name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(format!("{kind} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(format!(
            "{kind} may only contain alphanumeric, hyphen, underscore, or dot characters, got \"{name}\""
        )));
    }
    Ok(())
}

/// Convert an upper-case environment-variable segment into a unit name.
///
/// `JBPM_APP_TEST` becomes `jbpm_app_test`.
pub fn env_segment_to_name(segment: &str) -> String {
    segment.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_process_id() {
        assert!(validate_name("Process id", "com.example.bpm.FindPersonProcess").is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let err = validate_name("Work item name", "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Work item name must not be empty"
        );
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name("Node name", &name).is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(validate_name("Persistence unit name", "my unit").is_err());
    }

    #[test]
    fn env_segment_is_lowercased() {
        assert_eq!(env_segment_to_name("JBPM_APP_TEST"), "jbpm_app_test");
    }
}
