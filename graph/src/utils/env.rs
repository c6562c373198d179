//! Environment variable access with trimming and emptiness checks.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvVarError {
    #[error(
        "Environment variable '{name}' not found. Set it in your .env file or environment."
    )]
    NotFound { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8 characters.")]
    InvalidUtf8 { name: String },

    #[error("Environment variable '{name}' is empty. Provide a non-blank value.")]
    Empty { name: String },
}

/// Reads environment variables, treating whitespace-only values as unset.
pub struct EnvUtils;

impl EnvUtils {
    pub fn has_non_empty_var(name: &str) -> bool {
        Self::get_validated_var(name).is_ok()
    }

    /// Returns the trimmed value of `name`.
    ///
    /// # Errors
    ///
    /// - [`EnvVarError::NotFound`] when the variable is not set
    /// - [`EnvVarError::Empty`] when it holds only whitespace
    /// - [`EnvVarError::InvalidUtf8`] when it is not valid Unicode
    pub fn get_validated_var(name: &str) -> Result<String, EnvVarError> {
        let name_owned = || name.to_string();
        match std::env::var(name) {
            Ok(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Err(EnvVarError::Empty { name: name_owned() })
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Err(std::env::VarError::NotPresent) => Err(EnvVarError::NotFound { name: name_owned() }),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(EnvVarError::InvalidUtf8 { name: name_owned() })
            }
        }
    }

    pub fn get_optional_var(name: &str) -> Option<String> {
        Self::get_validated_var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable() {
        let name = "NIMBUS_TEST_SURELY_UNSET_VARIABLE";
        assert_eq!(
            EnvUtils::get_validated_var(name),
            Err(EnvVarError::NotFound {
                name: name.to_string()
            })
        );
        assert!(!EnvUtils::has_non_empty_var(name));
        assert!(EnvUtils::get_optional_var(name).is_none());
    }
}
