use crate::config::ConfigValidationError;
use nimbus_graph::GraphError;

/// Errors surfaced by the `nimbus` command-line client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration:\n{}", format_validation(.0))]
    Validation(Vec<ConfigValidationError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Re-authentication was requested but the command was challenged again.
    #[error("Re-authentication did not satisfy the claims challenge: {0}")]
    ChallengeUnresolved(String),

    /// The claims challenge could not be handled at all.
    #[error("Claims challenge could not be handled; sign in again and retry")]
    ChallengeFailed,
}

fn format_validation(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ConfigValidationError::user_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub type AppResult<T> = Result<T, AppError>;
