use super::AppConfig;
use nimbus_graph::auth::AzureAdFlowType;
use nimbus_graph::auth::types::CLIENT_SECRET_ENV_VAR;

const MAX_TIMEOUT_SECS: u64 = 600;
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Outcome of reading the configuration sources.
#[derive(Debug, Clone)]
pub enum ConfigLoadResult {
    Success(Box<AppConfig>),
    LoadError(String),
    DeserializeError(String),
}

impl ConfigLoadResult {
    pub fn into_result(self) -> Result<AppConfig, String> {
        match self {
            ConfigLoadResult::Success(config) => Ok(*config),
            ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => Err(e),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("azure_ad.tenant_id is missing")]
    MissingTenantId,
    #[error("azure_ad.client_id is missing")]
    MissingClientId,
    #[error("azure_ad.client_secret is missing for the client_credentials flow")]
    MissingClientSecret,
    #[error("graph.scopes is empty")]
    EmptyScopes,
    #[error("Invalid graph.requests_per_second: {configured}")]
    RequestsPerSecond { configured: u32 },
    #[error("Invalid graph.timeout_secs: {configured} (min: 1, max: {limit})")]
    Timeout { configured: u64, limit: u64 },
    #[error("Invalid logging.level: {configured}")]
    LogLevel { configured: String },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::MissingTenantId => {
                "No tenant configured.\n\nSet tenant_id under [azure_ad] in config.toml or AZURE_AD__TENANT_ID in the environment.".to_string()
            }
            ConfigValidationError::MissingClientId => {
                "No application (client) ID configured.\n\nSet client_id under [azure_ad] in config.toml or AZURE_AD__CLIENT_ID in the environment.".to_string()
            }
            ConfigValidationError::MissingClientSecret => format!(
                "The client_credentials flow needs a client secret.\n\nSet client_secret under [azure_ad] or export {CLIENT_SECRET_ENV_VAR}."
            ),
            ConfigValidationError::EmptyScopes => {
                "No Graph scopes configured.\n\nSet scopes under [graph], e.g. [\"https://graph.microsoft.com/.default\"].".to_string()
            }
            ConfigValidationError::RequestsPerSecond { configured } => format!(
                "Request rate must be positive.\n\nYour configured value: {configured}\n\nPlease update requests_per_second in config.toml."
            ),
            ConfigValidationError::Timeout { configured, limit } => format!(
                "Request timeout out of range!\n\nYour configured value: {configured} seconds\nValid range: 1 - {limit}\n\nPlease update timeout_secs in config.toml."
            ),
            ConfigValidationError::LogLevel { configured } => format!(
                "Unknown log level '{configured}'.\n\nUse one of: {}.",
                LOG_LEVELS.join(", ")
            ),
        }
    }
}

impl AppConfig {
    /// Checks the configuration. Entra ID settings are only required when
    /// no pre-acquired token is supplied.
    pub fn validate(&self, uses_static_token: bool) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();
        let graph = self.graph();

        if graph.scopes.iter().all(|s| s.trim().is_empty()) {
            errors.push(ConfigValidationError::EmptyScopes);
        }
        if graph.requests_per_second == 0 {
            errors.push(ConfigValidationError::RequestsPerSecond {
                configured: graph.requests_per_second,
            });
        }
        if graph.timeout_secs == 0 || graph.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ConfigValidationError::Timeout {
                configured: graph.timeout_secs,
                limit: MAX_TIMEOUT_SECS,
            });
        }

        let level = self.logging().level().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::LogLevel {
                configured: self.logging().level().to_string(),
            });
        }

        if !uses_static_token {
            let azure_ad = self.azure_ad();
            if azure_ad.tenant_id().is_err() {
                errors.push(ConfigValidationError::MissingTenantId);
            }
            if azure_ad.client_id().is_err() {
                errors.push(ConfigValidationError::MissingClientId);
            }
            if azure_ad.auth_method == AzureAdFlowType::ClientCredentials
                && azure_ad.client_secret().is_none()
            {
                errors.push(ConfigValidationError::MissingClientSecret);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
