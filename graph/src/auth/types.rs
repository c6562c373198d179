use crate::common::{GraphError, GraphResult};
use crate::utils::EnvUtils;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Environment variable consulted when no client secret is configured.
pub const CLIENT_SECRET_ENV_VAR: &str = "AZURE_CLIENT_SECRET";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// How a provider obtains its tokens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Entra ID OAuth2 flows
    AzureAd,
    /// A token acquired out of band
    StaticToken,
}

/// Entra ID OAuth2 grant used to acquire Graph tokens.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AzureAdFlowType {
    /// Interactive sign-in on another device; delegated permissions
    #[default]
    DeviceCode,
    /// Application identity with a client secret; application permissions
    ClientCredentials,
}

/// Configuration for Entra ID authentication.
///
/// # Required Fields
///
/// - `tenant_id` - directory (tenant) ID or verified domain
/// - `client_id` - application (client) ID of the app registration
///
/// # Required for Client Credentials Flow
///
/// - `client_secret` - falls back to the `AZURE_CLIENT_SECRET` environment
///   variable when omitted
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::auth::types::{AzureAdAuthConfig, AzureAdFlowType};
///
/// let config = AzureAdAuthConfig {
///     auth_method: AzureAdFlowType::DeviceCode,
///     tenant_id: Some("contoso.onmicrosoft.com".to_string()),
///     client_id: Some("your-client-id".to_string()),
///     client_secret: None,
///     authority_host: None,
///     open_browser: true,
/// };
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AzureAdAuthConfig {
    #[serde(default)]
    pub auth_method: AzureAdFlowType,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Authority host (defaults to https://login.microsoftonline.com)
    pub authority_host: Option<String>,
    /// Open the device code verification page in the default browser
    #[serde(default)]
    pub open_browser: bool,
}

impl AzureAdAuthConfig {
    pub fn authority_host(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
            .trim_end_matches('/')
    }

    pub fn tenant_id(&self) -> GraphResult<&str> {
        non_empty(self.tenant_id.as_deref()).ok_or_else(|| {
            GraphError::Configuration("Azure AD tenant_id is required".to_string())
        })
    }

    pub fn client_id(&self) -> GraphResult<&str> {
        non_empty(self.client_id.as_deref()).ok_or_else(|| {
            GraphError::Configuration("Azure AD client_id is required".to_string())
        })
    }

    /// Configured client secret, or the value of `AZURE_CLIENT_SECRET`.
    pub fn client_secret(&self) -> Option<String> {
        non_empty(self.client_secret.as_deref())
            .map(str::to_string)
            .or_else(|| EnvUtils::get_optional_var(CLIENT_SECRET_ENV_VAR))
    }

    pub fn token_endpoint(&self) -> GraphResult<String> {
        Ok(format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host(),
            self.tenant_id()?
        ))
    }

    pub fn device_code_endpoint(&self) -> GraphResult<String> {
        Ok(format!(
            "{}/{}/oauth2/v2.0/devicecode",
            self.authority_host(),
            self.tenant_id()?
        ))
    }

    /// Checks that the fields required by the selected flow are present.
    pub fn validate(&self) -> GraphResult<()> {
        self.tenant_id()?;
        self.client_id()?;
        if self.auth_method == AzureAdFlowType::ClientCredentials && self.client_secret().is_none()
        {
            return Err(GraphError::Configuration(format!(
                "client_credentials flow requires client_secret or {CLIENT_SECRET_ENV_VAR}"
            )));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A cached authentication token with expiration tracking.
#[derive(Clone, Debug)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: Instant,
    pub token_type: String,
}

impl CachedToken {
    pub fn new(token: String, expires_in: Duration, token_type: String) -> Self {
        Self {
            token,
            expires_at: Instant::now() + expires_in,
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// True within five minutes of expiry.
    pub fn needs_refresh(&self) -> bool {
        let buffer = Duration::from_secs(300);
        Instant::now() + buffer >= self.expires_at
    }
}

/// What the user must do to finish a device code sign-in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceCodeInfo {
    pub user_code: String,
    pub verification_uri: String,
    /// Human-readable instructions from the authority
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(flow: AzureAdFlowType) -> AzureAdAuthConfig {
        AzureAdAuthConfig {
            auth_method: flow,
            tenant_id: Some("contoso.onmicrosoft.com".to_string()),
            client_id: Some("11111111-2222-3333-4444-555555555555".to_string()),
            client_secret: None,
            authority_host: Some("https://login.microsoftonline.us/".to_string()),
            open_browser: false,
        }
    }

    #[test]
    fn test_endpoints_use_authority_and_tenant() {
        let config = config(AzureAdFlowType::DeviceCode);
        assert_eq!(
            config.token_endpoint().unwrap(),
            "https://login.microsoftonline.us/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
        assert_eq!(
            config.device_code_endpoint().unwrap(),
            "https://login.microsoftonline.us/contoso.onmicrosoft.com/oauth2/v2.0/devicecode"
        );
    }

    #[test]
    fn test_blank_tenant_is_rejected() {
        let mut config = config(AzureAdFlowType::DeviceCode);
        config.tenant_id = Some("   ".to_string());
        assert!(matches!(
            config.validate(),
            Err(GraphError::Configuration(_))
        ));
    }

    #[test]
    fn test_client_credentials_with_secret_validates() {
        let mut config = config(AzureAdFlowType::ClientCredentials);
        config.client_secret = Some("s3cret".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.client_secret().as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_cached_token_refresh_window() {
        let fresh = CachedToken::new("t".into(), Duration::from_secs(3600), "Bearer".into());
        assert!(!fresh.is_expired());
        assert!(!fresh.needs_refresh());

        let expiring = CachedToken::new("t".into(), Duration::from_secs(60), "Bearer".into());
        assert!(!expiring.is_expired());
        assert!(expiring.needs_refresh());
    }
}
