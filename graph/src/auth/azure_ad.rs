use super::auth_state::AuthStateManager;
use super::provider::{AuthProvider, AuthToken};
use super::types::{AuthType, AzureAdAuthConfig, AzureAdFlowType, DeviceCodeInfo};
use crate::common::{GraphError, GraphResult, TokenRefreshError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Shows device code instructions to the user.
///
/// The CLI prints the message and may open the verification page; tests
/// capture the info.
pub trait DeviceCodePrompt: Send + Sync {
    fn show(&self, info: &DeviceCodeInfo);
}

/// Device code flow in progress.
#[derive(Clone, Debug)]
pub struct DeviceCodeFlowInfo {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    pub interval: u64,
    pub message: String,
}

impl From<&DeviceCodeFlowInfo> for DeviceCodeInfo {
    fn from(flow: &DeviceCodeFlowInfo) -> Self {
        Self {
            user_code: flow.user_code.clone(),
            verification_uri: flow.verification_uri.clone(),
            message: flow.message.clone(),
        }
    }
}

/// Acquires Graph tokens from the Microsoft identity platform.
///
/// Pending claims from a CAE challenge (see [`AuthStateManager::set_claims_challenge`])
/// are sent as the `claims` parameter of every token request until one
/// succeeds.
pub struct AzureAdProvider {
    config: AzureAdAuthConfig,
    scopes: Vec<String>,
    http_client: reqwest::Client,
    auth_state: Arc<AuthStateManager>,
    prompt: Option<Arc<dyn DeviceCodePrompt>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
    message: String,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
    error_description: Option<String>,
}

impl AzureAdProvider {
    pub fn new(
        config: AzureAdAuthConfig,
        scopes: Vec<String>,
        auth_state: Arc<AuthStateManager>,
    ) -> GraphResult<Self> {
        config.validate()?;
        if scopes.is_empty() {
            return Err(GraphError::Configuration(
                "At least one Graph scope is required".to_string(),
            ));
        }
        Ok(Self {
            config,
            scopes,
            http_client: reqwest::Client::new(),
            auth_state,
            prompt: None,
        })
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn DeviceCodePrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    async fn client_credentials_flow(&self, claims: Option<&str>) -> GraphResult<AuthToken> {
        let token_url = self.config.token_endpoint()?;
        let secret = self.config.client_secret().ok_or_else(|| {
            GraphError::Configuration("client_credentials flow requires a client secret".into())
        })?;
        let scope = self.scope();

        let mut params = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id()?),
            ("client_secret", secret.as_str()),
            ("scope", scope.as_str()),
        ];
        if let Some(claims) = claims {
            params.push(("claims", claims));
        }

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TokenRefreshError::NetworkError {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await.into());
        }

        Self::parse_token(response).await
    }

    async fn device_code_flow(&self, claims: Option<&str>) -> GraphResult<AuthToken> {
        let device_info = self.start_device_code_flow().await?;

        let info = DeviceCodeInfo::from(&device_info);
        self.auth_state.set_device_code_pending(info.clone()).await;
        match &self.prompt {
            Some(prompt) => prompt.show(&info),
            None => log::warn!("{}", info.message),
        }
        log::info!("Device code authentication initiated - awaiting user action");

        self.poll_device_code_token(&device_info, claims).await
    }

    pub async fn start_device_code_flow(&self) -> GraphResult<DeviceCodeFlowInfo> {
        let device_code_url = self.config.device_code_endpoint()?;
        let scope = self.scope();
        let params = [
            ("client_id", self.config.client_id()?),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&device_code_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                GraphError::Authentication(format!("Failed to initiate device code flow: {e}"))
            })?;

        if !response.status().is_success() {
            let error_info = response.json::<ErrorResponse>().await.unwrap_or_default();
            return Err(GraphError::Authentication(format!(
                "Authentication failed: {}",
                friendly_message(&error_info)
            )));
        }

        let device_code: DeviceCodeResponse = response.json().await.map_err(|e| {
            GraphError::Authentication(format!("Failed to parse device code response: {e}"))
        })?;

        Ok(DeviceCodeFlowInfo {
            device_code: device_code.device_code,
            user_code: device_code.user_code,
            verification_uri: device_code.verification_uri,
            expires_in: device_code.expires_in,
            interval: device_code.interval,
            message: device_code.message,
        })
    }

    pub async fn poll_device_code_token(
        &self,
        device_info: &DeviceCodeFlowInfo,
        claims: Option<&str>,
    ) -> GraphResult<AuthToken> {
        let token_url = self.config.token_endpoint()?;
        let mut interval = Duration::from_secs(device_info.interval.max(1));
        let timeout = Duration::from_secs(device_info.expires_in);
        let start = Instant::now();
        let secret = self.config.client_secret();

        loop {
            if start.elapsed() > timeout {
                return Err(TokenRefreshError::DeviceCodeExpired.into());
            }

            tokio::time::sleep(interval).await;

            let mut params = vec![
                ("grant_type", DEVICE_CODE_GRANT),
                ("client_id", self.config.client_id()?),
                ("device_code", device_info.device_code.as_str()),
            ];
            if let Some(secret) = secret.as_deref() {
                params.push(("client_secret", secret));
            }
            if let Some(claims) = claims {
                params.push(("claims", claims));
            }

            let response = self
                .http_client
                .post(&token_url)
                .form(&params)
                .send()
                .await
                .map_err(|e| TokenRefreshError::NetworkError {
                    reason: e.to_string(),
                })?;

            if response.status().is_success() {
                return Self::parse_token(response).await;
            }

            let error_response = response.json::<ErrorResponse>().await.unwrap_or_default();
            match error_response.error.as_str() {
                "authorization_pending" => {
                    log::debug!("Waiting for user to complete authentication");
                }
                "slow_down" => {
                    log::debug!("Polling too frequently, increasing interval");
                    interval += Duration::from_secs(5);
                }
                "expired_token" => return Err(TokenRefreshError::DeviceCodeExpired.into()),
                "access_denied" => return Err(TokenRefreshError::AccessDenied.into()),
                other => {
                    return Err(TokenRefreshError::Rejected {
                        error: other.to_string(),
                        description: error_response
                            .error_description
                            .unwrap_or_else(|| "Unknown error occurred".to_string()),
                    }
                    .into());
                }
            }
        }
    }

    async fn rejection(response: reqwest::Response) -> TokenRefreshError {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return TokenRefreshError::RateLimited {
                retry_after_seconds,
            };
        }
        let error_info = response.json::<ErrorResponse>().await.unwrap_or_default();
        TokenRefreshError::Rejected {
            description: friendly_message(&error_info).to_string(),
            error: error_info.error,
        }
    }

    async fn parse_token(response: reqwest::Response) -> GraphResult<AuthToken> {
        let token_response: TokenResponse = response.json().await.map_err(|e| {
            GraphError::Authentication(format!("Failed to parse token response: {e}"))
        })?;

        Ok(AuthToken {
            token: token_response.access_token,
            token_type: token_response.token_type,
            expires_in_secs: Some(token_response.expires_in),
        })
    }
}

fn friendly_message(error_info: &ErrorResponse) -> &str {
    match error_info.error.as_str() {
        "invalid_client" => {
            "Invalid client configuration. Check the app registration and ensure 'Allow public client flows' is enabled for device code sign-in."
        }
        "invalid_request" => "Invalid authentication request. Check the client ID and tenant ID.",
        "unauthorized_client" => {
            "This application is not authorized for the requested flow. Check the app registration."
        }
        "invalid_scope" => "The requested Graph scopes are not valid for this application.",
        "access_denied" => "Access denied. Ensure you have the necessary permissions.",
        "expired_token" => "Authentication expired. Try again.",
        _ => error_info
            .error_description
            .as_deref()
            .unwrap_or(if error_info.error.is_empty() {
                "unknown_error"
            } else {
                error_info.error.as_str()
            }),
    }
}

#[async_trait]
impl AuthProvider for AzureAdProvider {
    async fn authenticate(&self) -> GraphResult<AuthToken> {
        let claims = self.auth_state.pending_claims().await;
        if claims.is_some() {
            log::info!("Requesting a new token with claims from a CAE challenge");
        }

        let token = match self.config.auth_method {
            AzureAdFlowType::DeviceCode => self.device_code_flow(claims.as_deref()).await?,
            AzureAdFlowType::ClientCredentials => {
                self.client_credentials_flow(claims.as_deref()).await?
            }
        };

        if let Some(claims) = claims {
            self.auth_state.resolve_pending_claims(&claims).await;
        }
        Ok(token)
    }

    fn auth_type(&self) -> AuthType {
        AuthType::AzureAd
    }
}
