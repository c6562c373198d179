use super::types::AuthType;
use crate::common::GraphResult;
use async_trait::async_trait;

/// Access token for Microsoft Graph.
#[derive(Clone, Debug)]
pub struct AuthToken {
    /// The raw access token
    pub token: String,
    /// The type of token (e.g., "Bearer")
    pub token_type: String,
    /// Lifetime in seconds from issuance, when the authority reported one
    pub expires_in_secs: Option<u64>,
}

/// Source of bearer tokens for Graph calls.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::auth::provider::{AuthProvider, AuthToken};
/// use nimbus_graph::auth::types::AuthType;
/// use nimbus_graph::common::GraphResult;
/// use async_trait::async_trait;
///
/// struct CliTokenProvider;
///
/// #[async_trait]
/// impl AuthProvider for CliTokenProvider {
///     async fn authenticate(&self) -> GraphResult<AuthToken> {
///         Ok(AuthToken {
///             token: "eyJ0eXAi...".to_string(),
///             token_type: "Bearer".to_string(),
///             expires_in_secs: Some(3600),
///         })
///     }
///
///     fn auth_type(&self) -> AuthType {
///         AuthType::StaticToken
///     }
/// }
/// ```
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Acquires a token, running the provider's authentication flow.
    ///
    /// # Errors
    ///
    /// Returns [`crate::common::GraphError`] when the flow fails or is
    /// misconfigured.
    async fn authenticate(&self) -> GraphResult<AuthToken>;

    /// Returns the authentication type used by this provider.
    fn auth_type(&self) -> AuthType;

    /// Whether tokens from this provider expire and should be cached with
    /// their lifetime.
    fn requires_refresh(&self) -> bool {
        true
    }
}

/// Provider handing out a token acquired elsewhere, e.g. with
/// `az account get-access-token --resource-type ms-graph`.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn authenticate(&self) -> GraphResult<AuthToken> {
        Ok(AuthToken {
            token: self.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in_secs: None,
        })
    }

    fn auth_type(&self) -> AuthType {
        AuthType::StaticToken
    }

    fn requires_refresh(&self) -> bool {
        false
    }
}
