use super::token_cache::TokenCache;
use super::types::DeviceCodeInfo;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Where the signed-in session currently stands.
#[derive(Clone, Debug, Default)]
pub enum AuthenticationState {
    #[default]
    NotAuthenticated,
    /// Device code sign-in started and is waiting on the user
    AwaitingDeviceCode {
        info: DeviceCodeInfo,
        started_at: Instant,
    },
    Authenticated {
        /// `None` for tokens without a known lifetime
        expires_at: Option<Instant>,
    },
    /// A resource rejected the token with a claims challenge; the next token
    /// request must carry `claims`
    ChallengeRequired { claims: String },
    Failed(String),
}

#[derive(Default)]
struct AuthState {
    authentication_state: AuthenticationState,
    pending_claims: Option<String>,
}

/// Shared authentication state for one Graph session.
///
/// Holds the session status, the token cache, and any claims challenge that
/// still has to be presented to the authority. Providers and challenge
/// handlers share one manager through an `Arc`.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::auth::AuthStateManager;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let auth_state = Arc::new(AuthStateManager::new());
///
/// auth_state
///     .set_claims_challenge(r#"{"access_token":{"nbf":{"essential":true,"value":"1700000000"}}}"#.to_string())
///     .await;
/// assert!(auth_state.has_pending_claims().await);
/// # }
/// ```
pub struct AuthStateManager {
    inner: Arc<RwLock<AuthState>>,
    token_cache: TokenCache,
}

impl AuthStateManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AuthState::default())),
            token_cache: TokenCache::new(),
        }
    }

    pub async fn get_state(&self) -> AuthenticationState {
        self.inner.read().await.authentication_state.clone()
    }

    pub async fn set_device_code_pending(&self, info: DeviceCodeInfo) {
        let mut state = self.inner.write().await;
        state.authentication_state = AuthenticationState::AwaitingDeviceCode {
            info,
            started_at: Instant::now(),
        };
    }

    pub async fn set_authenticated(&self, expires_in: Option<Duration>) {
        let mut state = self.inner.write().await;
        state.authentication_state = AuthenticationState::Authenticated {
            expires_at: expires_in.map(|d| Instant::now() + d),
        };
    }

    pub async fn set_failed(&self, error: String) {
        let mut state = self.inner.write().await;
        state.authentication_state = AuthenticationState::Failed(error);
    }

    /// Records a claims challenge and drops every cached token so the next
    /// request goes back to the authority.
    pub async fn set_claims_challenge(&self, claims: String) {
        {
            let mut state = self.inner.write().await;
            state.authentication_state = AuthenticationState::ChallengeRequired {
                claims: claims.clone(),
            };
            state.pending_claims = Some(claims);
        }
        self.token_cache.clear().await;
    }

    pub async fn has_pending_claims(&self) -> bool {
        self.inner.read().await.pending_claims.is_some()
    }

    /// Claims waiting to be sent to the authority.
    pub async fn pending_claims(&self) -> Option<String> {
        self.inner.read().await.pending_claims.clone()
    }

    /// Forgets `sent` once a token was issued for it. A newer challenge
    /// recorded in the meantime stays pending.
    pub async fn resolve_pending_claims(&self, sent: &str) {
        let mut state = self.inner.write().await;
        if state.pending_claims.as_deref() == Some(sent) {
            state.pending_claims = None;
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        match &self.inner.read().await.authentication_state {
            AuthenticationState::Authenticated { expires_at } => {
                expires_at.is_none_or(|at| Instant::now() < at)
            }
            _ => false,
        }
    }

    pub async fn logout(&self) {
        {
            let mut state = self.inner.write().await;
            state.authentication_state = AuthenticationState::NotAuthenticated;
            state.pending_claims = None;
        }
        self.token_cache.clear().await;
    }

    pub fn get_token_cache(&self) -> &TokenCache {
        &self.token_cache
    }
}

impl Default for AuthStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::CachedToken;

    #[tokio::test]
    async fn test_claims_challenge_clears_cache_until_resolved() {
        let manager = AuthStateManager::new();
        manager
            .get_token_cache()
            .set(
                "scope".to_string(),
                CachedToken::new("t".into(), Duration::from_secs(3600), "Bearer".into()),
            )
            .await;

        manager.set_claims_challenge("{\"a\":1}".to_string()).await;

        assert!(manager.get_token_cache().get("scope").await.is_none());
        assert!(matches!(
            manager.get_state().await,
            AuthenticationState::ChallengeRequired { .. }
        ));
        assert_eq!(
            manager.pending_claims().await.as_deref(),
            Some("{\"a\":1}")
        );

        manager.resolve_pending_claims("{\"b\":2}").await;
        assert!(manager.has_pending_claims().await);
        manager.resolve_pending_claims("{\"a\":1}").await;
        assert!(!manager.has_pending_claims().await);
    }

    #[tokio::test]
    async fn test_authenticated_without_lifetime() {
        let manager = AuthStateManager::new();
        assert!(!manager.is_authenticated().await);

        manager.set_authenticated(None).await;
        assert!(manager.is_authenticated().await);

        manager.logout().await;
        assert!(!manager.is_authenticated().await);
    }
}
