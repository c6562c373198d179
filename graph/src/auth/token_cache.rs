use super::auth_state::AuthStateManager;
use super::provider::{AuthProvider, AuthToken};
use super::types::{AuthType, CachedToken};
use crate::common::GraphResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct TokenCache {
    cache: Arc<RwLock<HashMap<String, CachedToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|token| !token.is_expired())
            .map(|token| token.token.clone())
    }

    /// Cached token for `key` unless it is inside the refresh window.
    pub async fn get_fresh(&self, key: &str) -> Option<CachedToken> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|token| !token.needs_refresh())
            .cloned()
    }

    pub async fn set(&self, key: String, token: CachedToken) {
        let mut cache = self.cache.write().await;
        cache.insert(key, token);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    pub async fn needs_refresh(&self, key: &str) -> bool {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .map(|token| token.needs_refresh())
            .unwrap_or(true)
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a provider with the session's token cache.
///
/// Tokens are reused until five minutes before expiry. A claims challenge
/// recorded on the [`AuthStateManager`] empties the cache, forcing the
/// wrapped provider to run again.
pub struct CachingAuthProvider {
    inner: Arc<dyn AuthProvider>,
    auth_state: Arc<AuthStateManager>,
    cache_key: String,
}

impl CachingAuthProvider {
    pub fn new(
        inner: Arc<dyn AuthProvider>,
        auth_state: Arc<AuthStateManager>,
        cache_key: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            auth_state,
            cache_key: cache_key.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for CachingAuthProvider {
    async fn authenticate(&self) -> GraphResult<AuthToken> {
        let cache = self.auth_state.get_token_cache();
        if let Some(cached) = cache.get_fresh(&self.cache_key).await {
            log::debug!("Using cached token for '{}'", self.cache_key);
            return Ok(AuthToken {
                token: cached.token,
                token_type: cached.token_type,
                expires_in_secs: Some(
                    cached
                        .expires_at
                        .saturating_duration_since(std::time::Instant::now())
                        .as_secs(),
                ),
            });
        }

        let token = match self.inner.authenticate().await {
            Ok(token) => token,
            Err(e) => {
                self.auth_state.set_failed(e.to_string()).await;
                return Err(e);
            }
        };

        let lifetime = token.expires_in_secs.map(Duration::from_secs);
        if let Some(lifetime) = lifetime.filter(|_| self.inner.requires_refresh()) {
            cache
                .set(
                    self.cache_key.clone(),
                    CachedToken::new(token.token.clone(), lifetime, token.token_type.clone()),
                )
                .await;
        }
        self.auth_state.set_authenticated(lifetime).await;

        Ok(token)
    }

    fn auth_type(&self) -> AuthType {
        self.inner.auth_type()
    }

    fn requires_refresh(&self) -> bool {
        self.inner.requires_refresh()
    }
}
