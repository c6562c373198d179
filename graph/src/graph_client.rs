//! HTTP client for the Microsoft Graph REST API.

pub mod config;
pub mod page;
pub mod query;

pub use config::{DEFAULT_GRAPH_BASE_URL, DEFAULT_GRAPH_SCOPE, DEFAULT_MAX_ROWS, GraphConfig};
pub use page::{GraphNextPage, GraphPage};
pub use query::CollectionQuery;

use crate::auth::AuthProvider;
use crate::common::{GraphError, GraphResult, RateLimiter};
use crate::model::{ODataCollection, ODataError};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const CLIENT_REQUEST_ID: &str = "client-request-id";

/// Authenticated Graph client.
///
/// Cloning is cheap; clones share the HTTP connection pool, token provider
/// and request budget.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::auth::StaticTokenProvider;
/// use nimbus_graph::graph_client::{GraphClient, GraphConfig};
/// use nimbus_graph::model::User;
/// use std::sync::Arc;
///
/// # async fn example() -> nimbus_graph::common::GraphResult<()> {
/// let client = GraphClient::new(
///     &GraphConfig::default(),
///     Arc::new(StaticTokenProvider::new("eyJ0eXAi...")),
/// )?;
/// let me: User = client.get_json("/me").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_provider: Arc<dyn AuthProvider>,
    rate_limiter: RateLimiter,
}

impl GraphClient {
    pub fn new(config: &GraphConfig, auth_provider: Arc<dyn AuthProvider>) -> GraphResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let rate_limiter = config.rate_limiter().build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                auth_provider,
                rate_limiter,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URLs (next links) pass through; paths are joined to the base URL.
    pub fn resolve_url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("https://") || path_or_url.starts_with("http://") {
            path_or_url.to_string()
        } else {
            format!(
                "{}/{}",
                self.inner.base_url,
                path_or_url.trim_start_matches('/')
            )
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path_or_url: &str) -> GraphResult<T> {
        let response = self.send_get(path_or_url).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_bytes(&self, path_or_url: &str) -> GraphResult<Vec<u8>> {
        let response = self.send_get(path_or_url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetches one page of a collection as a [`GraphPage`] cursor.
    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        path_or_url: &str,
    ) -> GraphResult<GraphPage<T>> {
        let collection: ODataCollection<T> = self.get_json(path_or_url).await?;
        log::debug!(
            "Received page of {} item(s), more pages: {}",
            collection.value.len(),
            collection.next_link.is_some()
        );
        Ok(GraphPage::from_collection(self, collection))
    }

    async fn send_get(&self, path_or_url: &str) -> GraphResult<Response> {
        let url = self.resolve_url(path_or_url);
        self.inner.rate_limiter.wait_until_ready().await;

        let token = self.inner.auth_provider.authenticate().await?;
        let request_id = uuid::Uuid::new_v4().to_string();
        log::debug!("GET {url} (client-request-id {request_id})");

        let response = self
            .inner
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token.token))
            .header(CLIENT_REQUEST_ID, &request_id)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn error_from_response(response: Response) -> GraphError {
        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return GraphError::RateLimited {
                retry_after_secs: retry_after_secs(&headers).unwrap_or(1),
            };
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ODataError>(&body) {
            Ok(odata) => (odata.error.code, odata.error.message),
            Err(_) => (
                status.canonical_reason().unwrap_or("unknown").to_string(),
                if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
            ),
        };

        log::debug!("Graph request failed with {status}: {code}");
        GraphError::service(status, code, message, headers)
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client(base_url: &str) -> GraphClient {
        let config = GraphConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        GraphClient::new(&config, Arc::new(StaticTokenProvider::new("token"))).unwrap()
    }

    #[test]
    fn test_resolve_url() {
        let client = client("https://graph.microsoft.com/v1.0/");
        assert_eq!(
            client.resolve_url("/me/memberOf"),
            "https://graph.microsoft.com/v1.0/me/memberOf"
        );
        assert_eq!(
            client.resolve_url("users?$top=5"),
            "https://graph.microsoft.com/v1.0/users?$top=5"
        );
        let next = "https://graph.microsoft.com/v1.0/users?$skiptoken=X";
        assert_eq!(client.resolve_url(next), next);
    }

    #[test]
    fn test_zero_request_rate_is_rejected() {
        let config = GraphConfig {
            requests_per_second: 0,
            ..Default::default()
        };
        let result = GraphClient::new(&config, Arc::new(StaticTokenProvider::new("token")));
        assert!(matches!(result, Err(GraphError::Configuration(_))));
    }
}
