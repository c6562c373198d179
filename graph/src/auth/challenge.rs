//! Claims challenges raised by continuous access evaluation.
//!
//! When a CAE-enabled resource revokes a token it answers `401` with a
//! header such as:
//!
//! ```text
//! WWW-Authenticate: Bearer realm="", authorization_uri="https://login.microsoftonline.com/common/oauth2/authorize",
//!     error="insufficient_claims", claims="eyJhY2Nlc3NfdG9rZW4iOnsibmJmIjp7ImVzc2VudGlhbCI6dHJ1ZX19fQ=="
//! ```
//!
//! The decoded `claims` must be presented to the authority on the next token
//! request.

use super::auth_state::AuthStateManager;
use crate::common::{GraphError, GraphResult};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use std::sync::Arc;

const INSUFFICIENT_CLAIMS: &str = "insufficient_claims";

/// Extracts the claims challenge from response headers.
///
/// # Errors
///
/// [`GraphError::ClaimsChallenge`] when no `WWW-Authenticate` header carries
/// `error="insufficient_claims"` together with a `claims` parameter.
pub fn claims_challenge_from_headers(headers: &HeaderMap) -> GraphResult<String> {
    let mut saw_header = false;

    for value in headers.get_all(WWW_AUTHENTICATE) {
        saw_header = true;
        let Ok(value) = value.to_str() else {
            log::debug!("Skipping non-ASCII WWW-Authenticate header");
            continue;
        };

        let params = parse_auth_params(value);
        let error = lookup(&params, "error");
        let claims = lookup(&params, "claims");

        if let (Some(INSUFFICIENT_CLAIMS), Some(claims)) = (error, claims) {
            if claims.is_empty() {
                continue;
            }
            return Ok(decode_claims(claims));
        }
    }

    if saw_header {
        Err(GraphError::ClaimsChallenge(
            "WWW-Authenticate header does not carry an insufficient_claims challenge".to_string(),
        ))
    } else {
        Err(GraphError::ClaimsChallenge(
            "Response has no WWW-Authenticate header".to_string(),
        ))
    }
}

fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

/// Splits a challenge into `(name, value)` pairs, honouring quoted commas.
fn parse_auth_params(header: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in header.chars() {
        match ch {
            _ if escaped => {
                current.push(ch);
                escaped = false;
            }
            '\\' if in_quotes => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);

    segments
        .iter()
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            // "Bearer realm" -> "realm"
            let name = name.split_whitespace().last()?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Base64-decodes `claims` when it holds encoded JSON, otherwise returns it
/// as received.
fn decode_claims(claims: &str) -> String {
    let decoded = [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(claims).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|text| serde_json::from_str::<serde_json::Value>(text).is_ok());

    decoded.unwrap_or_else(|| claims.to_string())
}

/// Reacts to claims challenges surfaced by [`crate::cae::call_with_cae_fallback`].
#[async_trait]
pub trait ChallengeHandler: Send + Sync {
    /// Starts re-authentication for `scopes` presenting `claims`.
    async fn challenge_user(&self, scopes: &[String], claims: &str) -> GraphResult<()>;

    /// Receives failures raised while extracting or handling a challenge.
    async fn handle_exception(&self, error: &GraphError);
}

/// Challenge handler backed by the session's [`AuthStateManager`].
///
/// The claims become pending on the shared state and every cached token is
/// dropped; the next token request re-authenticates with them.
pub struct ReauthenticationHandler {
    auth_state: Arc<AuthStateManager>,
}

impl ReauthenticationHandler {
    pub fn new(auth_state: Arc<AuthStateManager>) -> Self {
        Self { auth_state }
    }
}

#[async_trait]
impl ChallengeHandler for ReauthenticationHandler {
    async fn challenge_user(&self, scopes: &[String], claims: &str) -> GraphResult<()> {
        if claims.trim().is_empty() {
            return Err(GraphError::ClaimsChallenge(
                "Claims challenge is empty".to_string(),
            ));
        }

        log::warn!(
            "Access token rejected by continuous access evaluation; re-authentication required for scopes [{}]",
            scopes.join(", ")
        );
        self.auth_state.set_claims_challenge(claims.to_string()).await;
        Ok(())
    }

    async fn handle_exception(&self, error: &GraphError) {
        log::error!("Failed to handle claims challenge: {error}");
        self.auth_state
            .set_failed(format!("Re-authentication required: {error}"))
            .await;
    }
}
