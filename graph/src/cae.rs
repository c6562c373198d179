//! Continuous access evaluation fallback for single Graph calls.
//!
//! A call that fails with a CAE claims challenge is not retried. The
//! challenge is handed to a [`ChallengeHandler`] and the caller receives
//! [`CaeOutcome::ChallengeIssued`], telling it to run the call again once the
//! user has re-authenticated.

use crate::auth::challenge::{ChallengeHandler, claims_challenge_from_headers};
use crate::common::{GraphError, GraphResult};
use std::future::Future;
use std::sync::Arc;

/// Result of a call made through [`call_with_cae_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum CaeOutcome<T> {
    /// The call succeeded.
    Completed(T),
    /// The call hit a claims challenge and re-authentication was requested.
    ChallengeIssued,
    /// The call hit a claims challenge that could not be handled; the
    /// failure went to [`ChallengeHandler::handle_exception`].
    ChallengeFailed,
}

impl<T> CaeOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// True for both challenge variants.
    pub fn is_challenge(&self) -> bool {
        !self.is_completed()
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::ChallengeIssued | Self::ChallengeFailed => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CaeOutcome<U> {
        match self {
            Self::Completed(value) => CaeOutcome::Completed(f(value)),
            Self::ChallengeIssued => CaeOutcome::ChallengeIssued,
            Self::ChallengeFailed => CaeOutcome::ChallengeFailed,
        }
    }
}

impl<T: Default> CaeOutcome<T> {
    /// The value on success, `T::default()` after a challenge.
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

/// Runs `operation` once, turning a CAE claims challenge into a
/// re-authentication request.
///
/// - success: [`CaeOutcome::Completed`] with the value unchanged
/// - claims challenge: the claims are extracted from the error's response
///   headers and passed to `handler.challenge_user` with `scopes`; returns
///   [`CaeOutcome::ChallengeIssued`]
/// - extraction or handler failure: forwarded to `handler.handle_exception`;
///   returns [`CaeOutcome::ChallengeFailed`]
/// - any other error: returned as is
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::cae::{CaeOutcome, call_with_cae_fallback};
/// use nimbus_graph::auth::ChallengeHandler;
/// use nimbus_graph::graph_client::GraphClient;
/// use nimbus_graph::model::User;
///
/// # async fn example(client: GraphClient, handler: &dyn ChallengeHandler) -> nimbus_graph::common::GraphResult<()> {
/// let scopes = vec!["User.Read".to_string()];
/// match call_with_cae_fallback(handler, &scopes, || client.get_json::<User>("/me")).await? {
///     CaeOutcome::Completed(user) => println!("{:?}", user.display_name),
///     _ => println!("sign in again and retry"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn call_with_cae_fallback<T, F, Fut>(
    handler: &dyn ChallengeHandler,
    scopes: &[String],
    operation: F,
) -> GraphResult<CaeOutcome<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = GraphResult<T>>,
{
    let error = match operation().await {
        Ok(value) => return Ok(CaeOutcome::Completed(value)),
        Err(error) if error.is_claims_challenge() => error,
        Err(error) => return Err(error),
    };

    log::warn!("Graph call rejected with a claims challenge: {error}");

    let handled = match error.response_headers() {
        Some(headers) => match claims_challenge_from_headers(headers) {
            Ok(claims) => handler.challenge_user(scopes, &claims).await,
            Err(extract_error) => Err(extract_error),
        },
        None => Err(GraphError::ClaimsChallenge(
            "Claims challenge error has no response headers".to_string(),
        )),
    };

    match handled {
        Ok(()) => Ok(CaeOutcome::ChallengeIssued),
        Err(secondary) => {
            handler.handle_exception(&secondary).await;
            Ok(CaeOutcome::ChallengeFailed)
        }
    }
}

/// A challenge handler bound to the scopes it re-authenticates for.
#[derive(Clone)]
pub struct CaeGuard {
    handler: Arc<dyn ChallengeHandler>,
    scopes: Vec<String>,
}

impl CaeGuard {
    pub fn new(handler: Arc<dyn ChallengeHandler>, scopes: Vec<String>) -> Self {
        Self { handler, scopes }
    }

    pub async fn call<T, F, Fut>(&self, operation: F) -> GraphResult<CaeOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GraphResult<T>>,
    {
        call_with_cae_fallback(self.handler.as_ref(), &self.scopes, operation).await
    }
}

impl std::fmt::Debug for CaeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaeGuard")
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
