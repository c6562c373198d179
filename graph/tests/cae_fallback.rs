use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use claims::*;
use nimbus_graph::auth::ChallengeHandler;
use nimbus_graph::cae::{CaeOutcome, call_with_cae_fallback};
use nimbus_graph::common::{CAE_CLAIMS_CHALLENGE_MESSAGE, GraphError, GraphResult};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, WWW_AUTHENTICATE};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

const CLAIMS_JSON: &str =
    r#"{"access_token":{"nbf":{"essential":true,"value":"1604106651"}}}"#;

// Helper module for challenge handler doubles and error fixtures
mod cae_helpers {
    use super::*;

    #[derive(Default)]
    pub struct RecordingHandler {
        pub challenges: AtomicU32,
        pub exceptions: AtomicU32,
        pub last_scopes: Mutex<Vec<String>>,
        pub last_claims: Mutex<Option<String>>,
        pub fail_challenge: bool,
    }

    #[async_trait]
    impl ChallengeHandler for RecordingHandler {
        async fn challenge_user(&self, scopes: &[String], claims: &str) -> GraphResult<()> {
            self.challenges.fetch_add(1, Ordering::SeqCst);
            *self.last_scopes.lock().unwrap() = scopes.to_vec();
            *self.last_claims.lock().unwrap() = Some(claims.to_string());
            if self.fail_challenge {
                Err(GraphError::Authentication("interactive sign-in unavailable".into()))
            } else {
                Ok(())
            }
        }

        async fn handle_exception(&self, _error: &GraphError) {
            self.exceptions.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn scopes() -> Vec<String> {
        vec!["User.Read".to_string(), "User.ReadBasic.All".to_string()]
    }

    pub fn claims_challenge_error(with_header: bool) -> GraphError {
        let mut headers = HeaderMap::new();
        if with_header {
            let value = format!(
                r#"Bearer realm="", authorization_uri="https://login.microsoftonline.com/common/oauth2/authorize", error="insufficient_claims", claims="{}""#,
                STANDARD.encode(CLAIMS_JSON)
            );
            headers.insert(WWW_AUTHENTICATE, HeaderValue::from_str(&value).unwrap());
        }
        GraphError::service(
            StatusCode::UNAUTHORIZED,
            "InvalidAuthenticationToken",
            format!(
                "{CAE_CLAIMS_CHALLENGE_MESSAGE} with result: InteractionRequired and code: TokenIssuedBeforeRevocationTimestamp"
            ),
            headers,
        )
    }
}

use cae_helpers::*;

#[tokio::test]
async fn test_success_passes_value_through() {
    let handler = RecordingHandler::default();
    let calls = AtomicU32::new(0);

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, GraphError>(42)
    })
    .await;

    assert_ok_eq!(outcome, CaeOutcome::Completed(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.challenges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_claims_challenge_invokes_handler_once_without_retry() {
    let handler = RecordingHandler::default();
    let calls = AtomicU32::new(0);

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<String, _>(claims_challenge_error(true))
    })
    .await;

    assert_ok_eq!(outcome, CaeOutcome::ChallengeIssued);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.challenges.load(Ordering::SeqCst), 1);
    assert_eq!(handler.exceptions.load(Ordering::SeqCst), 0);
    assert_eq!(*handler.last_scopes.lock().unwrap(), scopes());
    assert_eq!(
        handler.last_claims.lock().unwrap().as_deref(),
        Some(CLAIMS_JSON)
    );
}

#[tokio::test]
async fn test_missing_challenge_header_goes_to_exception_hook() {
    let handler = RecordingHandler::default();

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        Err::<Vec<u8>, _>(claims_challenge_error(false))
    })
    .await;

    let outcome = assert_ok!(outcome);
    assert_eq!(outcome, CaeOutcome::ChallengeFailed);
    assert_eq!(outcome.unwrap_or_default(), Vec::<u8>::new());
    assert_eq!(handler.challenges.load(Ordering::SeqCst), 0);
    assert_eq!(handler.exceptions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_failure_goes_to_exception_hook() {
    let handler = RecordingHandler {
        fail_challenge: true,
        ..Default::default()
    };

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        Err::<(), _>(claims_challenge_error(true))
    })
    .await;

    assert_ok_eq!(outcome, CaeOutcome::ChallengeFailed);
    assert_eq!(handler.challenges.load(Ordering::SeqCst), 1);
    assert_eq!(handler.exceptions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_service_errors_propagate_unchanged() {
    let handler = RecordingHandler::default();

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        Err::<(), _>(GraphError::service(
            StatusCode::FORBIDDEN,
            "Authorization_RequestDenied",
            "Insufficient privileges to complete the operation.",
            HeaderMap::new(),
        ))
    })
    .await;

    let error = assert_err!(outcome);
    assert_eq!(error.code(), Some("Authorization_RequestDenied"));
    assert!(error.to_string().contains("Insufficient privileges"));
    assert_eq!(handler.challenges.load(Ordering::SeqCst), 0);
    assert_eq!(handler.exceptions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_service_errors_propagate_unchanged() {
    let handler = RecordingHandler::default();

    let outcome = call_with_cae_fallback(&handler, &scopes(), || async {
        Err::<(), _>(GraphError::Cancelled)
    })
    .await;

    assert_matches!(outcome, Err(GraphError::Cancelled));
    assert_eq!(handler.exceptions.load(Ordering::SeqCst), 0);
}
