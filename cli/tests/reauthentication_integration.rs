use claims::*;
use nimbus::commands::{Command, run_with_reauthentication};
use nimbus::config::{AppConfig, load_config};
use nimbus::error::AppError;
use nimbus::session::build_session;
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "contoso.onmicrosoft.com";
// base64 of {"access_token":{}}
const ENCODED_CLAIMS: &str = "eyJhY2Nlc3NfdG9rZW4iOnt9fQ==";

// Helper module for a mock Graph and token endpoint
mod session_helpers {
    use super::*;

    pub fn config_for(server: &MockServer) -> (TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[graph]
base_url = "{uri}/v1.0"
requests_per_second = 1000

[azure_ad]
auth_method = "client_credentials"
tenant_id = "{TENANT}"
client_id = "app-client-id"
client_secret = "app-client-secret"
authority_host = "{uri}"
open_browser = false
"#,
            uri = server.uri()
        )
        .unwrap();

        let config = load_config(Some(&path)).into_result().unwrap();
        (dir, config)
    }

    pub fn claims_challenge() -> ResponseTemplate {
        ResponseTemplate::new(401)
            .insert_header(
                "WWW-Authenticate",
                format!(r#"Bearer realm="", error="insufficient_claims", claims="{ENCODED_CLAIMS}""#)
                    .as_str(),
            )
            .set_body_json(json!({
                "error": {
                    "code": "InvalidAuthenticationToken",
                    "message": "Continuous access evaluation resulted in claims challenge with result: InteractionRequired and code: TokenIssuedBeforeRevocationTimestamp"
                }
            }))
    }

    pub fn token_body(token: &str) -> serde_json::Value {
        json!({ "token_type": "Bearer", "expires_in": 3599, "access_token": token })
    }

    pub async fn mount_token_endpoint(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .and(body_string_contains("claims="))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh-token")))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("first-token")))
            .mount(server)
            .await;
    }
}

use session_helpers::*;

#[tokio::test]
async fn test_command_is_rerun_with_claims_after_challenge() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .and(header("authorization", "Bearer first-token"))
        .respond_with(claims_challenge())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "displayName": "Adele Vance"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = config_for(&server);
    let session = build_session(&config, None).unwrap();

    assert_ok!(run_with_reauthentication(&session, &Command::Me, &CancellationToken::new()).await);
}

#[tokio::test]
async fn test_second_challenge_is_unresolved() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .respond_with(claims_challenge())
        .expect(2)
        .mount(&server)
        .await;

    let (_dir, config) = config_for(&server);
    let session = build_session(&config, None).unwrap();

    let result = run_with_reauthentication(&session, &Command::Me, &CancellationToken::new()).await;
    assert!(matches!(result, Err(AppError::ChallengeUnresolved(_))));
}

#[tokio::test]
async fn test_static_token_is_not_rerun() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .and(header("authorization", "Bearer supplied-token"))
        .respond_with(claims_challenge())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, config) = config_for(&server);
    let session = build_session(&config, Some("supplied-token".to_string())).unwrap();

    let result = run_with_reauthentication(&session, &Command::Me, &CancellationToken::new()).await;
    match result {
        Err(AppError::ChallengeUnresolved(message)) => assert!(message.contains("new token")),
        other => panic!("unexpected result: {other:?}"),
    }
}
