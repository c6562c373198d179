use claims::*;
use nimbus::config::{ConfigValidationError, load_config};
use nimbus_graph::MaxRows;
use nimbus_graph::auth::AzureAdFlowType;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

// Helper module for writing configuration files
mod config_helpers {
    use super::*;

    pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }
}

use config_helpers::*;

#[test]
fn test_full_config_is_loaded() {
    let (_dir, path) = write_config(
        r#"
[graph]
base_url = "https://graph.microsoft.us/v1.0"
scopes = ["User.Read", "User.ReadBasic.All"]
max_rows = 25
requests_per_second = 5
timeout_secs = 20

[azure_ad]
auth_method = "client_credentials"
tenant_id = "contoso.onmicrosoft.com"
client_id = "11111111-2222-3333-4444-555555555555"
client_secret = "s3cret"
open_browser = false

[logging]
level = "debug"
file = "nimbus-test.log"
"#,
    );

    let config = assert_ok!(load_config(Some(&path)).into_result());

    assert_eq!(config.graph().base_url, "https://graph.microsoft.us/v1.0");
    assert_eq!(config.graph().scopes.len(), 2);
    assert_eq!(config.graph().max_rows, MaxRows::AtMost(25));
    assert_eq!(
        config.azure_ad().auth_method,
        AzureAdFlowType::ClientCredentials
    );
    assert_eq!(config.logging().level(), "debug");
    assert_eq!(config.logging().file(), Some("nimbus-test.log"));
    assert_ok!(config.validate(false));
}

#[test]
fn test_unbounded_sentinel_and_defaults() {
    let (_dir, path) = write_config(
        r#"
[graph]
max_rows = -1
"#,
    );

    let config = assert_ok!(load_config(Some(&path)).into_result());

    assert_eq!(config.graph().max_rows, MaxRows::Unbounded);
    assert_eq!(config.graph().base_url, "https://graph.microsoft.com/v1.0");
    assert_eq!(config.logging().level(), "info");
    assert_eq!(config.azure_ad().auth_method, AzureAdFlowType::DeviceCode);
}

#[test]
fn test_missing_azure_ad_settings_are_reported() {
    let (_dir, path) = write_config(
        r#"
[logging]
level = "chatty"
"#,
    );

    let config = assert_ok!(load_config(Some(&path)).into_result());
    let errors = assert_err!(config.validate(false));

    assert!(errors.contains(&ConfigValidationError::MissingTenantId));
    assert!(errors.contains(&ConfigValidationError::MissingClientId));
    assert!(errors.contains(&ConfigValidationError::LogLevel {
        configured: "chatty".to_string()
    }));
}

#[test]
fn test_static_token_skips_azure_ad_checks() {
    let (_dir, path) = write_config("[graph]\nrequests_per_second = 0\n");

    let config = assert_ok!(load_config(Some(&path)).into_result());
    let errors = assert_err!(config.validate(true));

    assert_eq!(
        errors,
        vec![ConfigValidationError::RequestsPerSecond { configured: 0 }]
    );
}

#[test]
fn test_explicit_missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_config(Some(&dir.path().join("absent.toml"))).into_result();
    assert_err!(result);
}

#[test]
fn test_malformed_value_is_a_deserialize_error() {
    let (_dir, path) = write_config("[graph]\ntimeout_secs = \"soon\"\n");
    let result = load_config(Some(&path)).into_result();
    let message = assert_err!(result);
    assert!(message.contains("deserialize"));
}
