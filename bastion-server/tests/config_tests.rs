use bastion_server::{CaptureConfig, ConfigError, ServerConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;

#[test]
fn default_has_no_ack_timeout() {
    let config = ServerConfig::default();
    assert_eq!(config.capture.passive_ack_timeout_ms, None);
    assert_eq!(config.capture.passive_ack_timeout(), None);
}

#[test]
fn empty_toml_uses_defaults() {
    assert_eq!(ServerConfig::from_toml_str("").unwrap(), ServerConfig::default());
}

#[test]
fn parses_ack_timeout() {
    let config = ServerConfig::from_toml_str(
        r#"
        [capture]
        passive_ack_timeout_ms = 2500
        "#,
    )
    .unwrap();
    assert_eq!(
        config.capture,
        CaptureConfig {
            passive_ack_timeout_ms: Some(2500)
        }
    );
    assert_eq!(
        config.capture.passive_ack_timeout(),
        Some(Duration::from_millis(2500))
    );
}

#[test]
fn rejects_wrong_types() {
    let err = ServerConfig::from_toml_str("[capture]\npassive_ack_timeout_ms = \"soon\"\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[capture]\npassive_ack_timeout_ms = 10").unwrap();
    let config = ServerConfig::load(file.path()).unwrap();
    assert_eq!(config.capture.passive_ack_timeout_ms, Some(10));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match ServerConfig::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
}
