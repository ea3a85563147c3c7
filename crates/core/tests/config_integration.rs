//! satprobe.toml 통합 설정 테스트
//!
//! - satprobe.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 / 잘못된 형식 에러 테스트

use satprobe_core::config::SatprobeConfig;
use satprobe_core::error::{ConfigError, SatprobeError};

// =============================================================================
// satprobe.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../satprobe.toml.example");
    let config = SatprobeConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.server.url, "https://satellite.example.com");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../satprobe.toml.example");
    let config = SatprobeConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_leaves_ldap_fixtures_unconfigured() {
    let content = include_str!("../../../satprobe.toml.example");
    let config = SatprobeConfig::parse(content).expect("should parse");

    assert!(!config.ldap.is_configured());
    assert!(!config.ipa.is_configured());
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../satprobe.toml.example");
    let example = SatprobeConfig::parse(content).expect("should parse");
    let defaults = SatprobeConfig::default();

    assert_eq!(example.server.url, defaults.server.url);
    assert_eq!(example.server.verify_tls, defaults.server.verify_tls);
    assert_eq!(
        example.server.request_timeout_secs,
        defaults.server.request_timeout_secs
    );
    assert_eq!(
        example.server.task_timeout_secs,
        defaults.server.task_timeout_secs
    );
    assert_eq!(
        example.server.task_poll_interval_ms,
        defaults.server.task_poll_interval_ms
    );
    assert_eq!(example.fixtures.gpg_key_file, defaults.fixtures.gpg_key_file);
    assert_eq!(
        example.fixtures.discovery_repo_name,
        defaults.fixtures.discovery_repo_name
    );
    assert_eq!(example.naming.seed, defaults.naming.seed);
    assert_eq!(
        example.naming.default_length,
        defaults.naming.default_length
    );
}

#[test]
fn example_gpg_key_fixture_is_armored() {
    let key = include_str!("../../../data/valid_gpg_key.txt");
    assert!(key.starts_with("-----BEGIN PGP PUBLIC KEY BLOCK-----"));
    assert!(key.trim_end().ends_with("-----END PGP PUBLIC KEY BLOCK-----"));
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_server_only() {
    let toml = r#"
[server]
url = "http://localhost:3000"
request_timeout_secs = 5
"#;
    let config = SatprobeConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.server.url, "http://localhost:3000");
    assert_eq!(config.server.request_timeout_secs, 5);
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.fixtures.discovery_repo_name, "fakerepo01");
}

#[test]
fn partial_config_naming_seed() {
    let toml = r#"
[naming]
seed = 7
"#;
    let config = SatprobeConfig::parse(toml).expect("should parse");
    assert_eq!(config.naming.seed, Some(7));
    assert_eq!(config.naming.default_length, 10);
}

#[test]
fn partial_config_ipa_only() {
    let toml = r#"
[ipa]
hostname = "ipa.example.com"
username = "uid=admin,cn=users,cn=accounts,dc=example,dc=com"
password = "changeme"
base_dn = "dc=example,dc=com"
group_base_dn = "cn=groups,cn=accounts,dc=example,dc=com"
"#;
    let config = SatprobeConfig::parse(toml).expect("should parse");
    assert!(config.ipa.is_configured());
    assert!(!config.ldap.is_configured());
}

#[test]
fn unknown_field_type_is_parse_error() {
    let toml = r#"
[server]
request_timeout_secs = "sixty"
"#;
    let err = SatprobeConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        SatprobeError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_missing_path_is_file_not_found() {
    let err = SatprobeConfig::from_file("/nonexistent/satprobe.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SatprobeError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn from_file_reads_tempfile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("satprobe.toml");
    std::fs::write(
        &path,
        "[server]\nurl = \"https://sat.lab.example.com\"\nverify_tls = false\n",
    )
    .expect("write");

    let config = SatprobeConfig::from_file(&path).await.expect("should load");
    assert_eq!(config.server.url, "https://sat.lab.example.com");
    assert!(!config.server.verify_tls);
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("satprobe.toml");
    std::fs::write(&path, "[server]\ntask_timeout_secs = 0\n").expect("write");

    let err = SatprobeConfig::from_file(&path).await.unwrap_err();
    assert!(err.to_string().contains("server.task_timeout_secs"));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("SATPROBE_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SATPROBE_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = SatprobeConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SATPROBE_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("SATPROBE_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let original = std::env::var("SATPROBE_SERVER_TASK_POLL_INTERVAL_MS").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SATPROBE_SERVER_TASK_POLL_INTERVAL_MS", "250");
    }

    let mut config = SatprobeConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.server.task_poll_interval_ms;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SATPROBE_SERVER_TASK_POLL_INTERVAL_MS", val),
            None => std::env::remove_var("SATPROBE_SERVER_TASK_POLL_INTERVAL_MS"),
        }
    }

    assert_eq!(result, 250);
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let original = std::env::var("SATPROBE_SERVER_VERIFY_TLS").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SATPROBE_SERVER_VERIFY_TLS", "false");
    }

    let mut config = SatprobeConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.server.verify_tls;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SATPROBE_SERVER_VERIFY_TLS", val),
            None => std::env::remove_var("SATPROBE_SERVER_VERIFY_TLS"),
        }
    }

    assert!(!result);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_then_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("satprobe.toml");
    std::fs::write(&path, "[naming]\ndefault_length = 12\n").expect("write");

    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SATPROBE_NAMING_DEFAULT_LENGTH", "0");
    }
    let result = SatprobeConfig::load(&path).await;
    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("SATPROBE_NAMING_DEFAULT_LENGTH");
    }

    let err = result.unwrap_err();
    assert!(err.to_string().contains("naming.default_length"));
}
