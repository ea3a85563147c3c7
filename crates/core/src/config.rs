//! 설정 관리: satprobe.toml 파싱 및 런타임 설정
//!
//! [`SatprobeConfig`]는 하네스 전체 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SATPROBE_SERVER_URL=https://sat.example.com` 형식)
//! 3. 설정 파일 (`satprobe.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), satprobe_core::error::SatprobeError> {
//! use satprobe_core::config::SatprobeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SatprobeConfig::load("satprobe.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SatprobeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SatprobeError};

/// 설정 상한값 상수
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;
const MAX_TASK_TIMEOUT_SECS: u64 = 3600;
const MIN_TASK_POLL_INTERVAL_MS: u64 = 10;
const MAX_TASK_POLL_INTERVAL_MS: u64 = 60_000;
const MAX_NAME_LENGTH: usize = 255;

/// satprobe 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatprobeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 대상 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// Active Directory 픽스처
    #[serde(default)]
    pub ldap: LdapFixtureConfig,
    /// FreeIPA 픽스처
    #[serde(default)]
    pub ipa: LdapFixtureConfig,
    /// 테스트 데이터 (키 파일, 저장소 URL)
    #[serde(default)]
    pub fixtures: FixturesConfig,
    /// 이름 생성 설정
    #[serde(default)]
    pub naming: NamingConfig,
}

impl SatprobeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SatprobeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SatprobeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SatprobeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SatprobeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SatprobeError> {
        toml::from_str(toml_str).map_err(|e| {
            SatprobeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SATPROBE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SATPROBE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SATPROBE_GENERAL_LOG_FORMAT");

        // Server
        override_string(&mut self.server.url, "SATPROBE_SERVER_URL");
        override_string(&mut self.server.username, "SATPROBE_SERVER_USERNAME");
        override_string(&mut self.server.password, "SATPROBE_SERVER_PASSWORD");
        override_bool(&mut self.server.verify_tls, "SATPROBE_SERVER_VERIFY_TLS");
        override_u64(
            &mut self.server.request_timeout_secs,
            "SATPROBE_SERVER_REQUEST_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.server.task_timeout_secs,
            "SATPROBE_SERVER_TASK_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.server.task_poll_interval_ms,
            "SATPROBE_SERVER_TASK_POLL_INTERVAL_MS",
        );

        // LDAP (AD / IPA)
        self.ldap.apply_env_overrides("SATPROBE_LDAP");
        self.ipa.apply_env_overrides("SATPROBE_IPA");

        // Fixtures
        override_string(
            &mut self.fixtures.gpg_key_file,
            "SATPROBE_FIXTURES_GPG_KEY_FILE",
        );
        override_string(
            &mut self.fixtures.yum_repo_url_1,
            "SATPROBE_FIXTURES_YUM_REPO_URL_1",
        );
        override_string(
            &mut self.fixtures.yum_repo_url_2,
            "SATPROBE_FIXTURES_YUM_REPO_URL_2",
        );
        override_string(
            &mut self.fixtures.discovery_url,
            "SATPROBE_FIXTURES_DISCOVERY_URL",
        );
        override_string(
            &mut self.fixtures.discovery_repo_name,
            "SATPROBE_FIXTURES_DISCOVERY_REPO_NAME",
        );

        // Naming
        override_opt_u64(&mut self.naming.seed, "SATPROBE_NAMING_SEED");
        override_usize(
            &mut self.naming.default_length,
            "SATPROBE_NAMING_DEFAULT_LENGTH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SatprobeError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // 서버 URL 검증
        match url::Url::parse(&self.server.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(invalid(
                    "server.url",
                    format!("unsupported scheme '{}', expected http or https", parsed.scheme()),
                ));
            }
            Err(e) => {
                return Err(invalid("server.url", format!("not an absolute url: {e}")));
            }
        }

        if self.server.request_timeout_secs == 0
            || self.server.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(invalid(
                "server.request_timeout_secs",
                format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            ));
        }

        if self.server.task_timeout_secs == 0 || self.server.task_timeout_secs > MAX_TASK_TIMEOUT_SECS
        {
            return Err(invalid(
                "server.task_timeout_secs",
                format!("must be 1-{MAX_TASK_TIMEOUT_SECS}"),
            ));
        }

        if self.server.task_poll_interval_ms < MIN_TASK_POLL_INTERVAL_MS
            || self.server.task_poll_interval_ms > MAX_TASK_POLL_INTERVAL_MS
        {
            return Err(invalid(
                "server.task_poll_interval_ms",
                format!("must be {MIN_TASK_POLL_INTERVAL_MS}-{MAX_TASK_POLL_INTERVAL_MS}"),
            ));
        }

        if self.naming.default_length == 0 || self.naming.default_length > MAX_NAME_LENGTH {
            return Err(invalid(
                "naming.default_length",
                format!("must be 1-{MAX_NAME_LENGTH}"),
            ));
        }

        if self.fixtures.discovery_repo_name.is_empty() {
            return Err(invalid(
                "fixtures.discovery_repo_name",
                "must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> SatprobeError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 대상 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 서버 기본 URL
    pub url: String,
    /// API 사용자
    pub username: String,
    /// API 비밀번호
    pub password: String,
    /// TLS 인증서 검증 여부
    pub verify_tls: bool,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 비동기 태스크 대기 한도 (초)
    pub task_timeout_secs: u64,
    /// 태스크 상태 폴링 간격 (밀리초)
    pub task_poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "https://satellite.example.com".to_owned(),
            username: "admin".to_owned(),
            password: String::new(),
            verify_tls: true,
            request_timeout_secs: 60,
            task_timeout_secs: 300,
            task_poll_interval_ms: 1000,
        }
    }
}

/// LDAP 픽스처 환경 (AD 또는 IPA)
///
/// 모든 필드가 채워져야 "설정됨"으로 간주합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapFixtureConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub base_dn: String,
    pub group_base_dn: String,
}

impl LdapFixtureConfig {
    /// 모든 필드가 비어있지 않은지 확인합니다.
    pub fn is_configured(&self) -> bool {
        [
            &self.hostname,
            &self.username,
            &self.password,
            &self.base_dn,
            &self.group_base_dn,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }

    /// 비어있는 필드 이름 목록 (스킵 사유 보고용)
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields: [(&'static str, &String); 5] = [
            ("hostname", &self.hostname),
            ("username", &self.username),
            ("password", &self.password),
            ("base_dn", &self.base_dn),
            ("group_base_dn", &self.group_base_dn),
        ];
        fields
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        override_string(&mut self.hostname, &format!("{prefix}_HOSTNAME"));
        override_string(&mut self.username, &format!("{prefix}_USERNAME"));
        override_string(&mut self.password, &format!("{prefix}_PASSWORD"));
        override_string(&mut self.base_dn, &format!("{prefix}_BASE_DN"));
        override_string(&mut self.group_base_dn, &format!("{prefix}_GROUP_BASE_DN"));
    }
}

/// 테스트 데이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    /// ASCII-armored GPG 공개키 파일 경로
    pub gpg_key_file: String,
    /// 첫 번째 yum 저장소 URL
    pub yum_repo_url_1: String,
    /// 두 번째 yum 저장소 URL
    pub yum_repo_url_2: String,
    /// 저장소 탐색 시작 URL
    pub discovery_url: String,
    /// 탐색 결과에서 선택할 저장소 이름
    pub discovery_repo_name: String,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            gpg_key_file: "data/valid_gpg_key.txt".to_owned(),
            yum_repo_url_1: "https://repos.fedorapeople.org/pulp/pulp/fixtures/rpm-signed/"
                .to_owned(),
            yum_repo_url_2: "https://repos.fedorapeople.org/pulp/pulp/fixtures/rpm-unsigned/"
                .to_owned(),
            discovery_url: "http://omaciel.fedorapeople.org/".to_owned(),
            discovery_repo_name: "fakerepo01".to_owned(),
        }
    }
}

/// 이름 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// 난수 시드 (없으면 매 실행마다 새 엔트로피)
    pub seed: Option<u64>,
    /// 기본 이름 길이
    pub default_length: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_length: 10,
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_opt_u64(target: &mut Option<u64>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = Some(parsed),
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
