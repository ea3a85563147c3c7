//! 에러 타입: 도메인별 에러 정의

/// satprobe 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SatprobeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 하네스(픽스처/액션/검증) 에러
    #[error("harness error: {0}")]
    Harness(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_names_field() {
        let err = ConfigError::InvalidValue {
            field: "server.url".to_owned(),
            reason: "must be absolute".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("server.url"));
        assert!(msg.contains("must be absolute"));
    }

    #[test]
    fn config_error_converts_into_top_level() {
        let err: SatprobeError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, SatprobeError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn io_error_converts_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SatprobeError = io.into();
        assert!(matches!(err, SatprobeError::Io(_)));
    }
}
