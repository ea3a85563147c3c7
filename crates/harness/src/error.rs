//! 하네스 에러 타입
//!
//! [`HarnessError`]는 API 호출, 픽스처 생성, 액션 실행, 상태 검증에서 발생하는
//! 모든 에러를 표현합니다. 시나리오 실패 분류([`FailureKind`])는 이 에러에서 결정됩니다.
//! `From<HarnessError> for SatprobeError` 변환이 구현되어 있습니다.

use serde::{Deserialize, Serialize};

use satprobe_association::AssociationError;
use satprobe_core::error::SatprobeError;
use satprobe_core::types::EntityKind;

/// 하네스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 엔티티를 찾을 수 없음 (HTTP 404)
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// 애플리케이션이 2xx 이외의 응답을 반환 (본문 그대로 보존)
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// 연결 실패, 타임아웃 등 전송 계층 에러
    #[error("transport error: {0}")]
    Transport(String),

    /// 응답 본문 해석 실패
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// 비동기 태스크가 제한 시간 내에 끝나지 않음
    #[error("task '{task_id}' did not finish within {waited_secs}s")]
    TaskTimeout { task_id: String, waited_secs: u64 },

    /// 비동기 태스크가 실패로 종료
    #[error("task '{task_id}' finished with result '{result}'")]
    TaskFailed { task_id: String, result: String },

    /// 픽스처 생성 실패 (시나리오 중단, 재시도 없음)
    #[error("fixture error: failed to create {entity}: {reason}")]
    Fixture { entity: EntityKind, reason: String },

    /// 테스트 대상 액션 실패
    #[error("action '{action}' failed: {reason}")]
    Action { action: String, reason: String },

    /// 기대값과 관측값 불일치
    #[error("mismatch on {subject}: expected {expected}, observed {observed} ({diff})")]
    Mismatch {
        subject: String,
        expected: String,
        observed: String,
        diff: String,
    },

    /// 조직 선택 전 조직 범위 작업 호출
    #[error("no organization selected in session")]
    NoOrganizationSelected,

    /// 인증 소스 명세 검증 실패
    #[error("invalid auth source spec: {field}: {reason}")]
    InvalidSpec { field: String, reason: String },

    /// 허용되지 않는 수명주기 전이
    #[error("invalid auth source transition: cannot {action} from {from}")]
    InvalidTransition { from: String, action: String },

    /// 시나리오 단계가 바인딩되지 않은 핸들을 참조
    #[error("handle '{0}' is not bound in this scenario")]
    UnboundHandle(String),

    /// 연관 모델 에러
    #[error("association model: {0}")]
    Association(#[from] AssociationError),

    /// I/O 에러 (키 파일 읽기 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// 다른 에러를 픽스처 에러로 감쌉니다. 이미 픽스처 에러면 그대로 둡니다.
    pub fn into_fixture(self, entity: EntityKind) -> Self {
        match self {
            err @ Self::Fixture { .. } => err,
            other => Self::Fixture {
                entity,
                reason: other.to_string(),
            },
        }
    }

    /// 다른 에러를 액션 에러로 감쌉니다. 픽스처/불일치/액션 에러는 그대로 둡니다.
    pub fn into_action(self, action: &str) -> Self {
        match self {
            err @ (Self::Fixture { .. } | Self::Mismatch { .. } | Self::Action { .. }) => err,
            other => Self::Action {
                action: action.to_owned(),
                reason: other.to_string(),
            },
        }
    }

    /// 시나리오 실패 분류
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Fixture { .. } => FailureKind::Fixture,
            Self::Mismatch { .. } => FailureKind::Mismatch,
            _ => FailureKind::Action,
        }
    }

    /// 404 여부
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// 시나리오 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 픽스처 생성 실패
    Fixture,
    /// 테스트 대상 액션 실패
    Action,
    /// 기대값 불일치
    Mismatch,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixture => "fixture",
            Self::Action => "action",
            Self::Mismatch => "mismatch",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HarnessError> for SatprobeError {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::Io(io) => SatprobeError::Io(io),
            other => SatprobeError::Harness(other.to_string()),
        }
    }
}
