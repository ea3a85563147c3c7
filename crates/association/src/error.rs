//! 연관 모델 에러 타입
//!
//! 존재하지 않는 핸들 참조, 핸들 중복, 삭제된 자격증명 재사용 등
//! 연산 순서가 잘못되었을 때 [`AssociationModel::apply`](crate::AssociationModel::apply)가 반환합니다.

use satprobe_core::error::SatprobeError;
use satprobe_core::types::EntityKind;

use crate::operation::Handle;

/// 연관 모델 도메인 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssociationError {
    /// 아직 생성되지 않은 엔티티 참조
    #[error("unknown {kind} handle '{handle}'")]
    UnknownHandle { kind: EntityKind, handle: Handle },

    /// 이미 사용 중인 핸들
    #[error("handle '{0}' is already bound")]
    DuplicateHandle(Handle),

    /// 삭제된 자격증명 참조
    #[error("credential '{0}' has been deleted")]
    CredentialDeleted(Handle),

    /// 같은 이름의 자격증명이 이미 존재
    #[error("credential name '{0}' is already taken")]
    DuplicateCredentialName(String),

    /// 빈 이름
    #[error("{kind} '{handle}' has an empty name")]
    EmptyName { kind: EntityKind, handle: Handle },
}

impl From<AssociationError> for SatprobeError {
    fn from(err: AssociationError) -> Self {
        SatprobeError::Harness(err.to_string())
    }
}
