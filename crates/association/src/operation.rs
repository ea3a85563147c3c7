//! 연관 행렬에 적용되는 연산
//!
//! 엔티티는 이름이 아닌 [`Handle`]로 참조합니다. 자격증명 이름은 변경될 수 있지만
//! 핸들은 시나리오가 끝날 때까지 고정입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 시나리오 내 엔티티 별칭
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Handle {
    fn from(alias: &str) -> Self {
        Self(alias.to_owned())
    }
}

impl From<String> for Handle {
    fn from(alias: String) -> Self {
        Self(alias)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 연관 상태를 바꾸는 설정 연산
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// 자격증명 생성
    CreateCredential { credential: Handle, name: String },
    /// 제품 생성 (선택적으로 자격증명 직접 연결)
    CreateProduct {
        product: Handle,
        name: String,
        credential: Option<Handle>,
    },
    /// 저장소 생성. `credential`은 제품의 연결과 무관합니다.
    CreateRepository {
        repository: Handle,
        name: String,
        product: Handle,
        credential: Option<Handle>,
    },
    /// 자격증명 이름 변경
    RenameCredential { credential: Handle, new_name: String },
    /// 자격증명 삭제
    DeleteCredential { credential: Handle },
}

impl Operation {
    pub fn create_credential(credential: impl Into<Handle>, name: impl Into<String>) -> Self {
        Self::CreateCredential {
            credential: credential.into(),
            name: name.into(),
        }
    }

    pub fn create_product(
        product: impl Into<Handle>,
        name: impl Into<String>,
        credential: Option<Handle>,
    ) -> Self {
        Self::CreateProduct {
            product: product.into(),
            name: name.into(),
            credential,
        }
    }

    pub fn create_repository(
        repository: impl Into<Handle>,
        name: impl Into<String>,
        product: impl Into<Handle>,
        credential: Option<Handle>,
    ) -> Self {
        Self::CreateRepository {
            repository: repository.into(),
            name: name.into(),
            product: product.into(),
            credential,
        }
    }

    pub fn rename_credential(credential: impl Into<Handle>, new_name: impl Into<String>) -> Self {
        Self::RenameCredential {
            credential: credential.into(),
            new_name: new_name.into(),
        }
    }

    pub fn delete_credential(credential: impl Into<Handle>) -> Self {
        Self::DeleteCredential {
            credential: credential.into(),
        }
    }

    /// 로그용 연산 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateCredential { .. } => "create_credential",
            Self::CreateProduct { .. } => "create_product",
            Self::CreateRepository { .. } => "create_repository",
            Self::RenameCredential { .. } => "rename_credential",
            Self::DeleteCredential { .. } => "delete_credential",
        }
    }
}
