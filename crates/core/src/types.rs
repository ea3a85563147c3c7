//! 도메인 타입: 애플리케이션이 돌려주는 엔티티 레코드
//!
//! 이 크레이트는 엔티티를 소유하지 않습니다. 관리 대상 애플리케이션이
//! 생성/수정/삭제하며, 하네스는 읽어온 필드값만 이 타입으로 보관합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 애플리케이션이 부여한 엔티티 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 엔티티 종류 (에러 메시지/메트릭 레이블용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    Location,
    ContentCredential,
    Product,
    Repository,
    AuthSource,
}

impl EntityKind {
    /// 메트릭 레이블용 고정 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Location => "location",
            Self::ContentCredential => "content_credential",
            Self::Product => "product",
            Self::Repository => "repository",
            Self::AuthSource => "auth_source",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 조직
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: EntityId,
    pub name: String,
}

/// 위치
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: EntityId,
    pub name: String,
}

/// 콘텐츠 자격증명 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    GpgKey,
    Certificate,
}

impl ContentType {
    /// API 요청 값
    pub fn api_value(&self) -> &'static str {
        match self {
            Self::GpgKey => "gpg_key",
            Self::Certificate => "cert",
        }
    }

    /// 화면에 표시되는 라벨 ("Used as" 열)
    pub fn ui_label(&self) -> &'static str {
        match self {
            Self::GpgKey => "GPG Key",
            Self::Certificate => "SSL Certificate",
        }
    }

    /// API 값에서 변환합니다.
    pub fn from_api_value(value: &str) -> Option<Self> {
        match value {
            "gpg_key" => Some(Self::GpgKey),
            "cert" => Some(Self::Certificate),
            _ => None,
        }
    }
}

/// 콘텐츠 자격증명 (GPG 키)
///
/// 이름은 조직 내에서 유일합니다. 키 본문은 읽어오지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCredential {
    pub id: EntityId,
    pub name: String,
    pub content_type: ContentType,
    pub organization_id: EntityId,
}

/// 제품
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    pub organization_id: EntityId,
    /// 제품에 직접 연결된 자격증명
    pub gpg_key_id: Option<EntityId>,
}

/// 저장소 콘텐츠 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
    Yum,
    Docker,
    File,
    Ostree,
}

impl RepositoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yum => "yum",
            Self::Docker => "docker",
            Self::File => "file",
            Self::Ostree => "ostree",
        }
    }

    /// 저장소 탐색 화면의 필터 라벨
    pub fn discovery_label(&self) -> &'static str {
        match self {
            Self::Yum => "Yum Repositories",
            Self::Docker => "Container Images",
            Self::File => "File Repositories",
            Self::Ostree => "OSTree Repositories",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yum" => Some(Self::Yum),
            "docker" => Some(Self::Docker),
            "file" => Some(Self::File),
            "ostree" => Some(Self::Ostree),
            _ => None,
        }
    }
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 저장소
///
/// `gpg_key_id`는 제품의 연결과 독립된 축입니다. 제품의 자격증명을 상속하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: EntityId,
    pub name: String,
    pub product_id: EntityId,
    pub product_name: String,
    pub content_type: RepositoryType,
    pub url: String,
    pub gpg_key_id: Option<EntityId>,
}

/// LDAP 서버 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LdapServerType {
    ActiveDirectory,
    FreeIpa,
    Posix,
}

impl LdapServerType {
    pub fn api_value(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "active_directory",
            Self::FreeIpa => "free_ipa",
            Self::Posix => "posix",
        }
    }

    pub fn ui_label(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "Active Directory",
            Self::FreeIpa => "FreeIPA",
            Self::Posix => "POSIX",
        }
    }

    pub fn from_api_value(value: &str) -> Option<Self> {
        match value {
            "active_directory" => Some(Self::ActiveDirectory),
            "free_ipa" => Some(Self::FreeIpa),
            "posix" => Some(Self::Posix),
            _ => None,
        }
    }
}

impl fmt::Display for LdapServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ui_label())
    }
}

/// LDAP 속성 매핑
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub login: String,
    pub first_name: String,
    pub surname: String,
    pub mail: String,
}

/// AD 로그인 속성
pub const LDAP_ATTR_LOGIN_AD: &str = "samaccountname";
/// IdM/POSIX 로그인 속성
pub const LDAP_ATTR_LOGIN: &str = "uid";
pub const LDAP_ATTR_FIRST_NAME: &str = "givenname";
pub const LDAP_ATTR_SURNAME: &str = "sn";
pub const LDAP_ATTR_MAIL: &str = "mail";

impl AttributeMapping {
    /// 서버 유형에 맞는 기본 매핑을 반환합니다.
    pub fn for_server_type(server_type: LdapServerType) -> Self {
        let login = match server_type {
            LdapServerType::ActiveDirectory => LDAP_ATTR_LOGIN_AD,
            LdapServerType::FreeIpa | LdapServerType::Posix => LDAP_ATTR_LOGIN,
        };
        Self {
            login: login.to_owned(),
            first_name: LDAP_ATTR_FIRST_NAME.to_owned(),
            surname: LDAP_ATTR_SURNAME.to_owned(),
            mail: LDAP_ATTR_MAIL.to_owned(),
        }
    }

    /// 매핑의 로그인 속성이 서버 유형과 일치하는지 확인합니다.
    pub fn is_consistent_with(&self, server_type: LdapServerType) -> bool {
        let expected = Self::for_server_type(server_type);
        self.login.eq_ignore_ascii_case(&expected.login)
    }
}

/// LDAP 인증 소스
///
/// 바인드 비밀번호는 쓰기 전용이라 읽어온 레코드에는 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapAuthSource {
    pub id: EntityId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub server_type: LdapServerType,
    pub attributes: AttributeMapping,
    pub account: String,
    pub base_dn: String,
    pub groups_base: String,
    pub organization_ids: Vec<EntityId>,
    pub location_ids: Vec<EntityId>,
}
