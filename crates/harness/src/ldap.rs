//! LDAP 인증 소스 명세와 수명주기
//!
//! [`LdapAuthSourceSpec`]은 생성 요청 값이고, [`AuthSourceLifecycle`]은 시나리오 안에서
//! 인증 소스 하나가 거치는 상태를 추적합니다.
//!
//! ```text
//! Absent --create--> Created --listed--> Searchable --delete--> Deleted --absent--> Absent
//!                       |                                  ^
//!                       +------------- delete -------------+
//! ```
//!
//! 조직/위치 범위는 생성 시 함께 지정하며 별도 전이가 아닙니다.

use std::fmt;

use serde::Serialize;

use satprobe_core::config::LdapFixtureConfig;
use satprobe_core::types::{AttributeMapping, EntityId, LdapServerType};

use crate::error::HarnessError;

/// 기본 LDAP 포트
pub const DEFAULT_LDAP_PORT: u16 = 389;

/// LDAP 인증 소스 생성 명세
#[derive(Debug, Clone, Serialize)]
pub struct LdapAuthSourceSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub server_type: LdapServerType,
    pub attributes: AttributeMapping,
    pub account: String,
    /// 바인드 비밀번호 (쓰기 전용)
    #[serde(skip_serializing)]
    pub account_password: String,
    pub base_dn: String,
    pub groups_base: String,
    /// 첫 로그인 시 사용자 자동 생성
    pub onthefly_register: bool,
    pub organization_ids: Vec<EntityId>,
    pub location_ids: Vec<EntityId>,
}

impl LdapAuthSourceSpec {
    pub fn builder(
        name: impl Into<String>,
        host: impl Into<String>,
        server_type: LdapServerType,
    ) -> LdapAuthSourceSpecBuilder {
        LdapAuthSourceSpecBuilder::new(name.into(), host.into(), server_type)
    }

    /// 픽스처 설정으로 계정/DN을 채운 빌더를 만듭니다.
    pub fn from_fixture(
        name: impl Into<String>,
        server_type: LdapServerType,
        fixture: &LdapFixtureConfig,
    ) -> LdapAuthSourceSpecBuilder {
        Self::builder(name, fixture.hostname.clone(), server_type)
            .account(fixture.username.clone(), fixture.password.clone())
            .base_dn(fixture.base_dn.clone())
            .groups_base(fixture.group_base_dn.clone())
    }

    /// 명세의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be 1-65535"));
        }
        if self.base_dn.trim().is_empty() {
            return Err(invalid("base_dn", "must not be empty"));
        }

        let mapping = &self.attributes;
        for (field, value) in [
            ("attributes.login", &mapping.login),
            ("attributes.first_name", &mapping.first_name),
            ("attributes.surname", &mapping.surname),
            ("attributes.mail", &mapping.mail),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        if !mapping.is_consistent_with(self.server_type) {
            let expected = AttributeMapping::for_server_type(self.server_type);
            return Err(HarnessError::InvalidSpec {
                field: "attributes.login".to_owned(),
                reason: format!(
                    "{} requires login attribute '{}', got '{}'",
                    self.server_type, expected.login, mapping.login
                ),
            });
        }

        Ok(())
    }

    /// 조직/위치 범위가 지정되었는지
    pub fn is_scoped(&self) -> bool {
        !self.organization_ids.is_empty() || !self.location_ids.is_empty()
    }
}

fn invalid(field: &str, reason: &str) -> HarnessError {
    HarnessError::InvalidSpec {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

/// [`LdapAuthSourceSpec`] 빌더
///
/// 속성 매핑은 서버 유형의 기본값으로 시작합니다.
#[derive(Debug, Clone)]
pub struct LdapAuthSourceSpecBuilder {
    spec: LdapAuthSourceSpec,
}

impl LdapAuthSourceSpecBuilder {
    fn new(name: String, host: String, server_type: LdapServerType) -> Self {
        Self {
            spec: LdapAuthSourceSpec {
                name,
                host,
                port: DEFAULT_LDAP_PORT,
                server_type,
                attributes: AttributeMapping::for_server_type(server_type),
                account: String::new(),
                account_password: String::new(),
                base_dn: String::new(),
                groups_base: String::new(),
                onthefly_register: false,
                organization_ids: Vec::new(),
                location_ids: Vec::new(),
            },
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.spec.port = port;
        self
    }

    pub fn attributes(mut self, attributes: AttributeMapping) -> Self {
        self.spec.attributes = attributes;
        self
    }

    pub fn account(mut self, account: impl Into<String>, password: impl Into<String>) -> Self {
        self.spec.account = account.into();
        self.spec.account_password = password.into();
        self
    }

    pub fn base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.spec.base_dn = base_dn.into();
        self
    }

    pub fn groups_base(mut self, groups_base: impl Into<String>) -> Self {
        self.spec.groups_base = groups_base.into();
        self
    }

    pub fn onthefly_register(mut self, enabled: bool) -> Self {
        self.spec.onthefly_register = enabled;
        self
    }

    pub fn organizations(mut self, ids: Vec<EntityId>) -> Self {
        self.spec.organization_ids = ids;
        self
    }

    pub fn locations(mut self, ids: Vec<EntityId>) -> Self {
        self.spec.location_ids = ids;
        self
    }

    /// 검증 후 명세를 반환합니다.
    pub fn build(self) -> Result<LdapAuthSourceSpec, HarnessError> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

/// 인증 소스 수명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Absent,
    Created,
    Searchable,
    Deleted,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Created => "created",
            Self::Searchable => "searchable",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// 시나리오 안의 인증 소스 하나의 수명주기
///
/// 삭제는 되돌릴 수 없습니다. 삭제 후 같은 수명주기로 다시 생성할 수 없습니다.
#[derive(Debug, Clone)]
pub struct AuthSourceLifecycle {
    state: LifecycleState,
    name: Option<String>,
    was_deleted: bool,
}

impl Default for AuthSourceLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSourceLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Absent,
            name: None,
            was_deleted: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// 생성된 인증 소스 이름
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Absent -> Created
    pub fn created(&mut self, name: impl Into<String>) -> Result<(), HarnessError> {
        if self.state != LifecycleState::Absent || self.was_deleted {
            return Err(self.invalid("create"));
        }
        self.name = Some(name.into());
        self.state = LifecycleState::Created;
        Ok(())
    }

    /// Created -> Searchable (Searchable에서 반복 조회 허용)
    pub fn listed(&mut self) -> Result<(), HarnessError> {
        match self.state {
            LifecycleState::Created | LifecycleState::Searchable => {
                self.state = LifecycleState::Searchable;
                Ok(())
            }
            _ => Err(self.invalid("confirm listed")),
        }
    }

    /// Created | Searchable -> Deleted
    pub fn deleted(&mut self) -> Result<(), HarnessError> {
        match self.state {
            LifecycleState::Created | LifecycleState::Searchable => {
                self.state = LifecycleState::Deleted;
                self.was_deleted = true;
                Ok(())
            }
            _ => Err(self.invalid("delete")),
        }
    }

    /// Deleted -> Absent
    pub fn confirmed_absent(&mut self) -> Result<(), HarnessError> {
        match self.state {
            LifecycleState::Deleted | LifecycleState::Absent => {
                self.state = LifecycleState::Absent;
                Ok(())
            }
            _ => Err(self.invalid("confirm absent")),
        }
    }

    fn invalid(&self, action: &str) -> HarnessError {
        HarnessError::InvalidTransition {
            from: self.state.to_string(),
            action: action.to_owned(),
        }
    }
}
