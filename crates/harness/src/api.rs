//! 엔티티 관리 API 추상화
//!
//! [`EntityApi`] 트레이트는 관리 대상 애플리케이션의 엔티티 CRUD를 추상화합니다.
//! 운영 코드는 [`HttpEntityApi`](crate::http::HttpEntityApi)를, 테스트는
//! `InMemoryApplication`(feature `test-util`)을 사용합니다.
//!
//! # Architecture
//!
//! ```text
//!  FixtureProvisioner   ApiSession
//!           \              /
//!            v            v
//!           ┌──────────────┐
//!           │  EntityApi   │ (trait)
//!           └──────────────┘
//!             │          │
//!             v          v
//!      HttpEntityApi   InMemoryApplication
//!             │
//!             v
//!       application REST API
//! ```
//!
//! # Error Handling
//!
//! - **404**: `HarnessError::NotFound`
//! - **기타 non-2xx**: `HarnessError::Api { status, message }` (본문 그대로)
//! - **연결 실패**: `HarnessError::Transport`
//!
//! 어떤 호출도 재시도하지 않습니다.

use std::future::Future;

use serde::{Deserialize, Serialize};

use satprobe_core::types::{
    ContentCredential, ContentType, EntityId, LdapAuthSource, Location, Organization, Product,
    Repository, RepositoryType,
};

use crate::error::HarnessError;
use crate::ldap::LdapAuthSourceSpec;

/// 콘텐츠 자격증명 생성 요청
#[derive(Debug, Clone, Serialize)]
pub struct NewContentCredential {
    pub name: String,
    pub content_type: ContentType,
    /// ASCII-armored 키 본문
    pub content: String,
}

/// 제품 생성 요청
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub gpg_key_id: Option<EntityId>,
}

/// 제품 수정 요청. `None` 필드는 변경하지 않습니다.
///
/// `gpg_key_id: Some(None)`은 연결 해제입니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key_id: Option<Option<EntityId>>,
}

/// 저장소 생성 요청
#[derive(Debug, Clone, Serialize)]
pub struct NewRepository {
    pub name: String,
    pub product_id: EntityId,
    pub content_type: RepositoryType,
    pub url: String,
    pub gpg_key_id: Option<EntityId>,
}

/// 저장소 수정 요청
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key_id: Option<Option<EntityId>>,
}

/// 인증 소스 수정 요청
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthSourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_ids: Option<Vec<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_ids: Option<Vec<EntityId>>,
}

/// 저장소 탐색 결과 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRepository {
    pub name: String,
    pub url: String,
}

/// 자격증명을 사용하는 제품
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialProduct {
    pub id: EntityId,
    pub name: String,
}

/// 자격증명을 사용하는 저장소
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRepository {
    pub id: EntityId,
    pub name: String,
    pub product_name: String,
    pub content_type: RepositoryType,
}

/// 애플리케이션이 자격증명 상세에 싣는 사용처 목록
///
/// 제품/저장소 각각의 `gpg_key_id`가 아니라 자격증명 쪽에서 본 관계입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialUsage {
    pub products: Vec<CredentialProduct>,
    pub repositories: Vec<CredentialRepository>,
}

/// 엔티티 관리 API
///
/// 모든 호출은 엔티티의 현재 필드값(연관 참조 포함)을 반환합니다.
/// `Send + Sync + 'static`이므로 `Arc`로 공유할 수 있습니다.
///
/// 조직/위치/저장소/인증 소스의 수정 메서드와 `read_location`, `read_auth_source`,
/// `delete_repository`, `delete_location`은 시나리오가 호출하지 않는 외부 노출용입니다.
pub trait EntityApi: Send + Sync + 'static {
    /// 서버 연결 확인
    fn ping(&self) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Organization ---

    fn create_organization(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Organization, HarnessError>> + Send;

    fn read_organization(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Organization, HarnessError>> + Send;

    /// 이름으로 조직을 찾습니다 (정확히 일치).
    fn find_organization(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Organization>, HarnessError>> + Send;

    fn update_organization(
        &self,
        id: EntityId,
        name: &str,
    ) -> impl Future<Output = Result<Organization, HarnessError>> + Send;

    fn delete_organization(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Location ---

    fn create_location(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Location, HarnessError>> + Send;

    fn read_location(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Location, HarnessError>> + Send;

    fn update_location(
        &self,
        id: EntityId,
        name: &str,
    ) -> impl Future<Output = Result<Location, HarnessError>> + Send;

    fn delete_location(&self, id: EntityId)
    -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Content credential ---

    fn create_content_credential(
        &self,
        organization: EntityId,
        request: &NewContentCredential,
    ) -> impl Future<Output = Result<ContentCredential, HarnessError>> + Send;

    fn read_content_credential(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<ContentCredential, HarnessError>> + Send;

    /// 자격증명 읽기 응답에 실린 `products`/`repositories` 목록
    fn read_content_credential_usage(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<CredentialUsage, HarnessError>> + Send;

    /// 조직 안에서 이름으로 자격증명을 찾습니다 (정확히 일치).
    fn find_content_credential(
        &self,
        organization: EntityId,
        name: &str,
    ) -> impl Future<Output = Result<Option<ContentCredential>, HarnessError>> + Send;

    fn list_content_credentials(
        &self,
        organization: EntityId,
    ) -> impl Future<Output = Result<Vec<ContentCredential>, HarnessError>> + Send;

    fn update_content_credential(
        &self,
        id: EntityId,
        name: &str,
    ) -> impl Future<Output = Result<ContentCredential, HarnessError>> + Send;

    /// 삭제 시 이 자격증명을 참조하던 제품/저장소의 연결이 해제됩니다.
    fn delete_content_credential(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Product ---

    fn create_product(
        &self,
        organization: EntityId,
        request: &NewProduct,
    ) -> impl Future<Output = Result<Product, HarnessError>> + Send;

    fn read_product(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Product, HarnessError>> + Send;

    fn list_products(
        &self,
        organization: EntityId,
    ) -> impl Future<Output = Result<Vec<Product>, HarnessError>> + Send;

    fn update_product(
        &self,
        id: EntityId,
        update: &ProductUpdate,
    ) -> impl Future<Output = Result<Product, HarnessError>> + Send;

    fn delete_product(&self, id: EntityId) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Repository ---

    fn create_repository(
        &self,
        request: &NewRepository,
    ) -> impl Future<Output = Result<Repository, HarnessError>> + Send;

    fn read_repository(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Repository, HarnessError>> + Send;

    fn list_repositories(
        &self,
        organization: EntityId,
    ) -> impl Future<Output = Result<Vec<Repository>, HarnessError>> + Send;

    fn update_repository(
        &self,
        id: EntityId,
        update: &RepositoryUpdate,
    ) -> impl Future<Output = Result<Repository, HarnessError>> + Send;

    fn delete_repository(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- LDAP auth source ---

    fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> impl Future<Output = Result<LdapAuthSource, HarnessError>> + Send;

    fn read_auth_source(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<LdapAuthSource, HarnessError>> + Send;

    /// 이름으로 인증 소스를 검색합니다 (정확히 일치하는 항목만).
    fn search_auth_sources(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<LdapAuthSource>, HarnessError>> + Send;

    fn update_auth_source(
        &self,
        id: EntityId,
        update: &AuthSourceUpdate,
    ) -> impl Future<Output = Result<LdapAuthSource, HarnessError>> + Send;

    fn delete_auth_source(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), HarnessError>> + Send;

    // --- Repository discovery ---

    /// URL 아래에서 주어진 유형의 저장소를 탐색합니다.
    fn discover_repositories(
        &self,
        organization: EntityId,
        url: &str,
        content_type: RepositoryType,
    ) -> impl Future<Output = Result<Vec<DiscoveredRepository>, HarnessError>> + Send;
}

/// 탐색된 URL에서 저장소 이름(마지막 경로 조각)을 추출합니다.
pub fn discovered_name(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .rfind(|segment| !segment.is_empty())
        .map(str::to_owned)
}
