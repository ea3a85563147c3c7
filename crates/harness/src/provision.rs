//! 픽스처 생성기
//!
//! 시나리오 전제 엔티티를 엔티티 API로 만듭니다. 모든 실패는
//! [`HarnessError::Fixture`]로 감싸며 외부 메시지를 그대로 보존합니다. 재시도하지 않습니다.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use satprobe_core::metrics as m;
use satprobe_core::types::{
    ContentCredential, ContentType, EntityId, EntityKind, LdapAuthSource, Location, Organization,
    Product, Repository, RepositoryType,
};

use crate::api::{EntityApi, NewContentCredential, NewProduct, NewRepository};
use crate::error::HarnessError;
use crate::ldap::LdapAuthSourceSpec;

/// 픽스처 생성기
pub struct FixtureProvisioner<A> {
    api: Arc<A>,
}

impl<A> Clone for FixtureProvisioner<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: EntityApi> FixtureProvisioner<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn create_organization(&self, name: &str) -> Result<Organization, HarnessError> {
        let org = self
            .api
            .create_organization(name)
            .await
            .map_err(|e| e.into_fixture(EntityKind::Organization))?;
        created(EntityKind::Organization, &org.name, org.id);
        Ok(org)
    }

    pub async fn create_location(&self, name: &str) -> Result<Location, HarnessError> {
        let location = self
            .api
            .create_location(name)
            .await
            .map_err(|e| e.into_fixture(EntityKind::Location))?;
        created(EntityKind::Location, &location.name, location.id);
        Ok(location)
    }

    /// 키 파일 내용으로 GPG 자격증명을 만듭니다.
    pub async fn create_content_credential_from_file(
        &self,
        organization: EntityId,
        name: &str,
        key_path: &Path,
    ) -> Result<ContentCredential, HarnessError> {
        let content = tokio::fs::read_to_string(key_path)
            .await
            .map_err(|e| HarnessError::Fixture {
                entity: EntityKind::ContentCredential,
                reason: format!("failed to read key file {}: {e}", key_path.display()),
            })?;
        self.create_content_credential(organization, name, content)
            .await
    }

    pub async fn create_content_credential(
        &self,
        organization: EntityId,
        name: &str,
        content: String,
    ) -> Result<ContentCredential, HarnessError> {
        let request = NewContentCredential {
            name: name.to_owned(),
            content_type: ContentType::GpgKey,
            content,
        };
        let credential = self
            .api
            .create_content_credential(organization, &request)
            .await
            .map_err(|e| e.into_fixture(EntityKind::ContentCredential))?;
        created(EntityKind::ContentCredential, &credential.name, credential.id);
        Ok(credential)
    }

    pub async fn create_product(
        &self,
        organization: EntityId,
        name: &str,
        gpg_key_id: Option<EntityId>,
    ) -> Result<Product, HarnessError> {
        let request = NewProduct {
            name: name.to_owned(),
            gpg_key_id,
        };
        let product = self
            .api
            .create_product(organization, &request)
            .await
            .map_err(|e| e.into_fixture(EntityKind::Product))?;
        created(EntityKind::Product, &product.name, product.id);
        Ok(product)
    }

    /// yum 저장소를 만듭니다. `gpg_key_id`는 제품의 연결과 무관하게 저장소에만 적용됩니다.
    pub async fn create_repository(
        &self,
        product: EntityId,
        name: &str,
        url: &str,
        gpg_key_id: Option<EntityId>,
    ) -> Result<Repository, HarnessError> {
        let request = NewRepository {
            name: name.to_owned(),
            product_id: product,
            content_type: RepositoryType::Yum,
            url: url.to_owned(),
            gpg_key_id,
        };
        let repo = self
            .api
            .create_repository(&request)
            .await
            .map_err(|e| e.into_fixture(EntityKind::Repository))?;
        created(EntityKind::Repository, &repo.name, repo.id);
        Ok(repo)
    }

    pub async fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> Result<LdapAuthSource, HarnessError> {
        spec.validate()
            .map_err(|e| e.into_fixture(EntityKind::AuthSource))?;
        let source = self
            .api
            .create_auth_source(spec)
            .await
            .map_err(|e| e.into_fixture(EntityKind::AuthSource))?;
        created(EntityKind::AuthSource, &source.name, source.id);
        Ok(source)
    }
}

fn created(entity: EntityKind, name: &str, id: EntityId) {
    info!(entity = entity.as_str(), name, id = id.0, "fixture created");
    metrics::counter!(m::FIXTURES_CREATED_TOTAL, m::LABEL_ENTITY => entity.as_str()).increment(1);
}
