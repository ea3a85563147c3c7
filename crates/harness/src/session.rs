//! 대화형 세션 -- 화면에 보이는 상세 보기와 사용자 동작
//!
//! [`Session`]은 사용자가 웹 화면에서 보는 관계 테이블과 필드, 그리고 화면에서
//! 수행하는 동작(가져오기, 이름 변경, 삭제, 저장소 탐색)을 추상화합니다.
//!
//! [`ApiSession`]은 같은 보기를 엔티티 API로 구성합니다. 자격증명 상세의
//! 관계 테이블은 애플리케이션이 자격증명 읽기 응답에 싣는 사용처 목록을
//! 그대로 나열합니다. 제품/저장소 쪽 `gpg_key_id`와는 따로 관측됩니다.
//! 조직 범위 동작은 조직을 선택하기 전까지 `NoOrganizationSelected`를 반환합니다.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use satprobe_core::types::{
    ContentCredential, ContentType, EntityId, EntityKind, LdapAuthSource, Organization, Product,
    Repository, RepositoryType,
};

use crate::api::{EntityApi, NewContentCredential, NewProduct, NewRepository};
use crate::error::HarnessError;
use crate::ldap::LdapAuthSourceSpec;

/// 자격증명 상세의 제품 테이블 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRow {
    pub name: String,
    pub used_as: String,
}

/// 자격증명 상세의 저장소 테이블 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRow {
    pub name: String,
    pub product: String,
    pub repo_type: String,
    pub used_as: String,
}

/// 자격증명 상세 보기
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialDetails {
    pub name: String,
    pub products: Vec<ProductRow>,
    pub repositories: Vec<RepositoryRow>,
}

/// 제품 상세 보기
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetails {
    pub name: String,
    /// 연결된 자격증명 이름
    pub gpg_key: Option<String>,
}

/// 저장소 콘텐츠 탭
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryContent {
    pub gpg_key: Option<String>,
}

/// 저장소 탐색 요청
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub url: String,
    pub repo_type: RepositoryType,
    /// 탐색 결과 중 생성할 저장소 이름
    pub selected: Vec<String>,
    /// 새로 만들 제품 이름
    pub product_name: String,
    /// 제품과 저장소에 적용할 자격증명 이름
    pub gpg_key: Option<String>,
}

/// 저장소 탐색 결과
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub product: Product,
    pub repositories: Vec<Repository>,
}

/// 대화형 세션
pub trait Session: Send + Sync {
    /// 작업할 조직을 선택합니다.
    fn select_organization(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Organization, HarnessError>> + Send;

    /// 선택된 조직
    fn organization(&self) -> Option<&Organization>;

    /// 자격증명 목록 검색. 이름에 `query`가 포함된 항목을 반환합니다.
    fn search_content_credentials(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<String>, HarnessError>> + Send;

    /// 키 파일을 읽어 자격증명을 가져옵니다.
    fn import_content_credential(
        &self,
        name: &str,
        content_type: ContentType,
        key_path: &Path,
    ) -> impl Future<Output = Result<ContentCredential, HarnessError>> + Send;

    fn read_content_credential(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<CredentialDetails, HarnessError>> + Send;

    fn update_content_credential(
        &self,
        name: &str,
        new_name: &str,
    ) -> impl Future<Output = Result<ContentCredential, HarnessError>> + Send;

    fn delete_content_credential(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), HarnessError>> + Send;

    /// 제품 생성 화면. `gpg_key`는 자격증명 이름입니다.
    fn create_product(
        &self,
        name: &str,
        gpg_key: Option<&str>,
    ) -> impl Future<Output = Result<Product, HarnessError>> + Send;

    fn read_product(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ProductDetails, HarnessError>> + Send;

    fn read_repository(
        &self,
        product: &str,
        name: &str,
    ) -> impl Future<Output = Result<RepositoryContent, HarnessError>> + Send;

    fn discover_repositories(
        &self,
        request: &DiscoveryRequest,
    ) -> impl Future<Output = Result<DiscoveryOutcome, HarnessError>> + Send;

    fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> impl Future<Output = Result<LdapAuthSource, HarnessError>> + Send;

    /// 이름이 정확히 일치하는 인증 소스 이름 목록
    fn search_auth_source(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, HarnessError>> + Send;

    fn delete_auth_source(&self, name: &str)
    -> impl Future<Output = Result<(), HarnessError>> + Send;
}

/// 엔티티 API 기반 세션
pub struct ApiSession<A> {
    api: Arc<A>,
    organization: Option<Organization>,
}

impl<A: EntityApi> ApiSession<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            organization: None,
        }
    }

    fn org_id(&self) -> Result<EntityId, HarnessError> {
        self.organization
            .as_ref()
            .map(|o| o.id)
            .ok_or(HarnessError::NoOrganizationSelected)
    }

    async fn credential_by_name(&self, name: &str) -> Result<ContentCredential, HarnessError> {
        let org = self.org_id()?;
        self.api
            .find_content_credential(org, name)
            .await?
            .ok_or_else(|| HarnessError::NotFound {
                entity: EntityKind::ContentCredential,
                key: name.to_owned(),
            })
    }

    async fn credential_id(&self, name: Option<&str>) -> Result<Option<EntityId>, HarnessError> {
        match name {
            Some(name) => Ok(Some(self.credential_by_name(name).await?.id)),
            None => Ok(None),
        }
    }

    async fn credential_name(&self, id: Option<EntityId>) -> Result<Option<String>, HarnessError> {
        match id {
            Some(id) => Ok(Some(self.api.read_content_credential(id).await?.name)),
            None => Ok(None),
        }
    }

    async fn product_by_name(&self, name: &str) -> Result<Product, HarnessError> {
        let org = self.org_id()?;
        self.api
            .list_products(org)
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| HarnessError::NotFound {
                entity: EntityKind::Product,
                key: name.to_owned(),
            })
    }
}

impl<A: EntityApi> Session for ApiSession<A> {
    async fn select_organization(&mut self, name: &str) -> Result<Organization, HarnessError> {
        let org = self
            .api
            .find_organization(name)
            .await?
            .ok_or_else(|| HarnessError::NotFound {
                entity: EntityKind::Organization,
                key: name.to_owned(),
            })?;
        debug!(organization = org.name.as_str(), "organization selected");
        self.organization = Some(org.clone());
        Ok(org)
    }

    fn organization(&self) -> Option<&Organization> {
        self.organization.as_ref()
    }

    async fn search_content_credentials(&self, query: &str) -> Result<Vec<String>, HarnessError> {
        let org = self.org_id()?;
        Ok(self
            .api
            .list_content_credentials(org)
            .await?
            .into_iter()
            .filter(|c| c.name.contains(query))
            .map(|c| c.name)
            .collect())
    }

    async fn import_content_credential(
        &self,
        name: &str,
        content_type: ContentType,
        key_path: &Path,
    ) -> Result<ContentCredential, HarnessError> {
        let org = self.org_id()?;
        let content = tokio::fs::read_to_string(key_path).await?;
        let credential = self
            .api
            .create_content_credential(
                org,
                &NewContentCredential {
                    name: name.to_owned(),
                    content_type,
                    content,
                },
            )
            .await?;
        info!(
            credential = credential.name.as_str(),
            key_file = %key_path.display(),
            "content credential imported"
        );
        Ok(credential)
    }

    async fn read_content_credential(&self, name: &str) -> Result<CredentialDetails, HarnessError> {
        let credential = self.credential_by_name(name).await?;
        let used_as = credential.content_type.ui_label().to_owned();
        let usage = self.api.read_content_credential_usage(credential.id).await?;

        let products = usage
            .products
            .into_iter()
            .map(|p| ProductRow {
                name: p.name,
                used_as: used_as.clone(),
            })
            .collect();
        let repositories = usage
            .repositories
            .into_iter()
            .map(|r| RepositoryRow {
                name: r.name,
                product: r.product_name,
                repo_type: r.content_type.as_str().to_owned(),
                used_as: used_as.clone(),
            })
            .collect();

        Ok(CredentialDetails {
            name: credential.name,
            products,
            repositories,
        })
    }

    async fn update_content_credential(
        &self,
        name: &str,
        new_name: &str,
    ) -> Result<ContentCredential, HarnessError> {
        let credential = self.credential_by_name(name).await?;
        let updated = self
            .api
            .update_content_credential(credential.id, new_name)
            .await?;
        info!(from = name, to = new_name, "content credential renamed");
        Ok(updated)
    }

    async fn delete_content_credential(&self, name: &str) -> Result<(), HarnessError> {
        let credential = self.credential_by_name(name).await?;
        self.api.delete_content_credential(credential.id).await?;
        info!(credential = name, "content credential deleted");
        Ok(())
    }

    async fn create_product(&self, name: &str, gpg_key: Option<&str>) -> Result<Product, HarnessError> {
        let org = self.org_id()?;
        let gpg_key_id = self.credential_id(gpg_key).await?;
        let product = self
            .api
            .create_product(
                org,
                &NewProduct {
                    name: name.to_owned(),
                    gpg_key_id,
                },
            )
            .await?;
        info!(product = name, gpg_key = gpg_key.unwrap_or(""), "product created");
        Ok(product)
    }

    async fn read_product(&self, name: &str) -> Result<ProductDetails, HarnessError> {
        let product = self.product_by_name(name).await?;
        Ok(ProductDetails {
            gpg_key: self.credential_name(product.gpg_key_id).await?,
            name: product.name,
        })
    }

    async fn read_repository(
        &self,
        product: &str,
        name: &str,
    ) -> Result<RepositoryContent, HarnessError> {
        let org = self.org_id()?;
        let repo = self
            .api
            .list_repositories(org)
            .await?
            .into_iter()
            .find(|r| r.product_name == product && r.name == name)
            .ok_or_else(|| HarnessError::NotFound {
                entity: EntityKind::Repository,
                key: format!("{product}/{name}"),
            })?;
        Ok(RepositoryContent {
            gpg_key: self.credential_name(repo.gpg_key_id).await?,
        })
    }

    async fn discover_repositories(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryOutcome, HarnessError> {
        let org = self.org_id()?;
        let discovered = self
            .api
            .discover_repositories(org, &request.url, request.repo_type)
            .await?;
        debug!(
            url = request.url.as_str(),
            filter = request.repo_type.discovery_label(),
            found = discovered.len(),
            "repositories discovered"
        );

        let mut chosen = Vec::with_capacity(request.selected.len());
        for name in &request.selected {
            let found = discovered
                .iter()
                .find(|d| d.name == *name)
                .ok_or_else(|| HarnessError::Action {
                    action: "discover repositories".to_owned(),
                    reason: format!("repository '{name}' was not discovered at {}", request.url),
                })?;
            chosen.push(found.clone());
        }

        let gpg_key_id = self.credential_id(request.gpg_key.as_deref()).await?;
        let product = self
            .api
            .create_product(
                org,
                &NewProduct {
                    name: request.product_name.clone(),
                    gpg_key_id,
                },
            )
            .await?;

        let mut repositories = Vec::with_capacity(chosen.len());
        for found in chosen {
            let repo = self
                .api
                .create_repository(&NewRepository {
                    name: found.name,
                    product_id: product.id,
                    content_type: request.repo_type,
                    url: found.url,
                    gpg_key_id,
                })
                .await?;
            repositories.push(repo);
        }

        info!(
            product = product.name.as_str(),
            repositories = repositories.len(),
            "discovered repositories created"
        );
        Ok(DiscoveryOutcome {
            product,
            repositories,
        })
    }

    async fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> Result<LdapAuthSource, HarnessError> {
        spec.validate()?;
        let source = self.api.create_auth_source(spec).await?;
        info!(
            auth_source = source.name.as_str(),
            server_type = %source.server_type,
            scoped = spec.is_scoped(),
            "ldap auth source created"
        );
        Ok(source)
    }

    async fn search_auth_source(&self, name: &str) -> Result<Vec<String>, HarnessError> {
        Ok(self
            .api
            .search_auth_sources(name)
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect())
    }

    async fn delete_auth_source(&self, name: &str) -> Result<(), HarnessError> {
        let found = self.api.search_auth_sources(name).await?;
        let source = found.first().ok_or_else(|| HarnessError::NotFound {
            entity: EntityKind::AuthSource,
            key: name.to_owned(),
        })?;
        self.api.delete_auth_source(source.id).await?;
        info!(auth_source = name, "ldap auth source deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use satprobe_core::types::LdapServerType;

    use super::*;
    use crate::memory::InMemoryApplication;

    const KEY: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\nabc\n-----END PGP PUBLIC KEY BLOCK-----\n";

    fn key_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KEY.as_bytes()).unwrap();
        file
    }

    async fn session_with_org() -> (Arc<InMemoryApplication>, ApiSession<InMemoryApplication>) {
        let app = Arc::new(
            InMemoryApplication::new()
                .with_discoverable("http://repos.example.com/", ["fakerepo01", "fakerepo02"]),
        );
        app.create_organization("org").await.unwrap();
        let mut session = ApiSession::new(Arc::clone(&app));
        session.select_organization("org").await.unwrap();
        (app, session)
    }

    #[tokio::test]
    async fn requires_organization() {
        let session = ApiSession::new(Arc::new(InMemoryApplication::new()));
        assert!(session.organization().is_none());
        let err = session.search_content_credentials("x").await.unwrap_err();
        assert!(matches!(err, HarnessError::NoOrganizationSelected));
    }

    #[tokio::test]
    async fn select_unknown_organization_fails() {
        let mut session = ApiSession::new(Arc::new(InMemoryApplication::new()));
        let err = session.select_organization("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn import_reads_key_file_and_lists_credential() {
        let (_app, session) = session_with_org().await;
        let file = key_file();
        session
            .import_content_credential("my-key", ContentType::GpgKey, file.path())
            .await
            .unwrap();
        assert_eq!(
            session.search_content_credentials("my-").await.unwrap(),
            vec!["my-key".to_owned()]
        );
    }

    #[tokio::test]
    async fn import_missing_file_is_io_error() {
        let (_app, session) = session_with_org().await;
        let err = session
            .import_content_credential("k", ContentType::GpgKey, Path::new("/nonexistent/key.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }

    #[tokio::test]
    async fn details_list_only_direct_links() {
        let (app, session) = session_with_org().await;
        let file = key_file();
        let key = session
            .import_content_credential("key", ContentType::GpgKey, file.path())
            .await
            .unwrap();
        let product = session.create_product("prod", Some("key")).await.unwrap();
        app.create_repository(&NewRepository {
            name: "unlinked".to_owned(),
            product_id: product.id,
            content_type: RepositoryType::Yum,
            url: "http://example.com/a/".to_owned(),
            gpg_key_id: None,
        })
        .await
        .unwrap();
        app.create_repository(&NewRepository {
            name: "linked".to_owned(),
            product_id: product.id,
            content_type: RepositoryType::Yum,
            url: "http://example.com/b/".to_owned(),
            gpg_key_id: Some(key.id),
        })
        .await
        .unwrap();

        let details = session.read_content_credential("key").await.unwrap();
        assert_eq!(
            details.products,
            vec![ProductRow {
                name: "prod".to_owned(),
                used_as: "GPG Key".to_owned()
            }]
        );
        assert_eq!(details.repositories.len(), 1);
        assert_eq!(details.repositories[0].name, "linked");
        assert_eq!(details.repositories[0].product, "prod");
        assert_eq!(details.repositories[0].repo_type, "yum");
    }

    #[tokio::test]
    async fn product_and_repository_fields_show_current_name() {
        let (_app, session) = session_with_org().await;
        let file = key_file();
        session
            .import_content_credential("key", ContentType::GpgKey, file.path())
            .await
            .unwrap();
        session.create_product("prod", Some("key")).await.unwrap();
        session.update_content_credential("key", "renamed").await.unwrap();

        let details = session.read_product("prod").await.unwrap();
        assert_eq!(details.gpg_key.as_deref(), Some("renamed"));

        session.delete_content_credential("renamed").await.unwrap();
        assert!(session.read_product("prod").await.unwrap().gpg_key.is_none());
    }

    #[tokio::test]
    async fn discovery_creates_selected_repositories() {
        let (_app, session) = session_with_org().await;
        let file = key_file();
        session
            .import_content_credential("key", ContentType::GpgKey, file.path())
            .await
            .unwrap();
        let outcome = session
            .discover_repositories(&DiscoveryRequest {
                url: "http://repos.example.com/".to_owned(),
                repo_type: RepositoryType::Yum,
                selected: vec!["fakerepo01".to_owned()],
                product_name: "discovered".to_owned(),
                gpg_key: Some("key".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(outcome.repositories.len(), 1);
        assert_eq!(outcome.repositories[0].name, "fakerepo01");
        assert!(outcome.product.gpg_key_id.is_some());

        let repo = session
            .read_repository("discovered", "fakerepo01")
            .await
            .unwrap();
        assert_eq!(repo.gpg_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn discovery_rejects_unknown_selection_before_creating() {
        let (app, session) = session_with_org().await;
        let err = session
            .discover_repositories(&DiscoveryRequest {
                url: "http://repos.example.com/".to_owned(),
                repo_type: RepositoryType::Yum,
                selected: vec!["nope".to_owned()],
                product_name: "discovered".to_owned(),
                gpg_key: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Action { .. }));
        assert!(app.products().is_empty());
    }

    #[tokio::test]
    async fn auth_source_search_and_delete() {
        let (_app, session) = session_with_org().await;
        let spec = LdapAuthSourceSpec::builder("src", "ipa.example.com", LdapServerType::FreeIpa)
            .base_dn("dc=example,dc=com")
            .build()
            .unwrap();
        session.create_auth_source(&spec).await.unwrap();
        assert_eq!(session.search_auth_source("src").await.unwrap(), vec!["src"]);

        session.delete_auth_source("src").await.unwrap();
        assert!(session.search_auth_source("src").await.unwrap().is_empty());
        assert!(session.delete_auth_source("src").await.unwrap_err().is_not_found());
    }
}
