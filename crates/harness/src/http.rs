//! HTTP 엔티티 API 클라이언트
//!
//! [`HttpEntityApi`]는 애플리케이션의 JSON REST API를 `reqwest`로 호출합니다.
//! 기본 인증을 사용하며, 요청 타임아웃과 TLS 검증 여부는 [`ServerConfig`]를 따릅니다.
//!
//! | 엔티티 | 경로 |
//! |--------|------|
//! | 조직 | `/katello/api/organizations` |
//! | 위치 | `/api/locations` |
//! | 자격증명 | `/katello/api/content_credentials` |
//! | 제품 | `/katello/api/products` |
//! | 저장소 | `/katello/api/repositories` |
//! | LDAP 인증 소스 | `/api/auth_source_ldaps` |
//! | 저장소 탐색 | `POST /katello/api/organizations/:id/repo_discover` + `/foreman_tasks/api/tasks/:id` |

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use satprobe_core::config::ServerConfig;
use satprobe_core::metrics as m;
use satprobe_core::types::{
    AttributeMapping, ContentCredential, ContentType, EntityId, EntityKind, LdapAuthSource,
    LdapServerType, Location, Organization, Product, Repository, RepositoryType,
};

use crate::api::{
    AuthSourceUpdate, CredentialProduct, CredentialRepository, CredentialUsage,
    DiscoveredRepository, EntityApi, NewContentCredential, NewProduct, NewRepository,
    ProductUpdate, RepositoryUpdate, discovered_name,
};
use crate::error::HarnessError;
use crate::ldap::LdapAuthSourceSpec;

const ORGANIZATIONS: &str = "/katello/api/organizations";
const LOCATIONS: &str = "/api/locations";
const CONTENT_CREDENTIALS: &str = "/katello/api/content_credentials";
const PRODUCTS: &str = "/katello/api/products";
const REPOSITORIES: &str = "/katello/api/repositories";
const AUTH_SOURCES: &str = "/api/auth_source_ldaps";
const TASKS: &str = "/foreman_tasks/api/tasks";
const STATUS: &str = "/api/status";

/// 애플리케이션 REST API 클라이언트
pub struct HttpEntityApi {
    client: reqwest::Client,
    base: String,
    username: String,
    password: String,
    task_timeout: Duration,
    poll_interval: Duration,
}

impl HttpEntityApi {
    /// 서버 설정으로 클라이언트를 생성합니다.
    ///
    /// # Errors
    ///
    /// URL이 절대 http(s) 주소가 아니거나 HTTP 클라이언트를 만들 수 없으면 `Transport`.
    pub fn new(config: &ServerConfig) -> Result<Self, HarnessError> {
        let parsed = url::Url::parse(&config.url)
            .map_err(|e| HarnessError::Transport(format!("invalid server url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HarnessError::Transport(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| HarnessError::Transport(format!("failed to create http client: {e}")))?;

        Ok(Self {
            client,
            base: config.url.trim_end_matches('/').to_owned(),
            username: config.username.clone(),
            password: config.password.clone(),
            task_timeout: Duration::from_secs(config.task_timeout_secs),
            poll_interval: Duration::from_millis(config.task_poll_interval_ms),
        })
    }

    /// 요청을 보내고 2xx 응답 본문을 반환합니다.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        entity: EntityKind,
        key: &str,
    ) -> Result<Vec<u8>, HarnessError> {
        let url = format!("{}{}", self.base, path);
        debug!(method = %method, url = url.as_str(), "sending api request");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            record_request(false);
            HarnessError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            record_request(false);
            return Err(HarnessError::NotFound {
                entity,
                key: key.to_owned(),
            });
        }
        if !status.is_success() {
            record_request(false);
            let message = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<failed to read response body: {e}>"),
            };
            warn!(status = status.as_u16(), url = url.as_str(), "api request rejected");
            return Err(HarnessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HarnessError::Transport(e.to_string()))?;
        record_request(true);
        Ok(bytes.to_vec())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        entity: EntityKind,
        key: &str,
    ) -> Result<T, HarnessError> {
        let bytes = self.send(method, path, query, body, entity, key).await?;
        serde_json::from_slice(&bytes).map_err(|e| HarnessError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        entity: EntityKind,
        key: &str,
    ) -> Result<T, HarnessError> {
        self.request(Method::GET, path, query, None, entity, key)
            .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        entity: EntityKind,
        key: &str,
    ) -> Result<T, HarnessError> {
        self.request(Method::POST, path, &[], Some(body), entity, key)
            .await
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        entity: EntityKind,
        key: &str,
    ) -> Result<T, HarnessError> {
        self.request(Method::PUT, path, &[], Some(body), entity, key)
            .await
    }

    async fn delete(&self, path: &str, entity: EntityKind, key: &str) -> Result<(), HarnessError> {
        self.send(Method::DELETE, path, &[], None, entity, key)
            .await
            .map(|_| ())
    }

    /// 태스크가 멈출 때까지 폴링합니다.
    async fn wait_for_task(&self, task_id: &str) -> Result<TaskWire, HarnessError> {
        let deadline = tokio::time::Instant::now() + self.task_timeout;
        let path = format!("{TASKS}/{task_id}");
        loop {
            let task: TaskWire = self.get(&path, &[], EntityKind::Repository, task_id).await?;
            if matches!(task.state.as_str(), "stopped" | "paused") {
                let result = task.result.clone().unwrap_or_default();
                if result == "success" {
                    return Ok(task);
                }
                return Err(HarnessError::TaskFailed {
                    task_id: task_id.to_owned(),
                    result,
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HarnessError::TaskTimeout {
                    task_id: task_id.to_owned(),
                    waited_secs: self.task_timeout.as_secs(),
                });
            }
            debug!(task_id, state = task.state.as_str(), "waiting for task");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn record_request(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(m::API_REQUESTS_TOTAL, m::LABEL_RESULT => result).increment(1);
}

/// Foreman 검색 쿼리 (`name = "..."`)
fn name_search(name: &str) -> String {
    format!("name = \"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn full_result() -> (&'static str, String) {
    ("full_result", "true".to_owned())
}

// --- wire types ---

#[derive(Debug, Deserialize)]
struct IdName {
    id: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CredentialWire {
    id: u64,
    name: String,
    content_type: Option<String>,
    organization_id: Option<u64>,
    organization: Option<IdName>,
}

impl CredentialWire {
    fn into_domain(self, fallback_org: Option<EntityId>) -> Result<ContentCredential, HarnessError> {
        let content_type = match self.content_type.as_deref() {
            None => ContentType::GpgKey,
            Some(value) => ContentType::from_api_value(value).ok_or_else(|| {
                HarnessError::Decode(format!("unknown content type '{value}'"))
            })?,
        };
        let organization_id = self
            .organization_id
            .or(self.organization.map(|o| o.id))
            .map(EntityId)
            .or(fallback_org)
            .ok_or_else(|| {
                HarnessError::Decode(format!("credential {} has no organization", self.id))
            })?;
        Ok(ContentCredential {
            id: EntityId(self.id),
            name: self.name,
            content_type,
            organization_id,
        })
    }
}

/// 자격증명 읽기 응답의 관계 목록
#[derive(Debug, Deserialize)]
struct CredentialUsageWire {
    #[serde(default)]
    products: Vec<IdName>,
    #[serde(default)]
    repositories: Vec<UsageRepositoryWire>,
}

#[derive(Debug, Deserialize)]
struct UsageRepositoryWire {
    id: u64,
    name: String,
    content_type: String,
    product: IdName,
}

impl CredentialUsageWire {
    fn into_domain(self) -> Result<CredentialUsage, HarnessError> {
        let repositories = self
            .repositories
            .into_iter()
            .map(|r| {
                let content_type = RepositoryType::parse(&r.content_type).ok_or_else(|| {
                    HarnessError::Decode(format!("unknown repository type '{}'", r.content_type))
                })?;
                Ok(CredentialRepository {
                    id: EntityId(r.id),
                    name: r.name,
                    product_name: r.product.name,
                    content_type,
                })
            })
            .collect::<Result<_, HarnessError>>()?;
        Ok(CredentialUsage {
            products: self
                .products
                .into_iter()
                .map(|p| CredentialProduct {
                    id: EntityId(p.id),
                    name: p.name,
                })
                .collect(),
            repositories,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProductWire {
    id: u64,
    name: String,
    organization_id: Option<u64>,
    organization: Option<IdName>,
    gpg_key_id: Option<u64>,
}

impl ProductWire {
    fn into_domain(self, fallback_org: Option<EntityId>) -> Result<Product, HarnessError> {
        let organization_id = self
            .organization_id
            .or(self.organization.map(|o| o.id))
            .map(EntityId)
            .or(fallback_org)
            .ok_or_else(|| {
                HarnessError::Decode(format!("product {} has no organization", self.id))
            })?;
        Ok(Product {
            id: EntityId(self.id),
            name: self.name,
            organization_id,
            gpg_key_id: self.gpg_key_id.map(EntityId),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryWire {
    id: u64,
    name: String,
    product: IdName,
    content_type: String,
    url: Option<String>,
    gpg_key_id: Option<u64>,
}

impl RepositoryWire {
    fn into_domain(self) -> Result<Repository, HarnessError> {
        let content_type = RepositoryType::parse(&self.content_type).ok_or_else(|| {
            HarnessError::Decode(format!("unknown repository type '{}'", self.content_type))
        })?;
        Ok(Repository {
            id: EntityId(self.id),
            name: self.name,
            product_id: EntityId(self.product.id),
            product_name: self.product.name,
            content_type,
            url: self.url.unwrap_or_default(),
            gpg_key_id: self.gpg_key_id.map(EntityId),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AuthSourceWire {
    id: u64,
    name: String,
    host: String,
    port: u16,
    server_type: String,
    #[serde(default)]
    attr_login: String,
    #[serde(default)]
    attr_firstname: String,
    #[serde(default)]
    attr_lastname: String,
    #[serde(default)]
    attr_mail: String,
    account: Option<String>,
    base_dn: Option<String>,
    groups_base: Option<String>,
    #[serde(default)]
    organizations: Vec<IdName>,
    #[serde(default)]
    locations: Vec<IdName>,
}

impl AuthSourceWire {
    fn into_domain(self) -> Result<LdapAuthSource, HarnessError> {
        let server_type = LdapServerType::from_api_value(&self.server_type).ok_or_else(|| {
            HarnessError::Decode(format!("unknown ldap server type '{}'", self.server_type))
        })?;
        Ok(LdapAuthSource {
            id: EntityId(self.id),
            name: self.name,
            host: self.host,
            port: self.port,
            server_type,
            attributes: AttributeMapping {
                login: self.attr_login,
                first_name: self.attr_firstname,
                surname: self.attr_lastname,
                mail: self.attr_mail,
            },
            account: self.account.unwrap_or_default(),
            base_dn: self.base_dn.unwrap_or_default(),
            groups_base: self.groups_base.unwrap_or_default(),
            organization_ids: self.organizations.iter().map(|o| EntityId(o.id)).collect(),
            location_ids: self.locations.iter().map(|l| EntityId(l.id)).collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TaskWire {
    id: String,
    state: String,
    result: Option<String>,
    output: Option<TaskOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskOutput {
    #[serde(default)]
    crawled: Vec<String>,
}

fn organization(wire: IdName) -> Organization {
    Organization {
        id: EntityId(wire.id),
        name: wire.name,
    }
}

fn location(wire: IdName) -> Location {
    Location {
        id: EntityId(wire.id),
        name: wire.name,
    }
}

fn auth_source_body(spec: &LdapAuthSourceSpec) -> Value {
    json!({
        "auth_source_ldap": {
            "name": spec.name,
            "host": spec.host,
            "port": spec.port,
            "server_type": spec.server_type.api_value(),
            "attr_login": spec.attributes.login,
            "attr_firstname": spec.attributes.first_name,
            "attr_lastname": spec.attributes.surname,
            "attr_mail": spec.attributes.mail,
            "account": spec.account,
            "account_password": spec.account_password,
            "base_dn": spec.base_dn,
            "groups_base": spec.groups_base,
            "onthefly_register": spec.onthefly_register,
            "tls": false,
            "organization_ids": spec.organization_ids,
            "location_ids": spec.location_ids,
        }
    })
}

fn gpg_key_value(id: Option<EntityId>) -> Value {
    id.map_or(Value::Null, |id| json!(id.0))
}

impl EntityApi for HttpEntityApi {
    async fn ping(&self) -> Result<(), HarnessError> {
        self.send(Method::GET, STATUS, &[], None, EntityKind::Organization, "status")
            .await
            .map(|_| ())
    }

    async fn create_organization(&self, name: &str) -> Result<Organization, HarnessError> {
        let body = json!({ "organization": { "name": name } });
        let wire: IdName = self
            .post(ORGANIZATIONS, &body, EntityKind::Organization, name)
            .await?;
        Ok(organization(wire))
    }

    async fn read_organization(&self, id: EntityId) -> Result<Organization, HarnessError> {
        let wire: IdName = self
            .get(
                &format!("{ORGANIZATIONS}/{id}"),
                &[],
                EntityKind::Organization,
                &id.to_string(),
            )
            .await?;
        Ok(organization(wire))
    }

    async fn find_organization(&self, name: &str) -> Result<Option<Organization>, HarnessError> {
        let found: Results<IdName> = self
            .get(
                ORGANIZATIONS,
                &[("search", name_search(name))],
                EntityKind::Organization,
                name,
            )
            .await?;
        Ok(found
            .results
            .into_iter()
            .find(|o| o.name == name)
            .map(organization))
    }

    async fn update_organization(
        &self,
        id: EntityId,
        name: &str,
    ) -> Result<Organization, HarnessError> {
        let body = json!({ "organization": { "name": name } });
        let wire: IdName = self
            .put(
                &format!("{ORGANIZATIONS}/{id}"),
                &body,
                EntityKind::Organization,
                &id.to_string(),
            )
            .await?;
        Ok(organization(wire))
    }

    async fn delete_organization(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{ORGANIZATIONS}/{id}"),
            EntityKind::Organization,
            &id.to_string(),
        )
        .await
    }

    async fn create_location(&self, name: &str) -> Result<Location, HarnessError> {
        let body = json!({ "location": { "name": name } });
        let wire: IdName = self
            .post(LOCATIONS, &body, EntityKind::Location, name)
            .await?;
        Ok(location(wire))
    }

    async fn read_location(&self, id: EntityId) -> Result<Location, HarnessError> {
        let wire: IdName = self
            .get(
                &format!("{LOCATIONS}/{id}"),
                &[],
                EntityKind::Location,
                &id.to_string(),
            )
            .await?;
        Ok(location(wire))
    }

    async fn update_location(&self, id: EntityId, name: &str) -> Result<Location, HarnessError> {
        let body = json!({ "location": { "name": name } });
        let wire: IdName = self
            .put(
                &format!("{LOCATIONS}/{id}"),
                &body,
                EntityKind::Location,
                &id.to_string(),
            )
            .await?;
        Ok(location(wire))
    }

    async fn delete_location(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{LOCATIONS}/{id}"),
            EntityKind::Location,
            &id.to_string(),
        )
        .await
    }

    async fn create_content_credential(
        &self,
        organization: EntityId,
        request: &NewContentCredential,
    ) -> Result<ContentCredential, HarnessError> {
        let body = json!({
            "organization_id": organization.0,
            "name": request.name,
            "content_type": request.content_type.api_value(),
            "content": request.content,
        });
        let wire: CredentialWire = self
            .post(
                CONTENT_CREDENTIALS,
                &body,
                EntityKind::ContentCredential,
                &request.name,
            )
            .await?;
        wire.into_domain(Some(organization))
    }

    async fn read_content_credential(&self, id: EntityId) -> Result<ContentCredential, HarnessError> {
        let wire: CredentialWire = self
            .get(
                &format!("{CONTENT_CREDENTIALS}/{id}"),
                &[],
                EntityKind::ContentCredential,
                &id.to_string(),
            )
            .await?;
        wire.into_domain(None)
    }

    async fn read_content_credential_usage(
        &self,
        id: EntityId,
    ) -> Result<CredentialUsage, HarnessError> {
        let wire: CredentialUsageWire = self
            .get(
                &format!("{CONTENT_CREDENTIALS}/{id}"),
                &[],
                EntityKind::ContentCredential,
                &id.to_string(),
            )
            .await?;
        wire.into_domain()
    }

    async fn find_content_credential(
        &self,
        organization: EntityId,
        name: &str,
    ) -> Result<Option<ContentCredential>, HarnessError> {
        let found: Results<CredentialWire> = self
            .get(
                CONTENT_CREDENTIALS,
                &[
                    ("organization_id", organization.to_string()),
                    ("name", name.to_owned()),
                ],
                EntityKind::ContentCredential,
                name,
            )
            .await?;
        found
            .results
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.into_domain(Some(organization)))
            .transpose()
    }

    async fn list_content_credentials(
        &self,
        organization: EntityId,
    ) -> Result<Vec<ContentCredential>, HarnessError> {
        let found: Results<CredentialWire> = self
            .get(
                CONTENT_CREDENTIALS,
                &[("organization_id", organization.to_string()), full_result()],
                EntityKind::ContentCredential,
                &organization.to_string(),
            )
            .await?;
        found
            .results
            .into_iter()
            .map(|c| c.into_domain(Some(organization)))
            .collect()
    }

    async fn update_content_credential(
        &self,
        id: EntityId,
        name: &str,
    ) -> Result<ContentCredential, HarnessError> {
        let body = json!({ "name": name });
        let wire: CredentialWire = self
            .put(
                &format!("{CONTENT_CREDENTIALS}/{id}"),
                &body,
                EntityKind::ContentCredential,
                &id.to_string(),
            )
            .await?;
        wire.into_domain(None)
    }

    async fn delete_content_credential(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{CONTENT_CREDENTIALS}/{id}"),
            EntityKind::ContentCredential,
            &id.to_string(),
        )
        .await
    }

    async fn create_product(
        &self,
        organization: EntityId,
        request: &NewProduct,
    ) -> Result<Product, HarnessError> {
        let body = json!({
            "organization_id": organization.0,
            "name": request.name,
            "gpg_key_id": gpg_key_value(request.gpg_key_id),
        });
        let wire: ProductWire = self
            .post(PRODUCTS, &body, EntityKind::Product, &request.name)
            .await?;
        wire.into_domain(Some(organization))
    }

    async fn read_product(&self, id: EntityId) -> Result<Product, HarnessError> {
        let wire: ProductWire = self
            .get(
                &format!("{PRODUCTS}/{id}"),
                &[],
                EntityKind::Product,
                &id.to_string(),
            )
            .await?;
        wire.into_domain(None)
    }

    async fn list_products(&self, organization: EntityId) -> Result<Vec<Product>, HarnessError> {
        let found: Results<ProductWire> = self
            .get(
                PRODUCTS,
                &[("organization_id", organization.to_string()), full_result()],
                EntityKind::Product,
                &organization.to_string(),
            )
            .await?;
        found
            .results
            .into_iter()
            .map(|p| p.into_domain(Some(organization)))
            .collect()
    }

    async fn update_product(
        &self,
        id: EntityId,
        update: &ProductUpdate,
    ) -> Result<Product, HarnessError> {
        let body =
            serde_json::to_value(update).map_err(|e| HarnessError::Decode(e.to_string()))?;
        let wire: ProductWire = self
            .put(
                &format!("{PRODUCTS}/{id}"),
                &body,
                EntityKind::Product,
                &id.to_string(),
            )
            .await?;
        wire.into_domain(None)
    }

    async fn delete_product(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{PRODUCTS}/{id}"),
            EntityKind::Product,
            &id.to_string(),
        )
        .await
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<Repository, HarnessError> {
        let body = json!({
            "product_id": request.product_id.0,
            "name": request.name,
            "content_type": request.content_type.as_str(),
            "url": request.url,
            "gpg_key_id": gpg_key_value(request.gpg_key_id),
        });
        let wire: RepositoryWire = self
            .post(REPOSITORIES, &body, EntityKind::Repository, &request.name)
            .await?;
        wire.into_domain()
    }

    async fn read_repository(&self, id: EntityId) -> Result<Repository, HarnessError> {
        let wire: RepositoryWire = self
            .get(
                &format!("{REPOSITORIES}/{id}"),
                &[],
                EntityKind::Repository,
                &id.to_string(),
            )
            .await?;
        wire.into_domain()
    }

    async fn list_repositories(
        &self,
        organization: EntityId,
    ) -> Result<Vec<Repository>, HarnessError> {
        let found: Results<RepositoryWire> = self
            .get(
                REPOSITORIES,
                &[("organization_id", organization.to_string()), full_result()],
                EntityKind::Repository,
                &organization.to_string(),
            )
            .await?;
        found
            .results
            .into_iter()
            .map(RepositoryWire::into_domain)
            .collect()
    }

    async fn update_repository(
        &self,
        id: EntityId,
        update: &RepositoryUpdate,
    ) -> Result<Repository, HarnessError> {
        let body =
            serde_json::to_value(update).map_err(|e| HarnessError::Decode(e.to_string()))?;
        let wire: RepositoryWire = self
            .put(
                &format!("{REPOSITORIES}/{id}"),
                &body,
                EntityKind::Repository,
                &id.to_string(),
            )
            .await?;
        wire.into_domain()
    }

    async fn delete_repository(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{REPOSITORIES}/{id}"),
            EntityKind::Repository,
            &id.to_string(),
        )
        .await
    }

    async fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> Result<LdapAuthSource, HarnessError> {
        let wire: AuthSourceWire = self
            .post(
                AUTH_SOURCES,
                &auth_source_body(spec),
                EntityKind::AuthSource,
                &spec.name,
            )
            .await?;
        wire.into_domain()
    }

    async fn read_auth_source(&self, id: EntityId) -> Result<LdapAuthSource, HarnessError> {
        let wire: AuthSourceWire = self
            .get(
                &format!("{AUTH_SOURCES}/{id}"),
                &[],
                EntityKind::AuthSource,
                &id.to_string(),
            )
            .await?;
        wire.into_domain()
    }

    async fn search_auth_sources(&self, name: &str) -> Result<Vec<LdapAuthSource>, HarnessError> {
        let found: Results<AuthSourceWire> = self
            .get(
                AUTH_SOURCES,
                &[("search", name_search(name))],
                EntityKind::AuthSource,
                name,
            )
            .await?;
        found
            .results
            .into_iter()
            .filter(|a| a.name == name)
            .map(AuthSourceWire::into_domain)
            .collect()
    }

    async fn update_auth_source(
        &self,
        id: EntityId,
        update: &AuthSourceUpdate,
    ) -> Result<LdapAuthSource, HarnessError> {
        let body = json!({
            "auth_source_ldap":
                serde_json::to_value(update).map_err(|e| HarnessError::Decode(e.to_string()))?
        });
        let wire: AuthSourceWire = self
            .put(
                &format!("{AUTH_SOURCES}/{id}"),
                &body,
                EntityKind::AuthSource,
                &id.to_string(),
            )
            .await?;
        wire.into_domain()
    }

    async fn delete_auth_source(&self, id: EntityId) -> Result<(), HarnessError> {
        self.delete(
            &format!("{AUTH_SOURCES}/{id}"),
            EntityKind::AuthSource,
            &id.to_string(),
        )
        .await
    }

    async fn discover_repositories(
        &self,
        organization: EntityId,
        url: &str,
        content_type: RepositoryType,
    ) -> Result<Vec<DiscoveredRepository>, HarnessError> {
        let body = json!({ "url": url, "content_type": content_type.as_str() });
        let task: TaskWire = self
            .post(
                &format!("{ORGANIZATIONS}/{organization}/repo_discover"),
                &body,
                EntityKind::Repository,
                url,
            )
            .await?;
        debug!(task_id = task.id.as_str(), url, "repository discovery started");

        let finished = self.wait_for_task(&task.id).await?;
        let crawled = finished.output.unwrap_or_default().crawled;
        Ok(crawled
            .into_iter()
            .filter_map(|found| {
                discovered_name(&found).map(|name| DiscoveredRepository { name, url: found })
            })
            .collect())
    }
}
