//! 메모리 내 애플리케이션 -- 테스트용 [`EntityApi`] 구현
//!
//! 실제 애플리케이션의 관측 가능한 규칙을 따릅니다.
//!
//! - 자격증명/제품 이름은 조직 안에서, 저장소 이름은 제품 안에서,
//!   인증 소스 이름은 전역에서 유일합니다 (위반 시 422).
//! - 자격증명을 삭제하면 이를 참조하던 제품/저장소의 연결이 해제됩니다.
//! - 제품을 삭제하면 그 저장소도 삭제됩니다.
//! - 저장소는 제품의 자격증명을 상속하지 않습니다.
//!
//! `with_*` 빌더로 탐색 결과와 장애를 주입할 수 있습니다.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use satprobe_core::types::{
    ContentCredential, EntityId, EntityKind, LdapAuthSource, Location, Organization, Product,
    Repository, RepositoryType,
};

use crate::api::{
    AuthSourceUpdate, CredentialProduct, CredentialRepository, CredentialUsage,
    DiscoveredRepository, EntityApi, NewContentCredential, NewProduct, NewRepository,
    ProductUpdate, RepositoryUpdate,
};
use crate::error::HarnessError;
use crate::ldap::LdapAuthSourceSpec;

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    organizations: BTreeMap<EntityId, Organization>,
    locations: BTreeMap<EntityId, Location>,
    credentials: BTreeMap<EntityId, ContentCredential>,
    products: BTreeMap<EntityId, Product>,
    repositories: BTreeMap<EntityId, Repository>,
    auth_sources: BTreeMap<EntityId, LdapAuthSource>,
    reads: u64,
}

impl State {
    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    fn require_organization(&self, id: EntityId) -> Result<(), HarnessError> {
        if self.organizations.contains_key(&id) {
            Ok(())
        } else {
            Err(not_found(EntityKind::Organization, id))
        }
    }

    fn require_credential(&self, id: Option<EntityId>) -> Result<(), HarnessError> {
        match id {
            Some(id) if !self.credentials.contains_key(&id) => {
                Err(unprocessable(&format!("Content credential {id} does not exist")))
            }
            _ => Ok(()),
        }
    }
}

/// 테스트용 메모리 내 애플리케이션
#[derive(Debug, Default)]
pub struct InMemoryApplication {
    state: Mutex<State>,
    discoverable: HashMap<String, Vec<String>>,
    failing: HashSet<EntityKind>,
    unreachable: bool,
    inherit_keys: bool,
}

impl InMemoryApplication {
    pub fn new() -> Self {
        Self::default()
    }

    /// `url` 아래에서 탐색될 저장소 이름을 등록합니다.
    pub fn with_discoverable<I, S>(mut self, url: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discoverable.insert(
            normalize_url(url),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// 해당 종류의 엔티티 생성을 422로 실패시킵니다.
    pub fn fail_on(mut self, entity: EntityKind) -> Self {
        self.failing.insert(entity);
        self
    }

    /// 모든 연결 확인(`ping`)을 실패시킵니다.
    pub fn with_unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// 자격증명이 없는 저장소가 제품의 자격증명을 보고하도록 합니다.
    ///
    /// 연관 검증이 상속 동작을 잡아내는지 확인하는 장애 주입용입니다.
    pub fn with_key_inheritance(mut self) -> Self {
        self.inherit_keys = true;
        self
    }

    /// 지금까지 처리한 읽기 요청 수
    pub fn read_count(&self) -> u64 {
        self.lock().reads
    }

    pub fn credentials(&self) -> Vec<ContentCredential> {
        self.lock().credentials.values().cloned().collect()
    }

    pub fn products(&self) -> Vec<Product> {
        self.lock().products.values().cloned().collect()
    }

    pub fn repositories(&self) -> Vec<Repository> {
        self.lock().repositories.values().cloned().collect()
    }

    pub fn auth_sources(&self) -> Vec<LdapAuthSource> {
        self.lock().auth_sources.values().cloned().collect()
    }

    pub fn organizations(&self) -> Vec<Organization> {
        self.lock().organizations.values().cloned().collect()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.lock().locations.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self, entity: EntityKind) -> Result<(), HarnessError> {
        if self.failing.contains(&entity) {
            return Err(HarnessError::Api {
                status: 422,
                message: format!("{{\"error\":{{\"message\":\"injected failure creating {entity}\"}}}}"),
            });
        }
        Ok(())
    }

    fn observed_repository(&self, state: &State, repo: &Repository) -> Repository {
        let mut repo = repo.clone();
        if self.inherit_keys && repo.gpg_key_id.is_none() {
            repo.gpg_key_id = state
                .products
                .get(&repo.product_id)
                .and_then(|p| p.gpg_key_id);
        }
        repo
    }
}

fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

fn not_found(entity: EntityKind, id: EntityId) -> HarnessError {
    HarnessError::NotFound {
        entity,
        key: id.to_string(),
    }
}

fn unprocessable(message: &str) -> HarnessError {
    HarnessError::Api {
        status: 422,
        message: format!("{{\"error\":{{\"message\":\"{message}\"}}}}"),
    }
}

fn name_taken() -> HarnessError {
    unprocessable("Name has already been taken")
}

fn require_name(name: &str) -> Result<(), HarnessError> {
    if name.trim().is_empty() {
        return Err(unprocessable("Name can't be blank"));
    }
    Ok(())
}

impl EntityApi for InMemoryApplication {
    async fn ping(&self) -> Result<(), HarnessError> {
        if self.unreachable {
            return Err(HarnessError::Transport("connection refused".to_owned()));
        }
        Ok(())
    }

    async fn create_organization(&self, name: &str) -> Result<Organization, HarnessError> {
        self.check_failure(EntityKind::Organization)?;
        require_name(name)?;
        let mut state = self.lock();
        if state.organizations.values().any(|o| o.name == name) {
            return Err(name_taken());
        }
        let org = Organization {
            id: state.allocate(),
            name: name.to_owned(),
        };
        state.organizations.insert(org.id, org.clone());
        Ok(org)
    }

    async fn read_organization(&self, id: EntityId) -> Result<Organization, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        state
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Organization, id))
    }

    async fn find_organization(&self, name: &str) -> Result<Option<Organization>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state
            .organizations
            .values()
            .find(|o| o.name == name)
            .cloned())
    }

    async fn update_organization(
        &self,
        id: EntityId,
        name: &str,
    ) -> Result<Organization, HarnessError> {
        require_name(name)?;
        let mut state = self.lock();
        if state
            .organizations
            .values()
            .any(|o| o.name == name && o.id != id)
        {
            return Err(name_taken());
        }
        let org = state
            .organizations
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Organization, id))?;
        org.name = name.to_owned();
        Ok(org.clone())
    }

    async fn delete_organization(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .organizations
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Organization, id))?;
        let products: HashSet<EntityId> = state
            .products
            .values()
            .filter(|p| p.organization_id == id)
            .map(|p| p.id)
            .collect();
        state
            .repositories
            .retain(|_, r| !products.contains(&r.product_id));
        state.products.retain(|_, p| p.organization_id != id);
        state.credentials.retain(|_, c| c.organization_id != id);
        for source in state.auth_sources.values_mut() {
            source.organization_ids.retain(|o| *o != id);
        }
        Ok(())
    }

    async fn create_location(&self, name: &str) -> Result<Location, HarnessError> {
        self.check_failure(EntityKind::Location)?;
        require_name(name)?;
        let mut state = self.lock();
        if state.locations.values().any(|l| l.name == name) {
            return Err(name_taken());
        }
        let location = Location {
            id: state.allocate(),
            name: name.to_owned(),
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn read_location(&self, id: EntityId) -> Result<Location, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        state
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Location, id))
    }

    async fn update_location(&self, id: EntityId, name: &str) -> Result<Location, HarnessError> {
        require_name(name)?;
        let mut state = self.lock();
        let location = state
            .locations
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Location, id))?;
        location.name = name.to_owned();
        Ok(location.clone())
    }

    async fn delete_location(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .locations
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Location, id))?;
        for source in state.auth_sources.values_mut() {
            source.location_ids.retain(|l| *l != id);
        }
        Ok(())
    }

    async fn create_content_credential(
        &self,
        organization: EntityId,
        request: &NewContentCredential,
    ) -> Result<ContentCredential, HarnessError> {
        self.check_failure(EntityKind::ContentCredential)?;
        require_name(&request.name)?;
        if request.content.trim().is_empty() {
            return Err(unprocessable("Content can't be blank"));
        }
        let mut state = self.lock();
        state.require_organization(organization)?;
        if state
            .credentials
            .values()
            .any(|c| c.organization_id == organization && c.name == request.name)
        {
            return Err(name_taken());
        }
        let credential = ContentCredential {
            id: state.allocate(),
            name: request.name.clone(),
            content_type: request.content_type,
            organization_id: organization,
        };
        state.credentials.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn read_content_credential(&self, id: EntityId) -> Result<ContentCredential, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        state
            .credentials
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::ContentCredential, id))
    }

    async fn read_content_credential_usage(
        &self,
        id: EntityId,
    ) -> Result<CredentialUsage, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        if !state.credentials.contains_key(&id) {
            return Err(not_found(EntityKind::ContentCredential, id));
        }
        let products = state
            .products
            .values()
            .filter(|p| p.gpg_key_id == Some(id))
            .map(|p| CredentialProduct {
                id: p.id,
                name: p.name.clone(),
            })
            .collect();
        let repositories = state
            .repositories
            .values()
            .map(|r| self.observed_repository(&state, r))
            .filter(|r| r.gpg_key_id == Some(id))
            .map(|r| CredentialRepository {
                id: r.id,
                name: r.name,
                product_name: r.product_name,
                content_type: r.content_type,
            })
            .collect();
        Ok(CredentialUsage {
            products,
            repositories,
        })
    }

    async fn find_content_credential(
        &self,
        organization: EntityId,
        name: &str,
    ) -> Result<Option<ContentCredential>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state
            .credentials
            .values()
            .find(|c| c.organization_id == organization && c.name == name)
            .cloned())
    }

    async fn list_content_credentials(
        &self,
        organization: EntityId,
    ) -> Result<Vec<ContentCredential>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state
            .credentials
            .values()
            .filter(|c| c.organization_id == organization)
            .cloned()
            .collect())
    }

    async fn update_content_credential(
        &self,
        id: EntityId,
        name: &str,
    ) -> Result<ContentCredential, HarnessError> {
        require_name(name)?;
        let mut state = self.lock();
        let organization = state
            .credentials
            .get(&id)
            .map(|c| c.organization_id)
            .ok_or_else(|| not_found(EntityKind::ContentCredential, id))?;
        if state
            .credentials
            .values()
            .any(|c| c.organization_id == organization && c.name == name && c.id != id)
        {
            return Err(name_taken());
        }
        let credential = state
            .credentials
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::ContentCredential, id))?;
        credential.name = name.to_owned();
        Ok(credential.clone())
    }

    async fn delete_content_credential(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .credentials
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::ContentCredential, id))?;
        for product in state.products.values_mut() {
            if product.gpg_key_id == Some(id) {
                product.gpg_key_id = None;
            }
        }
        for repo in state.repositories.values_mut() {
            if repo.gpg_key_id == Some(id) {
                repo.gpg_key_id = None;
            }
        }
        Ok(())
    }

    async fn create_product(
        &self,
        organization: EntityId,
        request: &NewProduct,
    ) -> Result<Product, HarnessError> {
        self.check_failure(EntityKind::Product)?;
        require_name(&request.name)?;
        let mut state = self.lock();
        state.require_organization(organization)?;
        state.require_credential(request.gpg_key_id)?;
        if state
            .products
            .values()
            .any(|p| p.organization_id == organization && p.name == request.name)
        {
            return Err(name_taken());
        }
        let product = Product {
            id: state.allocate(),
            name: request.name.clone(),
            organization_id: organization,
            gpg_key_id: request.gpg_key_id,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn read_product(&self, id: EntityId) -> Result<Product, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Product, id))
    }

    async fn list_products(&self, organization: EntityId) -> Result<Vec<Product>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state
            .products
            .values()
            .filter(|p| p.organization_id == organization)
            .cloned()
            .collect())
    }

    async fn update_product(
        &self,
        id: EntityId,
        update: &ProductUpdate,
    ) -> Result<Product, HarnessError> {
        let mut state = self.lock();
        let current = state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Product, id))?;
        if let Some(name) = &update.name {
            require_name(name)?;
            if state.products.values().any(|p| {
                p.organization_id == current.organization_id && p.name == *name && p.id != id
            }) {
                return Err(name_taken());
            }
        }
        if let Some(key) = update.gpg_key_id {
            state.require_credential(key)?;
        }

        let renamed = update.name.clone();
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Product, id))?;
        if let Some(name) = &renamed {
            product.name = name.clone();
        }
        if let Some(key) = update.gpg_key_id {
            product.gpg_key_id = key;
        }
        let product = product.clone();
        if let Some(name) = renamed {
            for repo in state.repositories.values_mut() {
                if repo.product_id == id {
                    repo.product_name = name.clone();
                }
            }
        }
        Ok(product)
    }

    async fn delete_product(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .products
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Product, id))?;
        state.repositories.retain(|_, r| r.product_id != id);
        Ok(())
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<Repository, HarnessError> {
        self.check_failure(EntityKind::Repository)?;
        require_name(&request.name)?;
        let mut state = self.lock();
        let product_name = state
            .products
            .get(&request.product_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| not_found(EntityKind::Product, request.product_id))?;
        state.require_credential(request.gpg_key_id)?;
        if state
            .repositories
            .values()
            .any(|r| r.product_id == request.product_id && r.name == request.name)
        {
            return Err(name_taken());
        }
        let repo = Repository {
            id: state.allocate(),
            name: request.name.clone(),
            product_id: request.product_id,
            product_name,
            content_type: request.content_type,
            url: request.url.clone(),
            gpg_key_id: request.gpg_key_id,
        };
        state.repositories.insert(repo.id, repo.clone());
        Ok(repo)
    }

    async fn read_repository(&self, id: EntityId) -> Result<Repository, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        let repo = state
            .repositories
            .get(&id)
            .ok_or_else(|| not_found(EntityKind::Repository, id))?;
        Ok(self.observed_repository(&state, repo))
    }

    async fn list_repositories(
        &self,
        organization: EntityId,
    ) -> Result<Vec<Repository>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        let products: HashSet<EntityId> = state
            .products
            .values()
            .filter(|p| p.organization_id == organization)
            .map(|p| p.id)
            .collect();
        Ok(state
            .repositories
            .values()
            .filter(|r| products.contains(&r.product_id))
            .map(|r| self.observed_repository(&state, r))
            .collect())
    }

    async fn update_repository(
        &self,
        id: EntityId,
        update: &RepositoryUpdate,
    ) -> Result<Repository, HarnessError> {
        let mut state = self.lock();
        let current = state
            .repositories
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Repository, id))?;
        if let Some(name) = &update.name {
            require_name(name)?;
            if state
                .repositories
                .values()
                .any(|r| r.product_id == current.product_id && r.name == *name && r.id != id)
            {
                return Err(name_taken());
            }
        }
        if let Some(key) = update.gpg_key_id {
            state.require_credential(key)?;
        }
        let repo = state
            .repositories
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Repository, id))?;
        if let Some(name) = &update.name {
            repo.name = name.clone();
        }
        if let Some(key) = update.gpg_key_id {
            repo.gpg_key_id = key;
        }
        Ok(repo.clone())
    }

    async fn delete_repository(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .repositories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(EntityKind::Repository, id))
    }

    async fn create_auth_source(
        &self,
        spec: &LdapAuthSourceSpec,
    ) -> Result<LdapAuthSource, HarnessError> {
        self.check_failure(EntityKind::AuthSource)?;
        spec.validate()
            .map_err(|e| unprocessable(&e.to_string()))?;
        let mut state = self.lock();
        if state.auth_sources.values().any(|a| a.name == spec.name) {
            return Err(name_taken());
        }
        for org in &spec.organization_ids {
            state.require_organization(*org)?;
        }
        for loc in &spec.location_ids {
            if !state.locations.contains_key(loc) {
                return Err(not_found(EntityKind::Location, *loc));
            }
        }
        let source = LdapAuthSource {
            id: state.allocate(),
            name: spec.name.clone(),
            host: spec.host.clone(),
            port: spec.port,
            server_type: spec.server_type,
            attributes: spec.attributes.clone(),
            account: spec.account.clone(),
            base_dn: spec.base_dn.clone(),
            groups_base: spec.groups_base.clone(),
            organization_ids: spec.organization_ids.clone(),
            location_ids: spec.location_ids.clone(),
        };
        state.auth_sources.insert(source.id, source.clone());
        Ok(source)
    }

    async fn read_auth_source(&self, id: EntityId) -> Result<LdapAuthSource, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        state
            .auth_sources
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::AuthSource, id))
    }

    async fn search_auth_sources(&self, name: &str) -> Result<Vec<LdapAuthSource>, HarnessError> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state
            .auth_sources
            .values()
            .filter(|a| a.name == name)
            .cloned()
            .collect())
    }

    async fn update_auth_source(
        &self,
        id: EntityId,
        update: &AuthSourceUpdate,
    ) -> Result<LdapAuthSource, HarnessError> {
        let mut state = self.lock();
        if let Some(name) = &update.name {
            require_name(name)?;
            if state
                .auth_sources
                .values()
                .any(|a| a.name == *name && a.id != id)
            {
                return Err(name_taken());
            }
        }
        let source = state
            .auth_sources
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::AuthSource, id))?;
        if let Some(name) = &update.name {
            source.name = name.clone();
        }
        if let Some(orgs) = &update.organization_ids {
            source.organization_ids = orgs.clone();
        }
        if let Some(locs) = &update.location_ids {
            source.location_ids = locs.clone();
        }
        Ok(source.clone())
    }

    async fn delete_auth_source(&self, id: EntityId) -> Result<(), HarnessError> {
        let mut state = self.lock();
        state
            .auth_sources
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(EntityKind::AuthSource, id))
    }

    async fn discover_repositories(
        &self,
        organization: EntityId,
        url: &str,
        _content_type: RepositoryType,
    ) -> Result<Vec<DiscoveredRepository>, HarnessError> {
        self.lock().require_organization(organization)?;
        let base = normalize_url(url);
        let names = self.discoverable.get(&base).cloned().unwrap_or_default();
        Ok(names
            .into_iter()
            .map(|name| DiscoveredRepository {
                url: format!("{base}/{name}/"),
                name,
            })
            .collect())
    }
}
