//! 시나리오 정의와 실행
//!
//! [`Scenario`]는 단계([`Step`])의 순서 있는 목록입니다. [`ScenarioDriver`]는 단계를
//! 적힌 순서대로 실행하며, 핸들을 생성된 엔티티에 바인딩하고, 연관 모델에 연산을
//! 반영하고, 검증 단계에서 [`StateVerifier`]를 호출합니다. 첫 에러에서 시나리오가 중단됩니다.
//!
//! # 단계 분류
//!
//! | 분류 | 단계 | 실패 시 |
//! |------|------|---------|
//! | 준비 | API로 만드는 자격증명/제품, 저장소 | `Fixture` |
//! | 동작 | 가져오기, 화면 제품 생성, 탐색, 이름 변경, 삭제, 인증 소스 생성/삭제 | `Action` |
//! | 검증 | `Verify*` | `Mismatch` (그 외 에러는 `Action`) |
//!
//! # 컨텍스트
//!
//! 시나리오가 쓰는 조직, 키, 저장소 URL, LDAP 설정, 이름 전략은 모두
//! [`ScenarioContext`]로 명시적으로 전달됩니다. 조직 공유는 [`SharedFixtures`]로만 가능합니다.
//! 인증 소스 단계만 있는 시나리오는 조직 없이 실행됩니다.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use satprobe_association::{AssociationModel, Handle, Operation};
use satprobe_core::config::{FixturesConfig, LdapFixtureConfig};
use satprobe_core::types::{
    ContentCredential, ContentType, EntityId, EntityKind, LdapServerType, Organization, Product,
    Repository, RepositoryType,
};

use crate::api::EntityApi;
use crate::error::HarnessError;
use crate::ldap::{AuthSourceLifecycle, LdapAuthSourceSpec, LifecycleState};
use crate::naming::{NameStrategy, RunTag, StringKind};
use crate::provision::FixtureProvisioner;
use crate::session::{DiscoveryRequest, Session};
use crate::verify::StateVerifier;

/// 테스트 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tier1,
    Tier2,
}

impl Tier {
    pub fn level(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Tier1),
            2 => Some(Self::Tier2),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}", self.level())
    }
}

/// 시나리오 실행 전제 조건 (외부 픽스처 환경)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Active Directory 서버 (`[ldap]`)
    Ldap,
    /// IdM/FreeIPA 서버 (`[ipa]`)
    Ipa,
}

impl Requirement {
    pub fn section(&self) -> &'static str {
        match self {
            Self::Ldap => "ldap",
            Self::Ipa => "ipa",
        }
    }
}

/// 엔티티를 만드는 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Via {
    /// 엔티티 API (준비 단계)
    Api,
    /// 화면 동작 (테스트 대상)
    Ui,
}

/// 저장소 URL 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSource {
    Primary,
    Secondary,
}

/// LDAP 픽스처 서버
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LdapFixture {
    Ad,
    Ipa,
}

impl LdapFixture {
    pub fn server_type(&self) -> LdapServerType {
        match self {
            Self::Ad => LdapServerType::ActiveDirectory,
            Self::Ipa => LdapServerType::FreeIpa,
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Self::Ad => Requirement::Ldap,
            Self::Ipa => Requirement::Ipa,
        }
    }
}

/// 시나리오 단계
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    CreateCredential {
        handle: Handle,
        via: Via,
    },
    CreateProduct {
        handle: Handle,
        credential: Option<Handle>,
        via: Via,
    },
    CreateRepository {
        handle: Handle,
        product: Handle,
        credential: Option<Handle>,
        source: RepoSource,
    },
    /// 탐색한 저장소로 새 제품을 만들고 자격증명을 둘 다에 적용
    DiscoverRepositories {
        product: Handle,
        repository: Handle,
        credential: Handle,
    },
    RenameCredential {
        credential: Handle,
    },
    DeleteCredential {
        credential: Handle,
    },
    /// 삭제된 자격증명이면 더 이상 조회되지 않는지 확인
    VerifyAssociations {
        credential: Handle,
    },
    VerifyProductCredential {
        product: Handle,
    },
    VerifyRepositoryCredential {
        repository: Handle,
    },
    VerifyCredentialListed {
        credential: Handle,
    },
    VerifyCredentialAbsent {
        credential: Handle,
    },
    CreateAuthSource {
        handle: Handle,
        server: LdapFixture,
        /// 새 조직/위치를 만들어 범위로 지정
        scoped: bool,
        name_kind: StringKind,
    },
    VerifyAuthSourceListed {
        handle: Handle,
    },
    DeleteAuthSource {
        handle: Handle,
    },
    VerifyAuthSourceAbsent {
        handle: Handle,
    },
}

/// 단계 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup(EntityKind),
    Action,
    Verify,
}

impl Step {
    pub fn create_credential(handle: &str) -> Self {
        Self::CreateCredential {
            handle: handle.into(),
            via: Via::Api,
        }
    }

    pub fn import_credential(handle: &str) -> Self {
        Self::CreateCredential {
            handle: handle.into(),
            via: Via::Ui,
        }
    }

    pub fn create_product(handle: &str, credential: Option<&str>) -> Self {
        Self::CreateProduct {
            handle: handle.into(),
            credential: credential.map(Handle::from),
            via: Via::Api,
        }
    }

    pub fn create_product_ui(handle: &str, credential: Option<&str>) -> Self {
        Self::CreateProduct {
            handle: handle.into(),
            credential: credential.map(Handle::from),
            via: Via::Ui,
        }
    }

    pub fn create_repository(
        handle: &str,
        product: &str,
        credential: Option<&str>,
        source: RepoSource,
    ) -> Self {
        Self::CreateRepository {
            handle: handle.into(),
            product: product.into(),
            credential: credential.map(Handle::from),
            source,
        }
    }

    pub fn discover_repositories(product: &str, repository: &str, credential: &str) -> Self {
        Self::DiscoverRepositories {
            product: product.into(),
            repository: repository.into(),
            credential: credential.into(),
        }
    }

    pub fn rename_credential(credential: &str) -> Self {
        Self::RenameCredential {
            credential: credential.into(),
        }
    }

    pub fn delete_credential(credential: &str) -> Self {
        Self::DeleteCredential {
            credential: credential.into(),
        }
    }

    pub fn verify_associations(credential: &str) -> Self {
        Self::VerifyAssociations {
            credential: credential.into(),
        }
    }

    pub fn verify_product_credential(product: &str) -> Self {
        Self::VerifyProductCredential {
            product: product.into(),
        }
    }

    pub fn verify_repository_credential(repository: &str) -> Self {
        Self::VerifyRepositoryCredential {
            repository: repository.into(),
        }
    }

    pub fn verify_credential_listed(credential: &str) -> Self {
        Self::VerifyCredentialListed {
            credential: credential.into(),
        }
    }

    pub fn verify_credential_absent(credential: &str) -> Self {
        Self::VerifyCredentialAbsent {
            credential: credential.into(),
        }
    }

    pub fn create_auth_source(
        handle: &str,
        server: LdapFixture,
        scoped: bool,
        name_kind: StringKind,
    ) -> Self {
        Self::CreateAuthSource {
            handle: handle.into(),
            server,
            scoped,
            name_kind,
        }
    }

    pub fn verify_auth_source_listed(handle: &str) -> Self {
        Self::VerifyAuthSourceListed {
            handle: handle.into(),
        }
    }

    pub fn delete_auth_source(handle: &str) -> Self {
        Self::DeleteAuthSource {
            handle: handle.into(),
        }
    }

    pub fn verify_auth_source_absent(handle: &str) -> Self {
        Self::VerifyAuthSourceAbsent {
            handle: handle.into(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::CreateCredential { via: Via::Api, .. } => {
                Phase::Setup(EntityKind::ContentCredential)
            }
            Self::CreateProduct { via: Via::Api, .. } => Phase::Setup(EntityKind::Product),
            Self::CreateRepository { .. } => Phase::Setup(EntityKind::Repository),
            Self::CreateCredential { via: Via::Ui, .. }
            | Self::CreateProduct { via: Via::Ui, .. }
            | Self::DiscoverRepositories { .. }
            | Self::RenameCredential { .. }
            | Self::DeleteCredential { .. }
            | Self::CreateAuthSource { .. }
            | Self::DeleteAuthSource { .. } => Phase::Action,
            Self::VerifyAssociations { .. }
            | Self::VerifyProductCredential { .. }
            | Self::VerifyRepositoryCredential { .. }
            | Self::VerifyCredentialListed { .. }
            | Self::VerifyCredentialAbsent { .. }
            | Self::VerifyAuthSourceListed { .. }
            | Self::VerifyAuthSourceAbsent { .. } => Phase::Verify,
        }
    }

    /// 선택된 조직 안에서 실행되는 단계인지
    pub fn needs_organization(&self) -> bool {
        !matches!(
            self,
            Self::CreateAuthSource { .. }
                | Self::VerifyAuthSourceListed { .. }
                | Self::DeleteAuthSource { .. }
                | Self::VerifyAuthSourceAbsent { .. }
        )
    }

    /// 이 단계가 새로 바인딩하는 핸들
    fn binds(&self) -> Vec<&Handle> {
        match self {
            Self::CreateCredential { handle, .. }
            | Self::CreateProduct { handle, .. }
            | Self::CreateRepository { handle, .. }
            | Self::CreateAuthSource { handle, .. } => vec![handle],
            Self::DiscoverRepositories {
                product,
                repository,
                ..
            } => vec![product, repository],
            _ => Vec::new(),
        }
    }

    /// 이 단계가 참조하는 (이미 바인딩되어야 하는) 핸들
    fn references(&self) -> Vec<&Handle> {
        match self {
            Self::CreateCredential { .. } | Self::CreateAuthSource { .. } => Vec::new(),
            Self::CreateProduct { credential, .. } => credential.iter().collect(),
            Self::CreateRepository {
                product,
                credential,
                ..
            } => std::iter::once(product).chain(credential.iter()).collect(),
            Self::DiscoverRepositories { credential, .. }
            | Self::RenameCredential { credential }
            | Self::DeleteCredential { credential }
            | Self::VerifyAssociations { credential }
            | Self::VerifyCredentialListed { credential }
            | Self::VerifyCredentialAbsent { credential } => vec![credential],
            Self::VerifyProductCredential { product } => vec![product],
            Self::VerifyRepositoryCredential { repository } => vec![repository],
            Self::VerifyAuthSourceListed { handle }
            | Self::DeleteAuthSource { handle }
            | Self::VerifyAuthSourceAbsent { handle } => vec![handle],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateCredential { handle, via } => {
                write!(f, "create credential {handle} via {via:?}")
            }
            Self::CreateProduct {
                handle,
                credential,
                via,
            } => match credential {
                Some(c) => write!(f, "create product {handle} linked to {c} via {via:?}"),
                None => write!(f, "create product {handle} via {via:?}"),
            },
            Self::CreateRepository {
                handle,
                product,
                credential,
                ..
            } => match credential {
                Some(c) => write!(f, "create repository {handle} in {product} linked to {c}"),
                None => write!(f, "create repository {handle} in {product}"),
            },
            Self::DiscoverRepositories {
                product,
                repository,
                credential,
            } => write!(
                f,
                "discover repository {repository} into product {product} with {credential}"
            ),
            Self::RenameCredential { credential } => write!(f, "rename credential {credential}"),
            Self::DeleteCredential { credential } => write!(f, "delete credential {credential}"),
            Self::VerifyAssociations { credential } => {
                write!(f, "verify associations of {credential}")
            }
            Self::VerifyProductCredential { product } => {
                write!(f, "verify credential field of product {product}")
            }
            Self::VerifyRepositoryCredential { repository } => {
                write!(f, "verify credential field of repository {repository}")
            }
            Self::VerifyCredentialListed { credential } => {
                write!(f, "verify credential {credential} is listed")
            }
            Self::VerifyCredentialAbsent { credential } => {
                write!(f, "verify credential {credential} is gone")
            }
            Self::CreateAuthSource {
                handle,
                server,
                scoped,
                name_kind,
            } => write!(
                f,
                "create {server:?} auth source {handle} ({name_kind} name{})",
                if *scoped { ", org/loc scoped" } else { "" }
            ),
            Self::VerifyAuthSourceListed { handle } => {
                write!(f, "verify auth source {handle} is listed")
            }
            Self::DeleteAuthSource { handle } => write!(f, "delete auth source {handle}"),
            Self::VerifyAuthSourceAbsent { handle } => {
                write!(f, "verify auth source {handle} is gone")
            }
        }
    }
}

/// 시나리오
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub summary: String,
    pub tier: Tier,
    /// 업그레이드 테스트 대상 여부
    pub upgrade: bool,
    pub requires: Vec<Requirement>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name.into())
    }

    /// 조직을 미리 만들어야 하는 시나리오인지
    pub fn needs_organization(&self) -> bool {
        self.steps.iter().any(Step::needs_organization)
    }

    /// 단계가 아직 바인딩되지 않은 핸들을 참조하거나 핸들을 다시 바인딩하지 않는지 확인합니다.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::InvalidSpec {
                field: "scenario.name".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.steps.is_empty() {
            return Err(HarnessError::InvalidSpec {
                field: format!("scenario '{}'.steps", self.name),
                reason: "must not be empty".to_owned(),
            });
        }

        let mut bound: Vec<&Handle> = Vec::new();
        for step in &self.steps {
            for handle in step.references() {
                if !bound.contains(&handle) {
                    return Err(HarnessError::UnboundHandle(handle.to_string()));
                }
            }
            for handle in step.binds() {
                if bound.contains(&handle) {
                    return Err(HarnessError::InvalidSpec {
                        field: format!("scenario '{}'", self.name),
                        reason: format!("handle '{handle}' is bound twice"),
                    });
                }
                bound.push(handle);
            }
        }
        Ok(())
    }
}

/// [`Scenario`] 빌더
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    scenario: Scenario,
}

impl ScenarioBuilder {
    fn new(name: String) -> Self {
        Self {
            scenario: Scenario {
                name,
                summary: String::new(),
                tier: Tier::Tier2,
                upgrade: false,
                requires: Vec::new(),
                steps: Vec::new(),
            },
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.scenario.summary = summary.into();
        self
    }

    pub fn tier(mut self, tier: Tier) -> Self {
        self.scenario.tier = tier;
        self
    }

    pub fn upgrade(mut self) -> Self {
        self.scenario.upgrade = true;
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        if !self.scenario.requires.contains(&requirement) {
            self.scenario.requires.push(requirement);
        }
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.scenario.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scenario.steps.extend(steps);
        self
    }

    pub fn build(self) -> Scenario {
        self.scenario
    }
}

/// 저장소 탐색 설정
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub url: String,
    pub repo_name: String,
    pub repo_type: RepositoryType,
}

/// 시나리오 하나의 실행 컨텍스트
pub struct ScenarioContext {
    /// 조직이 필요 없는 시나리오는 `None`
    pub organization: Option<Organization>,
    pub gpg_key_path: PathBuf,
    /// 키 파일 내용 (API로 자격증명을 만들 때 사용)
    pub gpg_key_content: String,
    pub repo_url_primary: String,
    pub repo_url_secondary: String,
    pub discovery: DiscoverySettings,
    pub ldap: LdapFixtureConfig,
    pub ipa: LdapFixtureConfig,
    pub names: Box<dyn NameStrategy>,
    /// 전역 유일 이름(범위용 조직/위치, 인증 소스)에 붙일 꼬리표
    pub run_tag: Option<RunTag>,
}

impl ScenarioContext {
    pub fn new(
        organization: Option<Organization>,
        fixtures: &FixturesConfig,
        gpg_key_content: String,
        names: Box<dyn NameStrategy>,
    ) -> Self {
        Self {
            organization,
            gpg_key_path: PathBuf::from(&fixtures.gpg_key_file),
            gpg_key_content,
            repo_url_primary: fixtures.yum_repo_url_1.clone(),
            repo_url_secondary: fixtures.yum_repo_url_2.clone(),
            discovery: DiscoverySettings {
                url: fixtures.discovery_url.clone(),
                repo_name: fixtures.discovery_repo_name.clone(),
                repo_type: RepositoryType::Yum,
            },
            ldap: LdapFixtureConfig::default(),
            ipa: LdapFixtureConfig::default(),
            names,
            run_tag: None,
        }
    }

    pub fn with_run_tag(mut self, run_tag: RunTag) -> Self {
        self.run_tag = Some(run_tag);
        self
    }

    /// 이름 전략의 다음 이름에 실행 꼬리표를 붙입니다.
    pub fn unique_name(&mut self, kind: StringKind) -> String {
        let name = self.names.next_name(kind);
        match self.run_tag {
            Some(tag) => tag.apply(name, kind),
            None => name,
        }
    }

    fn organization_id(&self) -> Result<EntityId, HarnessError> {
        self.organization
            .as_ref()
            .map(|o| o.id)
            .ok_or(HarnessError::NoOrganizationSelected)
    }

    pub fn with_ldap(mut self, ldap: LdapFixtureConfig, ipa: LdapFixtureConfig) -> Self {
        self.ldap = ldap;
        self.ipa = ipa;
        self
    }

    fn repo_url(&self, source: RepoSource) -> &str {
        match source {
            RepoSource::Primary => &self.repo_url_primary,
            RepoSource::Secondary => &self.repo_url_secondary,
        }
    }

    fn ldap_fixture(&self, server: LdapFixture) -> &LdapFixtureConfig {
        match server {
            LdapFixture::Ad => &self.ldap,
            LdapFixture::Ipa => &self.ipa,
        }
    }
}

/// 여러 시나리오가 명시적으로 공유하는 픽스처
#[derive(Debug, Clone, Default)]
pub struct SharedFixtures {
    pub organization: Option<Organization>,
}

impl SharedFixtures {
    pub fn with_organization(organization: Organization) -> Self {
        Self {
            organization: Some(organization),
        }
    }
}

/// 성공한 실행의 기록
#[derive(Debug, Clone)]
pub struct ScenarioTrace {
    pub steps_completed: usize,
    /// 연관 모델에 적용된 연산
    pub operations: Vec<Operation>,
    pub auth_sources: Vec<(Handle, LifecycleState)>,
}

#[derive(Default)]
struct Bindings {
    model: AssociationModel,
    credentials: HashMap<Handle, ContentCredential>,
    products: HashMap<Handle, Product>,
    repositories: HashMap<Handle, Repository>,
    auth_sources: HashMap<Handle, AuthSourceLifecycle>,
}

impl Bindings {
    fn credential(&self, handle: &Handle) -> Result<&ContentCredential, HarnessError> {
        self.credentials
            .get(handle)
            .ok_or_else(|| HarnessError::UnboundHandle(handle.to_string()))
    }

    fn credential_ids(&self, handle: Option<&Handle>) -> Result<Option<EntityId>, HarnessError> {
        handle.map(|h| self.credential(h).map(|c| c.id)).transpose()
    }

    fn product(&self, handle: &Handle) -> Result<&Product, HarnessError> {
        self.products
            .get(handle)
            .ok_or_else(|| HarnessError::UnboundHandle(handle.to_string()))
    }

    /// 이름 변경을 반영한 현재 이름
    fn credential_name(&self, handle: &Handle) -> Result<String, HarnessError> {
        self.model
            .credential_name(handle)
            .map(str::to_owned)
            .ok_or_else(|| HarnessError::UnboundHandle(handle.to_string()))
    }

    fn lifecycle(&mut self, handle: &Handle) -> Result<&mut AuthSourceLifecycle, HarnessError> {
        self.auth_sources
            .get_mut(handle)
            .ok_or_else(|| HarnessError::UnboundHandle(handle.to_string()))
    }

    fn auth_source_name(&self, handle: &Handle) -> Result<String, HarnessError> {
        self.auth_sources
            .get(handle)
            .and_then(|lc| lc.name())
            .map(str::to_owned)
            .ok_or_else(|| HarnessError::UnboundHandle(handle.to_string()))
    }
}

/// 시나리오 실행기
pub struct ScenarioDriver<A, S> {
    provisioner: FixtureProvisioner<A>,
    session: S,
}

impl<A: EntityApi, S: Session> ScenarioDriver<A, S> {
    pub fn new(provisioner: FixtureProvisioner<A>, session: S) -> Self {
        Self {
            provisioner,
            session,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// 단계를 순서대로 실행합니다. 첫 에러에서 중단하고 분류된 에러를 반환합니다.
    pub async fn run(
        &mut self,
        scenario: &Scenario,
        ctx: &mut ScenarioContext,
    ) -> Result<ScenarioTrace, HarnessError> {
        scenario.validate()?;
        if let Some(organization) = &ctx.organization {
            self.session
                .select_organization(&organization.name)
                .await
                .map_err(|e| e.into_fixture(EntityKind::Organization))?;
        }

        let mut bindings = Bindings::default();
        for (index, step) in scenario.steps.iter().enumerate() {
            debug!(scenario = scenario.name.as_str(), index, step = %step, "executing step");
            let action = step.to_string();
            if let Err(err) = self.execute(step, ctx, &mut bindings).await {
                let err = match step.phase() {
                    Phase::Setup(entity) => err.into_fixture(entity),
                    Phase::Action | Phase::Verify => err.into_action(&action),
                };
                warn!(
                    scenario = scenario.name.as_str(),
                    index,
                    step = action.as_str(),
                    kind = %err.failure_kind(),
                    error = %err,
                    "scenario step failed"
                );
                return Err(err);
            }
        }

        info!(
            scenario = scenario.name.as_str(),
            steps = scenario.steps.len(),
            "scenario completed"
        );
        let mut auth_sources: Vec<(Handle, LifecycleState)> = bindings
            .auth_sources
            .iter()
            .map(|(h, lc)| (h.clone(), lc.state()))
            .collect();
        auth_sources.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ScenarioTrace {
            steps_completed: scenario.steps.len(),
            operations: bindings.model.history().to_vec(),
            auth_sources,
        })
    }

    async fn execute(
        &mut self,
        step: &Step,
        ctx: &mut ScenarioContext,
        b: &mut Bindings,
    ) -> Result<(), HarnessError> {
        match step {
            Step::CreateCredential { handle, via } => {
                let name = ctx.names.next_name(StringKind::Alpha);
                b.model
                    .apply(Operation::create_credential(handle.clone(), name.clone()))?;
                let credential = match via {
                    Via::Api => {
                        self.provisioner
                            .create_content_credential(
                                ctx.organization_id()?,
                                &name,
                                ctx.gpg_key_content.clone(),
                            )
                            .await?
                    }
                    Via::Ui => {
                        self.session
                            .import_content_credential(&name, ContentType::GpgKey, &ctx.gpg_key_path)
                            .await?
                    }
                };
                b.credentials.insert(handle.clone(), credential);
            }

            Step::CreateProduct {
                handle,
                credential,
                via,
            } => {
                let name = ctx.names.next_name(StringKind::Alpha);
                b.model.apply(Operation::create_product(
                    handle.clone(),
                    name.clone(),
                    credential.clone(),
                ))?;
                let product = match via {
                    Via::Api => {
                        let key = b.credential_ids(credential.as_ref())?;
                        self.provisioner
                            .create_product(ctx.organization_id()?, &name, key)
                            .await?
                    }
                    Via::Ui => {
                        let key = credential
                            .as_ref()
                            .map(|h| b.credential_name(h))
                            .transpose()?;
                        self.session.create_product(&name, key.as_deref()).await?
                    }
                };
                b.products.insert(handle.clone(), product);
            }

            Step::CreateRepository {
                handle,
                product,
                credential,
                source,
            } => {
                let name = ctx.names.next_name(StringKind::Alpha);
                b.model.apply(Operation::create_repository(
                    handle.clone(),
                    name.clone(),
                    product.clone(),
                    credential.clone(),
                ))?;
                let product_id = b.product(product)?.id;
                let key = b.credential_ids(credential.as_ref())?;
                let repo = self
                    .provisioner
                    .create_repository(product_id, &name, ctx.repo_url(*source), key)
                    .await?;
                b.repositories.insert(handle.clone(), repo);
            }

            Step::DiscoverRepositories {
                product,
                repository,
                credential,
            } => {
                let product_name = ctx.names.next_name(StringKind::Alpha);
                let repo_name = ctx.discovery.repo_name.clone();
                let key_name = b.credential_name(credential)?;
                b.model.apply(Operation::create_product(
                    product.clone(),
                    product_name.clone(),
                    Some(credential.clone()),
                ))?;
                b.model.apply(Operation::create_repository(
                    repository.clone(),
                    repo_name.clone(),
                    product.clone(),
                    Some(credential.clone()),
                ))?;

                let outcome = self
                    .session
                    .discover_repositories(&DiscoveryRequest {
                        url: ctx.discovery.url.clone(),
                        repo_type: ctx.discovery.repo_type,
                        selected: vec![repo_name.clone()],
                        product_name,
                        gpg_key: Some(key_name),
                    })
                    .await?;
                let repo = outcome
                    .repositories
                    .into_iter()
                    .find(|r| r.name == repo_name)
                    .ok_or_else(|| HarnessError::NotFound {
                        entity: EntityKind::Repository,
                        key: repo_name,
                    })?;
                b.products.insert(product.clone(), outcome.product);
                b.repositories.insert(repository.clone(), repo);
            }

            Step::RenameCredential { credential } => {
                let old_name = b.credential_name(credential)?;
                let new_name = ctx.names.next_name(StringKind::Alpha);
                b.model
                    .apply(Operation::rename_credential(credential.clone(), new_name.clone()))?;
                let updated = self
                    .session
                    .update_content_credential(&old_name, &new_name)
                    .await?;
                b.credentials.insert(credential.clone(), updated);
            }

            Step::DeleteCredential { credential } => {
                let name = b.credential_name(credential)?;
                b.model
                    .apply(Operation::delete_credential(credential.clone()))?;
                self.session.delete_content_credential(&name).await?;
            }

            Step::VerifyAssociations { credential } => {
                let verifier = StateVerifier::new(&self.session);
                match b.model.expected_associations(credential) {
                    Some(expected) => {
                        let name = b.credential_name(credential)?;
                        verifier.verify_associations(&name, &expected).await?;
                    }
                    None => {
                        let name = b
                            .model
                            .last_known_credential_name(credential)
                            .ok_or_else(|| HarnessError::UnboundHandle(credential.to_string()))?;
                        verifier.verify_credential_absent(name).await?;
                    }
                }
            }

            Step::VerifyProductCredential { product } => {
                let expected = b.model.expected_product_credential(product)?;
                let name = b
                    .model
                    .product_name(product)
                    .ok_or_else(|| HarnessError::UnboundHandle(product.to_string()))?;
                StateVerifier::new(&self.session)
                    .verify_product_credential(name, expected.as_deref())
                    .await?;
            }

            Step::VerifyRepositoryCredential { repository } => {
                let expected = b.model.expected_repository_credential(repository)?;
                let (product, name) = b
                    .model
                    .repository(repository)
                    .ok_or_else(|| HarnessError::UnboundHandle(repository.to_string()))?;
                let product_name = b
                    .model
                    .product_name(product)
                    .ok_or_else(|| HarnessError::UnboundHandle(product.to_string()))?;
                StateVerifier::new(&self.session)
                    .verify_repository_credential(product_name, name, expected.as_deref())
                    .await?;
            }

            Step::VerifyCredentialListed { credential } => {
                let name = b.credential_name(credential)?;
                StateVerifier::new(&self.session)
                    .verify_credential_listed(&name)
                    .await?;
            }

            Step::VerifyCredentialAbsent { credential } => {
                let name = b
                    .model
                    .last_known_credential_name(credential)
                    .ok_or_else(|| HarnessError::UnboundHandle(credential.to_string()))?;
                StateVerifier::new(&self.session)
                    .verify_credential_absent(name)
                    .await?;
            }

            Step::CreateAuthSource {
                handle,
                server,
                scoped,
                name_kind,
            } => {
                let name = ctx.unique_name(*name_kind);
                let (organizations, locations) = if *scoped {
                    let org_name = ctx.unique_name(StringKind::Alpha);
                    let loc_name = ctx.unique_name(StringKind::Alpha);
                    let scope_org = self.provisioner.create_organization(&org_name).await?;
                    let scope_loc = self.provisioner.create_location(&loc_name).await?;
                    (vec![scope_org.id], vec![scope_loc.id])
                } else {
                    (Vec::new(), Vec::new())
                };

                let spec = LdapAuthSourceSpec::from_fixture(
                    name.clone(),
                    server.server_type(),
                    ctx.ldap_fixture(*server),
                )
                .organizations(organizations.clone())
                .locations(locations.clone())
                .build()?;

                let lifecycle = b.auth_sources.entry(handle.clone()).or_default();
                lifecycle.created(name.clone())?;

                let source = self.session.create_auth_source(&spec).await?;
                if !same_members(&source.organization_ids, &organizations)
                    || !same_members(&source.location_ids, &locations)
                {
                    return Err(HarnessError::Mismatch {
                        subject: format!("scope of auth source '{name}'"),
                        expected: format!("orgs={organizations:?} locs={locations:?}"),
                        observed: format!(
                            "orgs={:?} locs={:?}",
                            source.organization_ids, source.location_ids
                        ),
                        diff: "scope differs".to_owned(),
                    });
                }
            }

            Step::VerifyAuthSourceListed { handle } => {
                let name = b.auth_source_name(handle)?;
                StateVerifier::new(&self.session)
                    .verify_auth_source_listed(&name)
                    .await?;
                b.lifecycle(handle)?.listed()?;
            }

            Step::DeleteAuthSource { handle } => {
                let name = b.auth_source_name(handle)?;
                b.lifecycle(handle)?.deleted()?;
                self.session.delete_auth_source(&name).await?;
            }

            Step::VerifyAuthSourceAbsent { handle } => {
                let name = b.auth_source_name(handle)?;
                StateVerifier::new(&self.session)
                    .verify_auth_source_absent(&name)
                    .await?;
                b.lifecycle(handle)?.confirmed_absent()?;
            }
        }
        Ok(())
    }
}

/// 순서와 무관한 ID 집합 비교
fn same_members(observed: &[EntityId], expected: &[EntityId]) -> bool {
    observed.iter().collect::<BTreeSet<_>>() == expected.iter().collect::<BTreeSet<_>>()
}
