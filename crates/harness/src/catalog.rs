//! 기본 제공 시나리오 목록
//!
//! 콘텐츠 자격증명 연관 시나리오와 LDAP 인증 소스 시나리오입니다.
//! 기대값은 항상 연관 모델에서 계산되므로 시나리오에는 단계만 적습니다.

use crate::naming::StringKind;
use crate::scenario::{
    LdapFixture, RepoSource, Requirement, Scenario, ScenarioBuilder, Step, Tier, Via,
};

const KEY: &str = "key";
const PRODUCT: &str = "product";
const REPO_1: &str = "repo1";
const REPO_2: &str = "repo2";
const AUTH_SOURCE: &str = "auth_source";

/// 자격증명 하나에 대한 연관 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// 저장소 없는 제품에 연결
    EmptyProduct,
    /// 저장소 하나인 제품에 연결
    ProductWithRepo,
    /// 저장소 둘인 제품에 연결
    ProductWithRepos,
    /// 저장소 하나인 제품의 저장소에 연결
    RepoFromProductWithRepo,
    /// 저장소 둘인 제품의 한 저장소에 연결
    RepoFromProductWithRepos,
}

impl Shape {
    const ALL: [Shape; 5] = [
        Self::EmptyProduct,
        Self::ProductWithRepo,
        Self::ProductWithRepos,
        Self::RepoFromProductWithRepo,
        Self::RepoFromProductWithRepos,
    ];

    fn slug(&self) -> &'static str {
        match self {
            Self::EmptyProduct => "empty_product",
            Self::ProductWithRepo => "product_with_repo",
            Self::ProductWithRepos => "product_with_repos",
            Self::RepoFromProductWithRepo => "repo_from_product_with_repo",
            Self::RepoFromProductWithRepos => "repo_from_product_with_repos",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::EmptyProduct => "an empty custom product",
            Self::ProductWithRepo => "a custom product with one repository",
            Self::ProductWithRepos => "a custom product with two repositories",
            Self::RepoFromProductWithRepo => "the repository of a product with one repository",
            Self::RepoFromProductWithRepos => "one repository of a product with two repositories",
        }
    }

    fn links_product(&self) -> bool {
        matches!(
            self,
            Self::EmptyProduct | Self::ProductWithRepo | Self::ProductWithRepos
        )
    }

    fn repositories(&self) -> &'static [&'static str] {
        match self {
            Self::EmptyProduct => &[],
            Self::ProductWithRepo | Self::RepoFromProductWithRepo => &[REPO_1],
            Self::ProductWithRepos | Self::RepoFromProductWithRepos => &[REPO_1, REPO_2],
        }
    }

    /// 자격증명, 제품, 저장소 생성 단계
    fn setup(&self, product_via: Via) -> Vec<Step> {
        let product_key = self.links_product().then_some(KEY);
        let mut steps = vec![
            Step::create_credential(KEY),
            match product_via {
                Via::Api => Step::create_product(PRODUCT, product_key),
                Via::Ui => Step::create_product_ui(PRODUCT, product_key),
            },
        ];
        let repo_key = (!self.links_product()).then_some(KEY);
        match self {
            Self::EmptyProduct => {}
            Self::ProductWithRepo => {
                steps.push(Step::create_repository(REPO_1, PRODUCT, None, RepoSource::Primary));
            }
            Self::ProductWithRepos => {
                steps.push(Step::create_repository(REPO_1, PRODUCT, None, RepoSource::Primary));
                steps.push(Step::create_repository(
                    REPO_2,
                    PRODUCT,
                    None,
                    RepoSource::Secondary,
                ));
            }
            Self::RepoFromProductWithRepo => {
                steps.push(Step::create_repository(
                    REPO_1,
                    PRODUCT,
                    repo_key,
                    RepoSource::Primary,
                ));
            }
            Self::RepoFromProductWithRepos => {
                steps.push(Step::create_repository(
                    REPO_1,
                    PRODUCT,
                    repo_key,
                    RepoSource::Primary,
                ));
                steps.push(Step::create_repository(
                    REPO_2,
                    PRODUCT,
                    None,
                    RepoSource::Secondary,
                ));
            }
        }
        steps
    }

    /// 제품/저장소의 자격증명 필드 확인 단계
    fn field_checks(&self) -> Vec<Step> {
        std::iter::once(Step::verify_product_credential(PRODUCT))
            .chain(
                self.repositories()
                    .iter()
                    .map(|r| Step::verify_repository_credential(r)),
            )
            .collect()
    }

    fn add_scenario(&self) -> Scenario {
        // 저장소 없는 제품은 화면에서 만들며 연결합니다.
        let via = if *self == Self::EmptyProduct {
            Via::Ui
        } else {
            Via::Api
        };
        Scenario::builder(format!("content_credential/add_{}", self.slug()))
            .summary(format!(
                "Associate a GPG key with {}",
                self.description()
            ))
            .tier(Tier::Tier2)
            .steps(self.setup(via))
            .step(Step::verify_associations(KEY))
            .build()
    }

    fn update_scenario(&self) -> Scenario {
        let builder = Scenario::builder(format!("content_credential/update_key_for_{}", self.slug()))
            .summary(format!(
                "Associate a GPG key with {} then rename the key",
                self.description()
            ))
            .tier(Tier::Tier2)
            .steps(self.setup(Via::Api))
            .step(Step::verify_associations(KEY))
            .step(Step::rename_credential(KEY))
            .step(Step::verify_associations(KEY))
            .steps(self.field_checks());
        with_upgrade(builder, self.repositories().len() == 2).build()
    }

    fn delete_scenario(&self) -> Scenario {
        let builder = Scenario::builder(format!("content_credential/delete_key_for_{}", self.slug()))
            .summary(format!(
                "Associate a GPG key with {} then delete the key",
                self.description()
            ))
            .tier(Tier::Tier2)
            .steps(self.setup(Via::Api))
            .step(Step::verify_associations(KEY))
            .steps(self.field_checks())
            .step(Step::delete_credential(KEY))
            .step(Step::verify_credential_absent(KEY))
            .steps(self.field_checks())
            .step(Step::verify_associations(KEY));
        with_upgrade(builder, self.repositories().len() == 2).build()
    }
}

fn with_upgrade(builder: ScenarioBuilder, upgrade: bool) -> ScenarioBuilder {
    if upgrade { builder.upgrade() } else { builder }
}

/// 콘텐츠 자격증명 시나리오
pub fn content_credential() -> Vec<Scenario> {
    let mut scenarios = vec![
        Scenario::builder("content_credential/create_via_import")
            .summary("Import a GPG key from a file and find it by name")
            .tier(Tier::Tier1)
            .step(Step::import_credential(KEY))
            .step(Step::verify_credential_listed(KEY))
            .build(),
    ];
    scenarios.extend(Shape::ALL.iter().map(Shape::add_scenario));
    scenarios.push(
        Scenario::builder("content_credential/add_product_using_repo_discovery")
            .summary("Associate a GPG key with a new product through repository discovery")
            .tier(Tier::Tier2)
            .upgrade()
            .step(Step::import_credential(KEY))
            .step(Step::verify_credential_listed(KEY))
            .step(Step::discover_repositories(PRODUCT, REPO_1, KEY))
            .step(Step::verify_associations(KEY))
            .build(),
    );
    scenarios.extend(Shape::ALL.iter().map(Shape::update_scenario));
    scenarios.extend(Shape::ALL.iter().map(Shape::delete_scenario));
    scenarios
}

/// LDAP 인증 소스 시나리오 (이름 종류마다 하나씩)
pub fn ldap() -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    for kind in StringKind::ALL {
        scenarios.push(
            Scenario::builder(format!("ldap/create_with_ad[{kind}]"))
                .summary("Create an Active Directory auth source and find it by name")
                .tier(Tier::Tier1)
                .requires(Requirement::Ldap)
                .step(Step::create_auth_source(AUTH_SOURCE, LdapFixture::Ad, false, kind))
                .step(Step::verify_auth_source_listed(AUTH_SOURCE))
                .build(),
        );
        scenarios.push(
            Scenario::builder(format!("ldap/delete_with_ad[{kind}]"))
                .summary("Create and delete an Active Directory auth source")
                .tier(Tier::Tier1)
                .requires(Requirement::Ldap)
                .step(Step::create_auth_source(AUTH_SOURCE, LdapFixture::Ad, false, kind))
                .step(Step::verify_auth_source_listed(AUTH_SOURCE))
                .step(Step::delete_auth_source(AUTH_SOURCE))
                .step(Step::verify_auth_source_absent(AUTH_SOURCE))
                .build(),
        );
        scenarios.push(
            Scenario::builder(format!("ldap/create_with_ad_org_and_loc[{kind}]"))
                .summary("Create an Active Directory auth source scoped to a new organization and location")
                .tier(Tier::Tier2)
                .upgrade()
                .requires(Requirement::Ldap)
                .step(Step::create_auth_source(AUTH_SOURCE, LdapFixture::Ad, true, kind))
                .step(Step::verify_auth_source_listed(AUTH_SOURCE))
                .build(),
        );
        scenarios.push(
            Scenario::builder(format!("ldap/create_with_idm_org_and_loc[{kind}]"))
                .summary("Create an IdM auth source scoped to a new organization and location")
                .tier(Tier::Tier2)
                .requires(Requirement::Ipa)
                .step(Step::create_auth_source(AUTH_SOURCE, LdapFixture::Ipa, true, kind))
                .step(Step::verify_auth_source_listed(AUTH_SOURCE))
                .build(),
        );
    }
    scenarios
}

/// 모든 기본 시나리오
pub fn all() -> Vec<Scenario> {
    let mut scenarios = content_credential();
    scenarios.extend(ldap());
    scenarios
}

/// 이름으로 시나리오를 찾습니다.
pub fn find(name: &str) -> Option<Scenario> {
    all().into_iter().find(|s| s.name == name)
}
