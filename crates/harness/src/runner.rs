//! 시나리오 묶음 실행기
//!
//! [`SuiteRunner`]는 시나리오를 순서대로 하나씩 실행합니다.
//!
//! 1. 전제 조건(LDAP/IPA 픽스처 설정)을 확인하고, 없으면 픽스처를 만들기 전에 건너뜁니다.
//! 2. 조직이 필요한 시나리오는 공유 조직을 쓰거나 새 조직을 만듭니다.
//! 3. 시나리오 이름과 기본 시드로 만든 이름 전략을 컨텍스트에 넣고 실행합니다.
//!
//! 조직, 위치, 인증 소스 이름에는 실행마다 다른 [`RunTag`]가 붙으므로 같은 시드로
//! 다시 실행해도 이전 실행의 엔티티와 충돌하지 않습니다.
//! 한 시나리오의 실패는 다른 시나리오에 영향을 주지 않습니다.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use satprobe_core::config::SatprobeConfig;
use satprobe_core::metrics as m;

use crate::api::EntityApi;
use crate::error::{FailureKind, HarnessError};
use crate::naming::{NameStrategy, RandomNames, RunTag, StringKind, scenario_seed};
use crate::provision::FixtureProvisioner;
use crate::scenario::{
    Requirement, Scenario, ScenarioContext, ScenarioDriver, SharedFixtures, Step, Tier, Via,
};
use crate::session::ApiSession;

/// 시나리오 하나의 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed,
    Failed { kind: FailureKind, message: String },
    Skipped { reason: String },
}

impl ScenarioOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// 시나리오 실행 기록
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub tier: Tier,
    pub outcome: ScenarioOutcome,
    pub duration_ms: u64,
}

/// 묶음 실행 보고서
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: String,
    /// 이름 생성 기본 시드 (재현용)
    pub seed: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Skipped { .. }))
    }

    /// 실패한 시나리오가 없으면 성공
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn duration_ms(&self) -> u64 {
        self.results.iter().map(|r| r.duration_ms).sum()
    }

    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }

    fn count(&self, pred: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// 시나리오 선택 조건
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// 이름에 포함될 문자열
    pub filter: Option<String>,
    pub tier: Option<Tier>,
}

impl Selection {
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let name_ok = self
            .filter
            .as_deref()
            .is_none_or(|f| scenario.name.contains(f));
        let tier_ok = self.tier.is_none_or(|t| scenario.tier == t);
        name_ok && tier_ok
    }
}

/// 조건에 맞는 시나리오만 남깁니다 (순서 유지).
pub fn select(scenarios: Vec<Scenario>, selection: &Selection) -> Vec<Scenario> {
    scenarios
        .into_iter()
        .filter(|s| selection.matches(s))
        .collect()
}

/// 시나리오 묶음 실행기
pub struct SuiteRunner<A> {
    api: Arc<A>,
    config: SatprobeConfig,
    shared: SharedFixtures,
    seed: u64,
}

impl<A: EntityApi> SuiteRunner<A> {
    /// 설정에 시드가 없으면 무작위 시드를 고릅니다.
    pub fn new(api: Arc<A>, config: SatprobeConfig) -> Self {
        let seed = config.naming.seed.unwrap_or_else(rand::random);
        Self {
            api,
            config,
            shared: SharedFixtures::default(),
            seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shared(mut self, shared: SharedFixtures) -> Self {
        self.shared = shared;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 충족되지 않은 전제 조건 설명. 모두 충족되면 `None`.
    pub fn unmet_requirements(&self, scenario: &Scenario) -> Option<String> {
        let reasons: Vec<String> = scenario
            .requires
            .iter()
            .filter_map(|req| {
                let fixture = match req {
                    Requirement::Ldap => &self.config.ldap,
                    Requirement::Ipa => &self.config.ipa,
                };
                let missing = fixture.missing_fields();
                (!missing.is_empty()).then(|| {
                    format!("[{}] not configured (missing {})", req.section(), missing.join(", "))
                })
            })
            .collect();
        (!reasons.is_empty()).then(|| reasons.join("; "))
    }

    /// 시나리오를 순서대로 실행합니다.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_tag = RunTag::from_run_id(&run_id);
        info!(
            run_id = run_id.as_str(),
            seed = self.seed,
            scenarios = scenarios.len(),
            "suite run started"
        );

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let started = Instant::now();
            let outcome = self.run_one(scenario, run_tag).await;
            let elapsed = started.elapsed();
            record(&outcome, elapsed.as_secs_f64());

            match &outcome {
                ScenarioOutcome::Passed => info!(scenario = scenario.name.as_str(), "passed"),
                ScenarioOutcome::Failed { kind, message } => error!(
                    scenario = scenario.name.as_str(),
                    kind = %kind,
                    message = message.as_str(),
                    "failed"
                ),
                ScenarioOutcome::Skipped { reason } => {
                    warn!(scenario = scenario.name.as_str(), reason = reason.as_str(), "skipped")
                }
            }

            results.push(ScenarioResult {
                name: scenario.name.clone(),
                tier: scenario.tier,
                outcome,
                duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            });
        }

        let report = SuiteReport {
            run_id,
            seed: self.seed,
            results,
        };
        info!(
            run_id = report.run_id.as_str(),
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "suite run finished"
        );
        report
    }

    async fn run_one(&self, scenario: &Scenario, run_tag: RunTag) -> ScenarioOutcome {
        if let Some(reason) = self.unmet_requirements(scenario) {
            return ScenarioOutcome::Skipped { reason };
        }
        match self.execute(scenario, run_tag).await {
            Ok(()) => ScenarioOutcome::Passed,
            Err(err) => ScenarioOutcome::Failed {
                kind: err.failure_kind(),
                message: err.to_string(),
            },
        }
    }

    async fn execute(&self, scenario: &Scenario, run_tag: RunTag) -> Result<(), HarnessError> {
        scenario.validate()?;
        let provisioner = FixtureProvisioner::new(Arc::clone(&self.api));
        let mut names: Box<dyn NameStrategy> = Box::new(RandomNames::new(
            Some(scenario_seed(self.seed, &scenario.name)),
            self.config.naming.default_length,
        ));

        let organization = match (&self.shared.organization, scenario.needs_organization()) {
            (_, false) => None,
            (Some(org), true) => Some(org.clone()),
            (None, true) => {
                let name = run_tag.apply(names.next_name(StringKind::Alpha), StringKind::Alpha);
                Some(provisioner.create_organization(&name).await?)
            }
        };

        let key_content = if needs_key_content(scenario) {
            let path = &self.config.fixtures.gpg_key_file;
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| HarnessError::Fixture {
                    entity: satprobe_core::types::EntityKind::ContentCredential,
                    reason: format!("failed to read key file {path}: {e}"),
                })?
        } else {
            String::new()
        };

        let mut ctx = ScenarioContext::new(organization, &self.config.fixtures, key_content, names)
            .with_ldap(self.config.ldap.clone(), self.config.ipa.clone())
            .with_run_tag(run_tag);
        let mut driver = ScenarioDriver::new(provisioner, ApiSession::new(Arc::clone(&self.api)));
        driver.run(scenario, &mut ctx).await.map(|_| ())
    }
}

fn needs_key_content(scenario: &Scenario) -> bool {
    scenario
        .steps
        .iter()
        .any(|s| matches!(s, Step::CreateCredential { via: Via::Api, .. }))
}

fn record(outcome: &ScenarioOutcome, seconds: f64) {
    metrics::counter!(m::SCENARIOS_RUN_TOTAL).increment(1);
    metrics::histogram!(m::SCENARIO_DURATION_SECONDS).record(seconds);
    match outcome {
        ScenarioOutcome::Passed => metrics::counter!(m::SCENARIOS_PASSED_TOTAL).increment(1),
        ScenarioOutcome::Failed { kind, .. } => {
            metrics::counter!(m::SCENARIOS_FAILED_TOTAL, m::LABEL_FAILURE_KIND => kind.as_str())
                .increment(1)
        }
        ScenarioOutcome::Skipped { .. } => {
            metrics::counter!(m::SCENARIOS_SKIPPED_TOTAL).increment(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use satprobe_core::config::LdapFixtureConfig;
    use satprobe_core::types::EntityKind;

    use super::*;
    use crate::api::EntityApi;
    use crate::catalog;
    use crate::memory::InMemoryApplication;

    fn config_with_key(file: &tempfile::NamedTempFile) -> SatprobeConfig {
        let mut config = SatprobeConfig::default();
        config.fixtures.gpg_key_file = file.path().display().to_string();
        config.naming.seed = Some(7);
        config
    }

    fn key_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"-----BEGIN PGP PUBLIC KEY BLOCK-----").unwrap();
        file
    }

    fn ldap_fixture() -> LdapFixtureConfig {
        LdapFixtureConfig {
            hostname: "ldap.example.com".to_owned(),
            username: "binder".to_owned(),
            password: "secret".to_owned(),
            base_dn: "dc=example,dc=com".to_owned(),
            group_base_dn: "ou=groups,dc=example,dc=com".to_owned(),
        }
    }

    #[test]
    fn selection_by_filter_and_tier() {
        let all = catalog::all();
        let total = all.len();
        let tier1 = select(
            all.clone(),
            &Selection {
                filter: None,
                tier: Some(Tier::Tier1),
            },
        );
        assert!(tier1.iter().all(|s| s.tier == Tier::Tier1));
        assert!(tier1.len() < total);

        let delete = select(
            all,
            &Selection {
                filter: Some("delete_key".to_owned()),
                tier: None,
            },
        );
        assert_eq!(delete.len(), 5);
    }

    #[test]
    fn unmet_requirements_name_missing_fields() {
        let runner = SuiteRunner::new(Arc::new(InMemoryApplication::new()), SatprobeConfig::default());
        let scenario = catalog::find("ldap/create_with_idm_org_and_loc[alpha]").unwrap();
        let reason = runner.unmet_requirements(&scenario).unwrap();
        assert!(reason.contains("[ipa]"));
        assert!(reason.contains("hostname"));

        let plain = catalog::find("content_credential/create_via_import").unwrap();
        assert!(runner.unmet_requirements(&plain).is_none());
    }

    #[tokio::test]
    async fn skipped_scenarios_provision_nothing() {
        let app = Arc::new(InMemoryApplication::new());
        let runner = SuiteRunner::new(Arc::clone(&app), SatprobeConfig::default());
        let report = runner.run(&catalog::ldap()).await;
        assert_eq!(report.skipped(), report.results.len());
        assert!(report.is_success());
        assert!(app.organizations().is_empty());
    }

    #[tokio::test]
    async fn content_credential_catalog_passes() {
        let file = key_file();
        let mut config = config_with_key(&file);
        config.fixtures.discovery_url = "http://repos.example.com/".to_owned();
        let app = Arc::new(
            InMemoryApplication::new().with_discoverable("http://repos.example.com/", ["fakerepo01"]),
        );
        let runner = SuiteRunner::new(Arc::clone(&app), config);
        let report = runner.run(&catalog::content_credential()).await;
        for result in &report.results {
            assert_eq!(result.outcome, ScenarioOutcome::Passed, "{}", result.name);
        }
        // 시나리오마다 새 조직
        assert_eq!(app.organizations().len(), report.results.len());
    }

    #[tokio::test]
    async fn failure_does_not_abort_siblings() {
        let file = key_file();
        let app = Arc::new(InMemoryApplication::new().fail_on(EntityKind::Repository));
        let runner = SuiteRunner::new(app, config_with_key(&file));
        let scenarios = vec![
            catalog::find("content_credential/add_product_with_repo").unwrap(),
            catalog::find("content_credential/add_empty_product").unwrap(),
        ];
        let report = runner.run(&scenarios).await;
        assert!(matches!(
            report.results[0].outcome,
            ScenarioOutcome::Failed {
                kind: FailureKind::Fixture,
                ..
            }
        ));
        assert_eq!(report.results[1].outcome, ScenarioOutcome::Passed);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn shared_organization_is_reused() {
        let file = key_file();
        let app = Arc::new(InMemoryApplication::new());
        let org = app.create_organization("shared").await.unwrap();
        let runner = SuiteRunner::new(Arc::clone(&app), config_with_key(&file))
            .with_shared(SharedFixtures::with_organization(org));
        let scenarios: Vec<Scenario> = catalog::content_credential()
            .into_iter()
            .filter(|s| s.name.contains("add_product_with"))
            .collect();
        let report = runner.run(&scenarios).await;
        assert_eq!(report.passed(), 2);
        assert_eq!(app.organizations().len(), 1);
    }

    #[tokio::test]
    async fn missing_key_file_fails_as_fixture() {
        let mut config = SatprobeConfig::default();
        config.fixtures.gpg_key_file = "/nonexistent/key.txt".to_owned();
        let runner = SuiteRunner::new(Arc::new(InMemoryApplication::new()), config);
        let scenario = catalog::find("content_credential/add_product_with_repo").unwrap();
        let report = runner.run(&[scenario]).await;
        assert!(matches!(
            &report.results[0].outcome,
            ScenarioOutcome::Failed { kind: FailureKind::Fixture, message } if message.contains("key file")
        ));
    }

    #[tokio::test]
    async fn ldap_scenarios_run_when_configured() {
        let mut config = SatprobeConfig::default();
        config.ldap = ldap_fixture();
        config.ipa = ldap_fixture();
        let runner = SuiteRunner::new(Arc::new(InMemoryApplication::new()), config).with_seed(99);
        let report = runner.run(&catalog::ldap()).await;
        assert_eq!(report.passed(), report.results.len());
        assert_eq!(report.seed, 99);
    }

    #[tokio::test]
    async fn rerun_with_same_seed_does_not_collide() {
        let file = key_file();
        let mut config = config_with_key(&file);
        config.ldap = ldap_fixture();
        let app = Arc::new(InMemoryApplication::new());
        let scenarios = vec![
            catalog::find("content_credential/add_empty_product").unwrap(),
            catalog::find("ldap/create_with_ad[alpha]").unwrap(),
            catalog::find("ldap/create_with_ad_org_and_loc[numeric]").unwrap(),
        ];

        let first = SuiteRunner::new(Arc::clone(&app), config.clone()).run(&scenarios).await;
        let second = SuiteRunner::new(Arc::clone(&app), config).run(&scenarios).await;

        for report in [&first, &second] {
            for result in &report.results {
                assert_eq!(result.outcome, ScenarioOutcome::Passed, "{}", result.name);
            }
        }
        assert_eq!(app.auth_sources().len(), 4);
        // 제품/자격증명 이름은 조직 안에서 시드대로 반복됨
        let products = app.products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, products[1].name);
    }

    #[tokio::test]
    async fn ldap_scenario_without_scope_creates_no_organization() {
        let mut config = SatprobeConfig::default();
        config.ldap = ldap_fixture();
        let app = Arc::new(InMemoryApplication::new().fail_on(EntityKind::Organization));
        let runner = SuiteRunner::new(Arc::clone(&app), config);
        let report = runner
            .run(&[catalog::find("ldap/delete_with_ad[utf8]").unwrap()])
            .await;
        assert_eq!(report.results[0].outcome, ScenarioOutcome::Passed);
        assert!(app.organizations().is_empty());
    }

    #[tokio::test]
    async fn same_seed_same_names() {
        let file = key_file();
        let scenario = catalog::find("content_credential/add_empty_product").unwrap();

        let first = Arc::new(InMemoryApplication::new());
        SuiteRunner::new(Arc::clone(&first), config_with_key(&file))
            .run(std::slice::from_ref(&scenario))
            .await;
        let second = Arc::new(InMemoryApplication::new());
        SuiteRunner::new(Arc::clone(&second), config_with_key(&file))
            .run(std::slice::from_ref(&scenario))
            .await;

        assert_eq!(first.products()[0].name, second.products()[0].name);
        assert_eq!(first.credentials()[0].name, second.credentials()[0].name);
    }
}
