//! LDAP 인증 소스 시나리오 E2E 테스트

use std::sync::Arc;

use satprobe_harness::runner::{Selection, select};
use satprobe_harness::{ScenarioOutcome, SuiteRunner, catalog};

use crate::helpers::app::{application, assert_all_passed, outcome};
use crate::helpers::config::TestEnv;

fn matching(filter: &str) -> Vec<satprobe_harness::Scenario> {
    select(
        catalog::ldap(),
        &Selection {
            filter: Some(filter.to_owned()),
            tier: None,
        },
    )
}

#[tokio::test]
async fn test_e2e_unconfigured_ldap_skips_everything() {
    // Given: LDAP/IPA 설정 없음
    let env = TestEnv::new();
    let app = Arc::new(application());

    // When
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&catalog::ldap())
        .await;

    // Then: 전부 건너뛰고 아무것도 만들지 않음
    assert_eq!(report.skipped(), report.results.len());
    assert!(report.is_success());
    assert!(app.organizations().is_empty());
    assert!(app.auth_sources().is_empty());
    match outcome(&report, "ldap/create_with_ad[alpha]") {
        ScenarioOutcome::Skipped { reason } => assert!(reason.contains("[ldap]")),
        other => panic!("expected skip, got {other:?}"),
    }
}

#[tokio::test]
async fn test_e2e_idm_requires_only_ipa() {
    // Given: IPA만 설정
    let env = TestEnv::new().with_ipa();
    let report = SuiteRunner::new(Arc::new(application()), env.config.clone())
        .run(&catalog::ldap())
        .await;

    // Then: IdM 시나리오만 실행
    for result in &report.results {
        let idm = result.name.starts_with("ldap/create_with_idm");
        match (&result.outcome, idm) {
            (ScenarioOutcome::Passed, true) | (ScenarioOutcome::Skipped { .. }, false) => {}
            (other, _) => panic!("{}: unexpected {other:?}", result.name),
        }
    }
}

#[tokio::test]
async fn test_e2e_ldap_catalog_passes_when_configured() {
    let env = TestEnv::new().with_ldap().with_ipa();
    let report = SuiteRunner::new(Arc::new(application()), env.config.clone())
        .run(&catalog::ldap())
        .await;
    assert_all_passed(&report);
    assert_eq!(report.results.len(), 28);
}

#[tokio::test]
async fn test_e2e_delete_removes_auth_sources() {
    let env = TestEnv::new().with_ldap();
    let app = Arc::new(application());
    let scenarios = matching("ldap/delete_with_ad");
    assert_eq!(scenarios.len(), 7);

    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&scenarios)
        .await;

    assert_all_passed(&report);
    assert!(app.auth_sources().is_empty());
}

#[tokio::test]
async fn test_e2e_scoped_auth_source_gets_fresh_org_and_location() {
    let env = TestEnv::new().with_ldap();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&matching("ldap/create_with_ad_org_and_loc[alpha]"))
        .await;

    assert_all_passed(&report);
    let sources = app.auth_sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].organization_ids.len(), 1);
    assert_eq!(sources[0].location_ids.len(), 1);
    // 인증 소스 시나리오는 범위 조직만 만듭니다
    assert_eq!(app.organizations().len(), 1);
    assert_eq!(app.locations().len(), 1);
}

#[tokio::test]
async fn test_e2e_rerun_with_same_seed_does_not_collide() {
    // Given: 같은 서버, 같은 시드
    let env = TestEnv::new().with_ldap();
    let app = Arc::new(application());
    let scenarios = matching("ldap/create_with_ad_org_and_loc");
    let mut config = env.config.clone();
    config.naming.seed = Some(11);

    // When: 두 번 실행
    let first = SuiteRunner::new(Arc::clone(&app), config.clone())
        .run(&scenarios)
        .await;
    let second = SuiteRunner::new(Arc::clone(&app), config)
        .run(&scenarios)
        .await;

    // Then: 두 번째 실행도 이름 충돌 없이 통과
    assert_all_passed(&first);
    assert_all_passed(&second);
    assert_eq!(first.seed, second.seed);
    assert_eq!(app.auth_sources().len(), 2 * scenarios.len());
}

#[tokio::test]
async fn test_e2e_unscoped_auth_source_has_no_scope() {
    let env = TestEnv::new().with_ldap();
    let app = Arc::new(application());
    SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&matching("ldap/create_with_ad[numeric]"))
        .await;

    let sources = app.auth_sources();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].organization_ids.is_empty());
    assert!(sources[0].location_ids.is_empty());
    assert!(sources[0].name.chars().all(|c| c.is_ascii_digit()));
}
