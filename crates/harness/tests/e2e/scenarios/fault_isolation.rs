//! 장애 격리 E2E 테스트
//!
//! 주입한 장애가 올바르게 분류되고, 한 시나리오의 실패가 다른 시나리오로
//! 번지지 않는지 확인합니다.

use std::sync::Arc;

use satprobe_core::types::EntityKind;
use satprobe_harness::{FailureKind, ScenarioOutcome, SuiteRunner, catalog};

use crate::helpers::app::{application, outcome};
use crate::helpers::config::TestEnv;

fn failed_with(outcome: &ScenarioOutcome) -> Option<FailureKind> {
    match outcome {
        ScenarioOutcome::Failed { kind, .. } => Some(*kind),
        _ => None,
    }
}

#[tokio::test]
async fn test_e2e_inherited_keys_are_reported_as_mismatch() {
    // Given: 저장소가 제품의 키를 물려받는 것처럼 보고하는 애플리케이션
    let env = TestEnv::new();
    let app = Arc::new(application().with_key_inheritance());

    // When
    let report = SuiteRunner::new(app, env.config.clone())
        .run(&catalog::content_credential())
        .await;

    // Then: 제품에 키를 걸고 저장소를 둔 시나리오는 불일치, 저장소 없는 제품은 통과
    assert_eq!(
        failed_with(outcome(&report, "content_credential/add_product_with_repo")),
        Some(FailureKind::Mismatch)
    );
    assert_eq!(
        failed_with(outcome(&report, "content_credential/add_product_with_repos")),
        Some(FailureKind::Mismatch)
    );
    assert_eq!(
        *outcome(&report, "content_credential/add_empty_product"),
        ScenarioOutcome::Passed
    );
    assert_eq!(
        *outcome(&report, "content_credential/create_via_import"),
        ScenarioOutcome::Passed
    );
    assert!(!report.is_success());
    // 이후 시나리오도 계속 실행됨
    assert_eq!(report.results.len(), 17);
}

#[tokio::test]
async fn test_e2e_mismatch_message_names_unexpected_repository() {
    let env = TestEnv::new();
    let report = SuiteRunner::new(
        Arc::new(application().with_key_inheritance()),
        env.config.clone(),
    )
    .run(&[catalog::find("content_credential/add_product_with_repo").unwrap()])
    .await;

    match outcome(&report, "content_credential/add_product_with_repo") {
        ScenarioOutcome::Failed { message, .. } => {
            assert!(message.contains("unexpected repositories"), "{message}");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_e2e_product_failure_is_fixture_error() {
    // Given: 제품 생성이 항상 422
    let env = TestEnv::new();
    let app = Arc::new(application().fail_on(EntityKind::Product));

    let report = SuiteRunner::new(app, env.config.clone())
        .run(&catalog::content_credential())
        .await;

    // Then: API로 제품을 만드는 시나리오는 픽스처 실패, 가져오기 시나리오는 통과
    assert_eq!(
        *outcome(&report, "content_credential/create_via_import"),
        ScenarioOutcome::Passed
    );
    match outcome(&report, "content_credential/add_product_with_repo") {
        ScenarioOutcome::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Fixture);
            assert!(message.contains("injected failure"), "{message}");
        }
        other => panic!("expected fixture failure, got {other:?}"),
    }
    // 화면에서 만드는 제품은 테스트 대상 액션
    assert_eq!(
        failed_with(outcome(&report, "content_credential/add_empty_product")),
        Some(FailureKind::Action)
    );
}

#[tokio::test]
async fn test_e2e_organization_failure_aborts_each_scenario_separately() {
    let env = TestEnv::new();
    let report = SuiteRunner::new(
        Arc::new(application().fail_on(EntityKind::Organization)),
        env.config.clone(),
    )
    .run(&catalog::content_credential())
    .await;

    assert_eq!(report.failed(), report.results.len());
    assert!(
        report
            .results
            .iter()
            .all(|r| failed_with(&r.outcome) == Some(FailureKind::Fixture))
    );
}

#[tokio::test]
async fn test_e2e_scope_fixture_failure_spares_unscoped_sources() {
    // Given: 위치 생성 실패
    let env = TestEnv::new().with_ldap();
    let app = Arc::new(application().fail_on(EntityKind::Location));

    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&[
            catalog::find("ldap/create_with_ad_org_and_loc[alpha]").unwrap(),
            catalog::find("ldap/create_with_ad[alpha]").unwrap(),
        ])
        .await;

    // Then: 범위 지정 시나리오만 픽스처 실패
    assert_eq!(
        failed_with(&report.results[0].outcome),
        Some(FailureKind::Fixture)
    );
    assert_eq!(report.results[1].outcome, ScenarioOutcome::Passed);
    assert_eq!(app.auth_sources().len(), 1);
}

#[tokio::test]
async fn test_e2e_auth_source_rejection_is_action_failure() {
    let env = TestEnv::new().with_ldap();
    let report = SuiteRunner::new(
        Arc::new(application().fail_on(EntityKind::AuthSource)),
        env.config.clone(),
    )
    .run(&[catalog::find("ldap/create_with_ad[alpha]").unwrap()])
    .await;

    assert_eq!(
        failed_with(&report.results[0].outcome),
        Some(FailureKind::Action)
    );
}

#[tokio::test]
async fn test_e2e_missing_discovery_repository_is_action_failure() {
    let env = TestEnv::new();
    // 탐색 결과가 비어 있는 애플리케이션
    let app = Arc::new(satprobe_harness::memory::InMemoryApplication::new());
    let report = SuiteRunner::new(app, env.config.clone())
        .run(&[catalog::find("content_credential/add_product_using_repo_discovery").unwrap()])
        .await;

    match &report.results[0].outcome {
        ScenarioOutcome::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Action);
            assert!(message.contains("fakerepo01"), "{message}");
        }
        other => panic!("expected action failure, got {other:?}"),
    }
}
