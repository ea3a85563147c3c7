//! 콘텐츠 자격증명 시나리오 E2E 테스트
//!
//! GPG 키와 제품/저장소의 직접 연결, 이름 변경, 삭제 후 상태를 확인합니다.

use std::sync::Arc;

use satprobe_harness::runner::{Selection, select};
use satprobe_harness::{SuiteRunner, Tier, catalog};

use crate::helpers::app::{application, assert_all_passed};
use crate::helpers::config::{DISCOVERY_REPO, TestEnv};

fn only(name: &str) -> Vec<satprobe_harness::Scenario> {
    vec![catalog::find(name).unwrap_or_else(|| panic!("unknown scenario {name}"))]
}

#[tokio::test]
async fn test_e2e_content_credential_catalog_passes() {
    // Given: 탐색 가능한 저장소가 있는 애플리케이션
    let env = TestEnv::new();
    let app = Arc::new(application());
    let runner = SuiteRunner::new(Arc::clone(&app), env.config.clone());

    // When: 콘텐츠 자격증명 시나리오 전체 실행
    let report = runner.run(&catalog::content_credential()).await;

    // Then: 모두 통과하고 시나리오마다 조직이 하나씩 생성됨
    assert_all_passed(&report);
    assert_eq!(report.results.len(), 17);
    assert_eq!(app.organizations().len(), 17);
}

#[tokio::test]
async fn test_e2e_import_creates_one_listed_credential() {
    let env = TestEnv::new();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&only("content_credential/create_via_import"))
        .await;

    assert_all_passed(&report);
    let credentials = app.credentials();
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0].name.chars().count(), 10);
}

#[tokio::test]
async fn test_e2e_delete_key_unlinks_product_and_keeps_repositories() {
    // Given/When: 저장소 두 개인 제품의 키 삭제 시나리오
    let env = TestEnv::new();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&only("content_credential/delete_key_for_product_with_repos"))
        .await;

    // Then: 키는 사라지고 제품은 키 없이 남으며 저장소도 유지됨
    assert_all_passed(&report);
    assert!(app.credentials().is_empty());
    let products = app.products();
    assert_eq!(products.len(), 1);
    assert!(products[0].gpg_key_id.is_none());
    assert_eq!(app.repositories().len(), 2);
}

#[tokio::test]
async fn test_e2e_delete_key_for_repository_leaves_sibling_untouched() {
    let env = TestEnv::new();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&only("content_credential/delete_key_for_repo_from_product_with_repos"))
        .await;

    assert_all_passed(&report);
    assert!(app.repositories().iter().all(|r| r.gpg_key_id.is_none()));
    assert!(app.products().iter().all(|p| p.gpg_key_id.is_none()));
}

#[tokio::test]
async fn test_e2e_rename_keeps_associations() {
    let env = TestEnv::new();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&only("content_credential/update_key_for_product_with_repo"))
        .await;

    assert_all_passed(&report);
    let credentials = app.credentials();
    assert_eq!(credentials.len(), 1);
    let products = app.products();
    assert_eq!(products[0].gpg_key_id, Some(credentials[0].id));
}

#[tokio::test]
async fn test_e2e_discovery_creates_product_with_selected_repository() {
    let env = TestEnv::new();
    let app = Arc::new(application());
    let report = SuiteRunner::new(Arc::clone(&app), env.config.clone())
        .run(&only("content_credential/add_product_using_repo_discovery"))
        .await;

    assert_all_passed(&report);
    let repositories = app.repositories();
    assert_eq!(repositories.len(), 1);
    assert_eq!(repositories[0].name, DISCOVERY_REPO);

    let key = app.credentials()[0].id;
    assert_eq!(app.products()[0].gpg_key_id, Some(key));
    assert_eq!(repositories[0].gpg_key_id, Some(key));
}

#[tokio::test]
async fn test_e2e_tier1_selection_runs_import_only() {
    let env = TestEnv::new();
    let selected = select(
        catalog::content_credential(),
        &Selection {
            filter: None,
            tier: Some(Tier::Tier1),
        },
    );
    assert_eq!(selected.len(), 1);

    let report = SuiteRunner::new(Arc::new(application()), env.config.clone())
        .run(&selected)
        .await;
    assert_eq!(report.results[0].name, "content_credential/create_via_import");
    assert_all_passed(&report);
}
