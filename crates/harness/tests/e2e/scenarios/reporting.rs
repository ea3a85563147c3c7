//! 보고서와 이름 재현성 E2E 테스트

use std::sync::Arc;

use satprobe_harness::{SuiteRunner, catalog};

use crate::helpers::app::application;
use crate::helpers::config::TestEnv;

#[tokio::test]
async fn test_e2e_report_serializes_status_tags() {
    let env = TestEnv::new();
    let scenarios = vec![
        catalog::find("content_credential/create_via_import").unwrap(),
        catalog::find("ldap/create_with_ad[alpha]").unwrap(),
    ];
    let report = SuiteRunner::new(Arc::new(application()), env.config.clone())
        .run(&scenarios)
        .await;

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["seed"], 20_240_101);
    assert!(uuid::Uuid::parse_str(value["run_id"].as_str().unwrap()).is_ok());
    assert_eq!(value["results"][0]["status"], "passed");
    assert_eq!(value["results"][0]["tier"], "tier1");
    assert_eq!(value["results"][1]["status"], "skipped");
    assert!(
        value["results"][1]["reason"]
            .as_str()
            .unwrap()
            .contains("hostname")
    );
}

#[tokio::test]
async fn test_e2e_run_ids_are_unique() {
    let env = TestEnv::new();
    let runner = SuiteRunner::new(Arc::new(application()), env.config.clone());
    let first = runner.run(&[]).await;
    let second = runner.run(&[]).await;
    assert_ne!(first.run_id, second.run_id);
    assert!(first.is_success());
}

#[tokio::test]
async fn test_e2e_scenario_names_do_not_depend_on_selection() {
    // Given: 전체 실행과 단독 실행
    let env = TestEnv::new();
    let full = Arc::new(application());
    SuiteRunner::new(Arc::clone(&full), env.config.clone())
        .run(&catalog::content_credential())
        .await;

    let alone = Arc::new(application());
    SuiteRunner::new(Arc::clone(&alone), env.config.clone())
        .run(&[catalog::find("content_credential/add_empty_product").unwrap()])
        .await;

    // Then: 단독 실행에서 만든 이름이 전체 실행에도 그대로 나타남
    let full_products: Vec<String> = full.products().into_iter().map(|p| p.name).collect();
    let product = &alone.products()[0].name;
    assert!(full_products.contains(product));
}

#[tokio::test]
async fn test_e2e_different_seed_different_names() {
    let scenario = catalog::find("content_credential/create_via_import").unwrap();

    let first = Arc::new(application());
    let env = TestEnv::new().with_seed(1);
    SuiteRunner::new(Arc::clone(&first), env.config.clone())
        .run(std::slice::from_ref(&scenario))
        .await;

    let second = Arc::new(application());
    let env = TestEnv::new().with_seed(2);
    SuiteRunner::new(Arc::clone(&second), env.config.clone())
        .run(std::slice::from_ref(&scenario))
        .await;

    assert_ne!(first.credentials()[0].name, second.credentials()[0].name);
}
