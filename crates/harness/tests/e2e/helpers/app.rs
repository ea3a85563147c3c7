//! 메모리 내 애플리케이션 팩토리와 보고서 단언

use std::sync::Arc;

use satprobe_harness::memory::InMemoryApplication;
use satprobe_harness::{ScenarioOutcome, SuiteReport};

use super::config::{DISCOVERY_REPO, DISCOVERY_URL};

/// 탐색 가능한 저장소 두 개를 가진 애플리케이션
pub fn application() -> InMemoryApplication {
    InMemoryApplication::new().with_discoverable(DISCOVERY_URL, [DISCOVERY_REPO, "fakerepo02"])
}

#[allow(dead_code)]
pub fn shared(app: InMemoryApplication) -> Arc<InMemoryApplication> {
    Arc::new(app)
}

/// 모든 시나리오가 통과했는지 확인합니다. 실패 시 시나리오 이름과 사유를 출력합니다.
#[allow(dead_code)]
pub fn assert_all_passed(report: &SuiteReport) {
    let failures: Vec<String> = report
        .results
        .iter()
        .filter(|r| r.outcome != ScenarioOutcome::Passed)
        .map(|r| format!("{}: {:?}", r.name, r.outcome))
        .collect();
    assert!(failures.is_empty(), "scenarios did not pass:\n{}", failures.join("\n"));
}

/// 이름으로 결과를 찾아 반환합니다.
#[allow(dead_code)]
pub fn outcome<'a>(report: &'a SuiteReport, name: &str) -> &'a ScenarioOutcome {
    &report
        .result(name)
        .unwrap_or_else(|| panic!("no result for {name}"))
        .outcome
}
