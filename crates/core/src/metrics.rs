//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 하네스는 이 상수로 `metrics::counter!()`, `metrics::histogram!()`을 호출합니다.
//! 레코더를 설치하지 않으면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `satprobe_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 엔티티 종류 레이블 키 (organization, product, ...)
pub const LABEL_ENTITY: &str = "entity";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 실패 분류 레이블 키 (fixture, action, mismatch)
pub const LABEL_FAILURE_KIND: &str = "kind";

// ─── 시나리오 메트릭 ────────────────────────────────────────────────

/// 실행된 시나리오 수 (counter)
pub const SCENARIOS_RUN_TOTAL: &str = "satprobe_scenarios_run_total";

/// 통과한 시나리오 수 (counter)
pub const SCENARIOS_PASSED_TOTAL: &str = "satprobe_scenarios_passed_total";

/// 실패한 시나리오 수 (counter, label: kind)
pub const SCENARIOS_FAILED_TOTAL: &str = "satprobe_scenarios_failed_total";

/// 건너뛴 시나리오 수 (counter)
pub const SCENARIOS_SKIPPED_TOTAL: &str = "satprobe_scenarios_skipped_total";

/// 시나리오 소요 시간 (histogram, 초)
pub const SCENARIO_DURATION_SECONDS: &str = "satprobe_scenario_duration_seconds";

// ─── 하네스 메트릭 ──────────────────────────────────────────────────

/// 생성된 픽스처 수 (counter, label: entity)
pub const FIXTURES_CREATED_TOTAL: &str = "satprobe_fixtures_created_total";

/// API 요청 수 (counter, label: result)
pub const API_REQUESTS_TOTAL: &str = "satprobe_api_requests_total";

/// 연관 검증 횟수 (counter, label: result)
pub const VERIFICATIONS_TOTAL: &str = "satprobe_verifications_total";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(SCENARIOS_RUN_TOTAL, "Total number of scenarios executed");
    describe_counter!(SCENARIOS_PASSED_TOTAL, "Scenarios that passed");
    describe_counter!(
        SCENARIOS_FAILED_TOTAL,
        "Scenarios that failed, by failure kind"
    );
    describe_counter!(
        SCENARIOS_SKIPPED_TOTAL,
        "Scenarios skipped because an external fixture was unavailable"
    );
    describe_histogram!(
        SCENARIO_DURATION_SECONDS,
        "Wall-clock duration of a single scenario in seconds"
    );
    describe_counter!(
        FIXTURES_CREATED_TOTAL,
        "Entities created by the fixture provisioner, by entity kind"
    );
    describe_counter!(
        API_REQUESTS_TOTAL,
        "Requests sent to the management API, by result"
    );
    describe_counter!(
        VERIFICATIONS_TOTAL,
        "State verifications performed, by result"
    );
}
