//! satprobe-harness E2E 테스트
//!
//! 기본 시나리오 목록을 메모리 내 애플리케이션에 대해 [`SuiteRunner`]로 실행하고,
//! 장애 주입으로 실패 분류와 격리를 확인합니다.
//!
//! # Test Structure
//!
//! - `helpers/` -- 설정 빌더, 애플리케이션 팩토리
//! - `scenarios/` -- 시나리오 그룹별 테스트
//!
//! # Running
//!
//! ```bash
//! cargo test -p satprobe-harness --test e2e
//! ```
//!
//! [`SuiteRunner`]: satprobe_harness::SuiteRunner

mod helpers;
mod scenarios;
