#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`api`]: 엔티티 API 트레이트와 요청 타입 (`EntityApi`)
//! - [`http`]: REST 구현 (`HttpEntityApi`)
//! - [`session`]: 화면 수준 작업 (`Session`, `ApiSession`)
//! - [`provision`]: 픽스처 생성 (`FixtureProvisioner`)
//! - [`verify`]: 상태 검증 (`StateVerifier`)
//! - [`scenario`]: 시나리오 정의와 실행 (`Scenario`, `ScenarioDriver`)
//! - [`catalog`]: 기본 시나리오 목록
//! - [`runner`]: 묶음 실행과 보고서 (`SuiteRunner`, `SuiteReport`)
//! - [`naming`]: 테스트 이름 생성
//! - [`ldap`]: LDAP 인증 소스 명세와 수명 주기
//! - `memory`: 메모리 내 애플리케이션 (`test-util` 기능)

pub mod api;
pub mod catalog;
pub mod error;
pub mod http;
pub mod ldap;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod naming;
pub mod provision;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod verify;

pub use api::EntityApi;
pub use error::{FailureKind, HarnessError};
pub use http::HttpEntityApi;
pub use ldap::{AuthSourceLifecycle, LdapAuthSourceSpec, LifecycleState};
pub use naming::{FixedNames, NameGenerator, NameStrategy, RandomNames, RunTag, StringKind};
pub use provision::FixtureProvisioner;
pub use runner::{ScenarioOutcome, ScenarioResult, Selection, SuiteReport, SuiteRunner};
pub use scenario::{
    Requirement, Scenario, ScenarioContext, ScenarioDriver, SharedFixtures, Step, Tier,
};
pub use session::{ApiSession, Session};
pub use verify::StateVerifier;
