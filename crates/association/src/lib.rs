#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`operation`]: 설정 연산 (`Operation`, `Handle`)
//! - [`model`]: 연산 적용 및 기대값 계산 (`AssociationModel`)
//! - [`associations`]: 연관 집합과 비교 (`Associations`, `AssociationDiff`)
//! - [`error`]: 도메인 에러 (`AssociationError`)

pub mod associations;
pub mod error;
pub mod model;
pub mod operation;

pub use associations::{AssociationDiff, Associations, RepositoryKey};
pub use error::AssociationError;
pub use model::{AssociationModel, expected_associations};
pub use operation::{Handle, Operation};
