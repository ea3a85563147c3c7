//! 공용 E2E 헬퍼

pub mod app;
pub mod config;
