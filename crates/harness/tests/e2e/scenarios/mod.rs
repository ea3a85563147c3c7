//! E2E 시나리오

mod content_credential;
mod fault_isolation;
mod ldap;
mod reporting;
