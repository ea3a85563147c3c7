//! 상태 검증기
//!
//! 세션으로 현재 상태를 매번 새로 읽어 기대값과 비교합니다.
//!
//! - 관계 테이블: 이름 기준 집합 비교, 모든 행의 `used_as`는 `"GPG Key"`
//! - 스칼라 필드: 정확히 일치 (빈 문자열과 값 없음은 같음)
//!
//! 불일치는 기대값, 관측값, 차이를 담은 [`HarnessError::Mismatch`]입니다.

use tracing::{debug, warn};

use satprobe_association::{Associations, RepositoryKey};
use satprobe_core::metrics as m;
use satprobe_core::types::ContentType;

use crate::error::HarnessError;
use crate::session::Session;

/// 세션 기반 상태 검증기
pub struct StateVerifier<'a, S> {
    session: &'a S,
}

impl<'a, S: Session> StateVerifier<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// 자격증명 상세에서 현재 연관을 읽습니다 (캐시 없음).
    pub async fn observed_associations(&self, credential: &str) -> Result<Associations, HarnessError> {
        let details = self.session.read_content_credential(credential).await?;
        let label = ContentType::GpgKey.ui_label();

        let mut observed = Associations::new();
        for row in details.products {
            if row.used_as != label {
                return Err(self.mismatch(
                    format!("credential '{credential}' product '{}' used as", row.name),
                    label.to_owned(),
                    row.used_as,
                    "unexpected usage label".to_owned(),
                ));
            }
            observed.products.insert(row.name);
        }
        for row in details.repositories {
            if row.used_as != label {
                return Err(self.mismatch(
                    format!(
                        "credential '{credential}' repository '{}/{}' used as",
                        row.product, row.name
                    ),
                    label.to_owned(),
                    row.used_as,
                    "unexpected usage label".to_owned(),
                ));
            }
            observed
                .repositories
                .insert(RepositoryKey::new(row.product, row.name));
        }
        Ok(observed)
    }

    /// 관측 연관이 기대값과 같은지 확인합니다.
    pub async fn verify_associations(
        &self,
        credential: &str,
        expected: &Associations,
    ) -> Result<Associations, HarnessError> {
        let observed = self.observed_associations(credential).await?;
        let diff = expected.diff(&observed);
        if !diff.is_empty() {
            return Err(self.mismatch(
                format!("associations of credential '{credential}'"),
                expected.to_string(),
                observed.to_string(),
                diff.to_string(),
            ));
        }
        self.passed("associations", credential);
        Ok(observed)
    }

    /// 제품 상세의 자격증명 필드
    pub async fn verify_product_credential(
        &self,
        product: &str,
        expected: Option<&str>,
    ) -> Result<(), HarnessError> {
        let details = self.session.read_product(product).await?;
        self.compare_field(
            format!("gpg key of product '{product}'"),
            expected,
            details.gpg_key.as_deref(),
        )
    }

    /// 저장소 콘텐츠 탭의 자격증명 필드
    pub async fn verify_repository_credential(
        &self,
        product: &str,
        repository: &str,
        expected: Option<&str>,
    ) -> Result<(), HarnessError> {
        let content = self.session.read_repository(product, repository).await?;
        self.compare_field(
            format!("gpg key of repository '{product}/{repository}'"),
            expected,
            content.gpg_key.as_deref(),
        )
    }

    /// 검색 결과에 자격증명이 정확한 이름으로 나타나는지
    pub async fn verify_credential_listed(&self, name: &str) -> Result<(), HarnessError> {
        let found = self.session.search_content_credentials(name).await?;
        if !found.iter().any(|n| n == name) {
            return Err(self.mismatch(
                "content credential search".to_owned(),
                format!("'{name}' listed"),
                format!("{found:?}"),
                format!("missing '{name}'"),
            ));
        }
        self.passed("credential listed", name);
        Ok(())
    }

    /// 자격증명이 검색되지 않고 상세도 열리지 않는지
    pub async fn verify_credential_absent(&self, name: &str) -> Result<(), HarnessError> {
        let found = self.session.search_content_credentials(name).await?;
        if found.iter().any(|n| n == name) {
            return Err(self.mismatch(
                "content credential search".to_owned(),
                format!("'{name}' absent"),
                format!("{found:?}"),
                format!("unexpected '{name}'"),
            ));
        }
        match self.session.read_content_credential(name).await {
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
            Ok(details) => {
                return Err(self.mismatch(
                    format!("details of credential '{name}'"),
                    "not resolvable".to_owned(),
                    format!(
                        "{} products, {} repositories",
                        details.products.len(),
                        details.repositories.len()
                    ),
                    "credential still resolvable".to_owned(),
                ));
            }
        }
        self.passed("credential absent", name);
        Ok(())
    }

    pub async fn verify_auth_source_listed(&self, name: &str) -> Result<(), HarnessError> {
        let found = self.session.search_auth_source(name).await?;
        if !found.iter().any(|n| n == name) {
            return Err(self.mismatch(
                "auth source search".to_owned(),
                format!("'{name}' listed"),
                format!("{found:?}"),
                format!("missing '{name}'"),
            ));
        }
        self.passed("auth source listed", name);
        Ok(())
    }

    pub async fn verify_auth_source_absent(&self, name: &str) -> Result<(), HarnessError> {
        let found = self.session.search_auth_source(name).await?;
        if found.iter().any(|n| n == name) {
            return Err(self.mismatch(
                "auth source search".to_owned(),
                format!("'{name}' absent"),
                format!("{found:?}"),
                format!("unexpected '{name}'"),
            ));
        }
        self.passed("auth source absent", name);
        Ok(())
    }

    fn compare_field(
        &self,
        subject: String,
        expected: Option<&str>,
        observed: Option<&str>,
    ) -> Result<(), HarnessError> {
        let expected = expected.filter(|s| !s.is_empty());
        let observed = observed.filter(|s| !s.is_empty());
        if expected != observed {
            return Err(self.mismatch(
                subject,
                display_field(expected),
                display_field(observed),
                "field differs".to_owned(),
            ));
        }
        self.passed("field", &subject);
        Ok(())
    }

    fn passed(&self, check: &str, subject: &str) {
        debug!(check, subject, "verification passed");
        metrics::counter!(m::VERIFICATIONS_TOTAL, m::LABEL_RESULT => "success").increment(1);
    }

    fn mismatch(
        &self,
        subject: String,
        expected: String,
        observed: String,
        diff: String,
    ) -> HarnessError {
        warn!(
            subject = subject.as_str(),
            expected = expected.as_str(),
            observed = observed.as_str(),
            "verification failed"
        );
        metrics::counter!(m::VERIFICATIONS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
        HarnessError::Mismatch {
            subject,
            expected,
            observed,
            diff,
        }
    }
}

fn display_field(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "<empty>".to_owned(),
    }
}
