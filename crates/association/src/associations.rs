//! 자격증명 하나에 대한 연관 집합과 비교 결과
//!
//! 컬렉션 비교는 순서를 무시하는 집합 비교입니다.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 저장소 식별 키 (제품 이름 + 저장소 이름)
///
/// 저장소 이름은 제품 안에서만 유일하므로 제품 이름과 함께 비교합니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepositoryKey {
    pub product: String,
    pub name: String,
}

impl RepositoryKey {
    pub fn new(product: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product, self.name)
    }
}

/// 자격증명에 직접 연결된 제품/저장소 집합
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associations {
    pub products: BTreeSet<String>,
    pub repositories: BTreeSet<RepositoryKey>,
}

impl Associations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.repositories.is_empty()
    }

    /// 기대값(`self`)과 관측값을 비교합니다.
    pub fn diff(&self, observed: &Associations) -> AssociationDiff {
        AssociationDiff {
            missing_products: self
                .products
                .difference(&observed.products)
                .cloned()
                .collect(),
            unexpected_products: observed
                .products
                .difference(&self.products)
                .cloned()
                .collect(),
            missing_repositories: self
                .repositories
                .difference(&observed.repositories)
                .cloned()
                .collect(),
            unexpected_repositories: observed
                .repositories
                .difference(&self.repositories)
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Associations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let products: Vec<&str> = self.products.iter().map(String::as_str).collect();
        let repositories: Vec<String> = self.repositories.iter().map(ToString::to_string).collect();
        write!(
            f,
            "products={{{}}} repositories={{{}}}",
            products.join(", "),
            repositories.join(", ")
        )
    }
}

/// 기대값과 관측값의 차이
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDiff {
    /// 기대했지만 관측되지 않은 제품
    pub missing_products: BTreeSet<String>,
    /// 관측됐지만 기대하지 않은 제품
    pub unexpected_products: BTreeSet<String>,
    pub missing_repositories: BTreeSet<RepositoryKey>,
    pub unexpected_repositories: BTreeSet<RepositoryKey>,
}

impl AssociationDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_products.is_empty()
            && self.unexpected_products.is_empty()
            && self.missing_repositories.is_empty()
            && self.unexpected_repositories.is_empty()
    }
}

impl fmt::Display for AssociationDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no differences");
        }
        let mut parts = Vec::new();
        if !self.missing_products.is_empty() {
            parts.push(format!("missing products: {:?}", self.missing_products));
        }
        if !self.unexpected_products.is_empty() {
            parts.push(format!("unexpected products: {:?}", self.unexpected_products));
        }
        if !self.missing_repositories.is_empty() {
            let names: Vec<String> = self
                .missing_repositories
                .iter()
                .map(ToString::to_string)
                .collect();
            parts.push(format!("missing repositories: {names:?}"));
        }
        if !self.unexpected_repositories.is_empty() {
            let names: Vec<String> = self
                .unexpected_repositories
                .iter()
                .map(ToString::to_string)
                .collect();
            parts.push(format!("unexpected repositories: {names:?}"));
        }
        f.write_str(&parts.join("; "))
    }
}
