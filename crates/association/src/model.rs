//! 연관 행렬 모델 -- 연산 시퀀스로부터 기대 연관 상태를 계산
//!
//! [`AssociationModel`]은 적용된 연산을 순서대로 기록하고, 각 자격증명의
//! 기대 `(제품 집합, 저장소 집합)`을 직접 연결만으로 계산합니다.
//!
//! # 규칙
//! - 제품 연결과 저장소 연결은 서로 독립입니다. 저장소는 제품의 자격증명을 상속하지 않고,
//!   제품도 저장소를 통해 연결되지 않습니다.
//! - 연결 키는 핸들입니다. 이름 변경 후에도 연결은 유지됩니다.
//! - 삭제된 자격증명의 연관은 더 이상 조회되지 않으며(`None`),
//!   연결됐던 제품/저장소의 자격증명 필드는 비어 있어야 합니다.

use std::collections::BTreeMap;

use tracing::debug;

use satprobe_core::types::EntityKind;

use crate::associations::{Associations, RepositoryKey};
use crate::error::AssociationError;
use crate::operation::{Handle, Operation};

#[derive(Debug, Clone)]
struct CredentialState {
    name: String,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct ProductState {
    name: String,
    credential: Option<Handle>,
}

#[derive(Debug, Clone)]
struct RepositoryState {
    name: String,
    product: Handle,
    credential: Option<Handle>,
}

/// 연관 행렬 모델
#[derive(Debug, Clone, Default)]
pub struct AssociationModel {
    credentials: BTreeMap<Handle, CredentialState>,
    products: BTreeMap<Handle, ProductState>,
    repositories: BTreeMap<Handle, RepositoryState>,
    history: Vec<Operation>,
}

impl AssociationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 연산 시퀀스를 처음부터 적용한 모델을 만듭니다.
    pub fn replay<'a>(
        ops: impl IntoIterator<Item = &'a Operation>,
    ) -> Result<Self, AssociationError> {
        let mut model = Self::new();
        for op in ops {
            model.apply(op.clone())?;
        }
        Ok(model)
    }

    /// 지금까지 적용된 연산
    pub fn history(&self) -> &[Operation] {
        &self.history
    }

    /// 연산을 검증하고 적용합니다.
    ///
    /// 검증에 실패하면 모델은 변경되지 않습니다.
    pub fn apply(&mut self, op: Operation) -> Result<(), AssociationError> {
        match &op {
            Operation::CreateCredential { credential, name } => {
                self.ensure_unbound(credential)?;
                ensure_named(EntityKind::ContentCredential, credential, name)?;
                self.ensure_credential_name_free(name)?;
                self.credentials.insert(
                    credential.clone(),
                    CredentialState {
                        name: name.clone(),
                        deleted: false,
                    },
                );
            }
            Operation::CreateProduct {
                product,
                name,
                credential,
            } => {
                self.ensure_unbound(product)?;
                ensure_named(EntityKind::Product, product, name)?;
                if let Some(credential) = credential {
                    self.live_credential(credential)?;
                }
                self.products.insert(
                    product.clone(),
                    ProductState {
                        name: name.clone(),
                        credential: credential.clone(),
                    },
                );
            }
            Operation::CreateRepository {
                repository,
                name,
                product,
                credential,
            } => {
                self.ensure_unbound(repository)?;
                ensure_named(EntityKind::Repository, repository, name)?;
                if !self.products.contains_key(product) {
                    return Err(AssociationError::UnknownHandle {
                        kind: EntityKind::Product,
                        handle: product.clone(),
                    });
                }
                if let Some(credential) = credential {
                    self.live_credential(credential)?;
                }
                self.repositories.insert(
                    repository.clone(),
                    RepositoryState {
                        name: name.clone(),
                        product: product.clone(),
                        credential: credential.clone(),
                    },
                );
            }
            Operation::RenameCredential {
                credential,
                new_name,
            } => {
                ensure_named(EntityKind::ContentCredential, credential, new_name)?;
                let current = self.live_credential(credential)?.name.clone();
                if current != *new_name {
                    self.ensure_credential_name_free(new_name)?;
                }
                if let Some(state) = self.credentials.get_mut(credential) {
                    state.name = new_name.clone();
                }
            }
            Operation::DeleteCredential { credential } => {
                self.live_credential(credential)?;
                if let Some(state) = self.credentials.get_mut(credential) {
                    state.deleted = true;
                }
            }
        }

        debug!(op = op.kind(), "association model updated");
        self.history.push(op);
        Ok(())
    }

    /// 자격증명의 기대 연관 집합
    ///
    /// 삭제됐거나 존재하지 않는 자격증명은 `None`입니다.
    pub fn expected_associations(&self, credential: &Handle) -> Option<Associations> {
        let state = self.credentials.get(credential)?;
        if state.deleted {
            return None;
        }

        let products = self
            .products
            .values()
            .filter(|p| p.credential.as_ref() == Some(credential))
            .map(|p| p.name.clone())
            .collect();

        let repositories = self
            .repositories
            .values()
            .filter(|r| r.credential.as_ref() == Some(credential))
            .filter_map(|r| {
                self.products
                    .get(&r.product)
                    .map(|p| RepositoryKey::new(p.name.clone(), r.name.clone()))
            })
            .collect();

        Some(Associations {
            products,
            repositories,
        })
    }

    /// 제품 상세의 자격증명 필드 기대값 (현재 이름, 연결 없음/삭제 시 `None`)
    pub fn expected_product_credential(
        &self,
        product: &Handle,
    ) -> Result<Option<String>, AssociationError> {
        let state = self
            .products
            .get(product)
            .ok_or_else(|| AssociationError::UnknownHandle {
                kind: EntityKind::Product,
                handle: product.clone(),
            })?;
        Ok(self.current_name(state.credential.as_ref()))
    }

    /// 저장소 콘텐츠 탭의 자격증명 필드 기대값
    pub fn expected_repository_credential(
        &self,
        repository: &Handle,
    ) -> Result<Option<String>, AssociationError> {
        let state =
            self.repositories
                .get(repository)
                .ok_or_else(|| AssociationError::UnknownHandle {
                    kind: EntityKind::Repository,
                    handle: repository.clone(),
                })?;
        Ok(self.current_name(state.credential.as_ref()))
    }

    /// 자격증명의 현재 이름 (삭제된 경우 `None`)
    pub fn credential_name(&self, credential: &Handle) -> Option<&str> {
        self.credentials
            .get(credential)
            .filter(|c| !c.deleted)
            .map(|c| c.name.as_str())
    }

    /// 삭제 여부와 무관하게 마지막으로 알려진 이름
    pub fn last_known_credential_name(&self, credential: &Handle) -> Option<&str> {
        self.credentials.get(credential).map(|c| c.name.as_str())
    }

    pub fn product_name(&self, product: &Handle) -> Option<&str> {
        self.products.get(product).map(|p| p.name.as_str())
    }

    /// 저장소의 `(제품 핸들, 저장소 이름)`
    pub fn repository(&self, repository: &Handle) -> Option<(&Handle, &str)> {
        self.repositories
            .get(repository)
            .map(|r| (&r.product, r.name.as_str()))
    }

    /// 삭제 전 이 자격증명에 연결됐던 제품 핸들
    pub fn products_linked_to(&self, credential: &Handle) -> Vec<Handle> {
        self.products
            .iter()
            .filter(|(_, p)| p.credential.as_ref() == Some(credential))
            .map(|(h, _)| h.clone())
            .collect()
    }

    /// 삭제 전 이 자격증명에 연결됐던 저장소 핸들
    pub fn repositories_linked_to(&self, credential: &Handle) -> Vec<Handle> {
        self.repositories
            .iter()
            .filter(|(_, r)| r.credential.as_ref() == Some(credential))
            .map(|(h, _)| h.clone())
            .collect()
    }

    fn current_name(&self, credential: Option<&Handle>) -> Option<String> {
        credential
            .and_then(|h| self.credential_name(h))
            .map(str::to_owned)
    }

    fn ensure_unbound(&self, handle: &Handle) -> Result<(), AssociationError> {
        if self.credentials.contains_key(handle)
            || self.products.contains_key(handle)
            || self.repositories.contains_key(handle)
        {
            return Err(AssociationError::DuplicateHandle(handle.clone()));
        }
        Ok(())
    }

    fn ensure_credential_name_free(&self, name: &str) -> Result<(), AssociationError> {
        if self
            .credentials
            .values()
            .any(|c| !c.deleted && c.name == name)
        {
            return Err(AssociationError::DuplicateCredentialName(name.to_owned()));
        }
        Ok(())
    }

    fn live_credential(&self, handle: &Handle) -> Result<&CredentialState, AssociationError> {
        match self.credentials.get(handle) {
            None => Err(AssociationError::UnknownHandle {
                kind: EntityKind::ContentCredential,
                handle: handle.clone(),
            }),
            Some(state) if state.deleted => {
                Err(AssociationError::CredentialDeleted(handle.clone()))
            }
            Some(state) => Ok(state),
        }
    }
}

fn ensure_named(kind: EntityKind, handle: &Handle, name: &str) -> Result<(), AssociationError> {
    if name.trim().is_empty() {
        return Err(AssociationError::EmptyName {
            kind,
            handle: handle.clone(),
        });
    }
    Ok(())
}

/// 연산 슬라이스를 재생해 자격증명의 기대 연관을 계산합니다.
pub fn expected_associations(
    credential: &Handle,
    ops: &[Operation],
) -> Result<Option<Associations>, AssociationError> {
    Ok(AssociationModel::replay(ops)?.expected_associations(credential))
}
