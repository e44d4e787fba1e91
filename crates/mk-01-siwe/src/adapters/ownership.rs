//! Ownership adapters.

use crate::domain::entities::Address;
use crate::ports::outbound::{OwnershipError, OwnershipResolver};
use std::sync::Arc;

/// Externally owned accounts: the signer owns exactly its own address.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectOwnership;

#[async_trait::async_trait]
impl OwnershipResolver for DirectOwnership {
    async fn is_owner(&self, signer: Address, claimed: Address) -> Result<bool, OwnershipError> {
        Ok(signer == claimed)
    }
}

#[async_trait::async_trait]
impl<T: OwnershipResolver + ?Sized> OwnershipResolver for Arc<T> {
    async fn is_owner(&self, signer: Address, claimed: Address) -> Result<bool, OwnershipError> {
        (**self).is_owner(signer, claimed).await
    }
}
