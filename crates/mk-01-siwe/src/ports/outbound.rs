//! # Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::Address;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Error from an ownership lookup.
#[derive(Debug, Error)]
pub enum OwnershipError {
    /// The backing service could not be reached.
    #[error("Ownership lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Ownership lookup failed: {0}")]
    Failed(String),
}

/// Decides whether a recovered signer controls a claimed address.
///
/// Externally owned accounts only control themselves. Smart-contract
/// wallets resolve ownership through their own lookup.
#[async_trait::async_trait]
pub trait OwnershipResolver: Send + Sync {
    async fn is_owner(&self, signer: Address, claimed: Address) -> Result<bool, OwnershipError>;
}
