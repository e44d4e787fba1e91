//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{
    SignedSiweMessage, SiweMessageData, SiweVerification, SiweVerifyOptions,
};
use crate::domain::errors::SiweError;

/// Sign-In-With-Ethereum message engine.
#[async_trait::async_trait]
pub trait SiweApi: Send + Sync {
    /// Validate `data` against the page and clock, then format it.
    fn generate(&self, data: &SiweMessageData) -> Result<String, SiweError>;

    /// Parse a message in the canonical layout.
    fn parse(&self, message: &str) -> Result<SiweMessageData, SiweError>;

    /// Verify a signed message issued for `nonce`.
    ///
    /// # Errors
    /// * `SiweError::Expired` / `SiweError::NotYetValid` - outside the validity window
    /// * `SiweError::NonceMismatch` - message was issued for another nonce
    /// * `SiweError::SignatureVerificationFailed` - signature does not recover
    ///   to an address that controls `signed.address`
    async fn verify(
        &self,
        signed: &SignedSiweMessage,
        nonce: &str,
        options: &SiweVerifyOptions,
    ) -> Result<SiweVerification, SiweError>;
}
