//! # SIWE Service
//!
//! Application service implementing [`SiweApi`].
//!
//! ## Verification order
//!
//! 1. Parse the message (structural errors propagate as-is)
//! 2. Validity window (`Expiration Time`, `Not Before`) against the clock
//! 3. Nonce, then optional statement and request id
//! 4. Signature recovery (any failure is `SignatureVerificationFailed`)
//! 5. Ownership of the claimed address, subject to [`AddressMismatchPolicy`]

use crate::adapters::clock::SystemClock;
use crate::adapters::ownership::DirectOwnership;
use crate::domain::ecdsa;
use crate::domain::entities::{
    AddressMismatchPolicy, PageContext, SignedSiweMessage, SiweMessageData, SiweVerification,
    SiweVerifyOptions,
};
use crate::domain::errors::SiweError;
use crate::domain::message;
use crate::domain::validation::{is_hex_address, parse_timestamp};
use crate::ports::inbound::SiweApi;
use crate::ports::outbound::{Clock, OwnershipResolver};
use tracing::{debug, warn};

/// SIWE message engine bound to the page it runs on.
pub struct SiweService<C: Clock = SystemClock, O: OwnershipResolver = DirectOwnership> {
    page: PageContext,
    clock: C,
    ownership: O,
}

impl SiweService {
    pub fn new(page: PageContext) -> Self {
        Self {
            page,
            clock: SystemClock,
            ownership: DirectOwnership,
        }
    }
}

impl<C: Clock, O: OwnershipResolver> SiweService<C, O> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SiweService<C2, O> {
        SiweService {
            page: self.page,
            clock,
            ownership: self.ownership,
        }
    }

    pub fn with_ownership<O2: OwnershipResolver>(self, ownership: O2) -> SiweService<C, O2> {
        SiweService {
            page: self.page,
            clock: self.clock,
            ownership,
        }
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn check_window(&self, data: &SiweMessageData) -> Result<(), SiweError> {
        let now = self.clock.now();
        if let Some(expiration) = &data.expiration_time {
            if now >= parse_timestamp(expiration)? {
                return Err(SiweError::Expired);
            }
        }
        if let Some(not_before) = &data.not_before {
            if now < parse_timestamp(not_before)? {
                return Err(SiweError::NotYetValid);
            }
        }
        Ok(())
    }

    fn check_expectations(
        data: &SiweMessageData,
        nonce: &str,
        options: &SiweVerifyOptions,
    ) -> Result<(), SiweError> {
        if data.nonce != nonce {
            return Err(SiweError::NonceMismatch {
                got: data.nonce.clone(),
                expected: nonce.to_string(),
            });
        }
        if let Some(expected) = &options.statement {
            if data.statement.as_ref() != Some(expected) {
                return Err(SiweError::StatementMismatch {
                    got: data.statement.clone().unwrap_or_default(),
                    expected: expected.clone(),
                });
            }
        }
        if let Some(expected) = &options.request_id {
            if data.request_id.as_ref() != Some(expected) {
                return Err(SiweError::RequestIdMismatch {
                    got: data.request_id.clone().unwrap_or_default(),
                    expected: expected.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<C: Clock, O: OwnershipResolver> SiweApi for SiweService<C, O> {
    fn generate(&self, data: &SiweMessageData) -> Result<String, SiweError> {
        message::generate(data, &self.page, self.clock.now())
    }

    fn parse(&self, message: &str) -> Result<SiweMessageData, SiweError> {
        message::parse(message)
    }

    async fn verify(
        &self,
        signed: &SignedSiweMessage,
        nonce: &str,
        options: &SiweVerifyOptions,
    ) -> Result<SiweVerification, SiweError> {
        let data = message::parse(&signed.message)?;
        self.check_window(&data)?;
        Self::check_expectations(&data, nonce, options)?;

        let signer = ecdsa::recover_personal_signer(&signed.message, &signed.signature)
            .map_err(|e| {
                debug!(error = %e, "Signature recovery failed");
                SiweError::SignatureVerificationFailed
            })?;
        let claimed =
            ecdsa::parse_address(&signed.address).ok_or(SiweError::SignatureVerificationFailed)?;

        // The message body must name the same account the wallet reports.
        let body_matches = !is_hex_address(&data.address)
            || ecdsa::parse_address(&data.address) == Some(claimed);

        let owner = body_matches
            && self.ownership.is_owner(signer, claimed).await.map_err(|e| {
                warn!(error = %e, "Ownership lookup failed");
                SiweError::SignatureVerificationFailed
            })?;

        if !owner {
            debug!(
                signer = %ecdsa::address_to_hex(&signer),
                claimed = %signed.address,
                policy = ?options.mismatch_policy,
                "Recovered signer does not control claimed address"
            );
            return match options.mismatch_policy {
                AddressMismatchPolicy::Reject => Err(SiweError::SignatureVerificationFailed),
                AddressMismatchPolicy::Report => Ok(SiweVerification {
                    is_valid: false,
                    siwe_message_data: data,
                }),
            };
        }

        Ok(SiweVerification {
            is_valid: true,
            siwe_message_data: data,
        })
    }
}
