//! Proof-of-personhood fallback adapter.
//!
//! Serves `verify` through an external [`ProofProvider`] when the page runs
//! without a native host.

use crate::domain::errors::BridgeError;
use crate::ports::outbound::{FallbackAdapter, ProofError, ProofProvider};
use shared_types::{Command, VerifyInput, VerifyOutput};
use tracing::{debug, warn};

const ADAPTER_NAME: &str = "attestation";

pub struct AttestationAdapter<P: ProofProvider> {
    provider: P,
}

impl<P: ProofProvider> AttestationAdapter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P: ProofProvider> FallbackAdapter for AttestationAdapter<P> {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn supports(&self, command: Command) -> bool {
        command == Command::Verify
    }

    async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput, BridgeError> {
        if input.action.is_empty() {
            return Err(BridgeError::ValidationError(
                "'action' must not be empty".to_string(),
            ));
        }

        match self.provider.request_proof(&input).await {
            Ok(output) => {
                debug!(action = %input.action, "Attestation proof received");
                Ok(output)
            }
            Err(ProofError::Rejected) => Err(BridgeError::UserRejected(
                ProofError::Rejected.to_string(),
            )),
            Err(ProofError::Failed(reason)) => {
                warn!(action = %input.action, reason = %reason, "Attestation failed");
                Err(BridgeError::Adapter {
                    adapter: ADAPTER_NAME.to_string(),
                    message: reason,
                })
            }
        }
    }
}
