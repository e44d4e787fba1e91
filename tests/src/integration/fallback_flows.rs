//! # Fallback Flows
//!
//! The same public API in a plain browser: no descriptor, no channel, every
//! supported command served by a registered fallback adapter.

#[cfg(test)]
mod tests {
    use crate::support::{config, descriptor, InMemoryProofs, InMemoryWallet, PAGE_URL};
    use chrono::{Duration, Utc};
    use mk_01_siwe::{
        AddressMismatchPolicy, FixedClock, PageContext, SignedSiweMessage, SiweApi, SiweError,
        SiweService, SiweVerifyOptions,
    };
    use mk_02_bridge::{
        AttestationAdapter, BridgeApi, BridgeError, MemoryChannel, MiniKitBridge, NoopTransport,
        Route, StaticDescriptor, WagmiAdapter, WebviewTransport, NATIVE_CONNECTOR_ID,
    };
    use serde_json::json;
    use shared_bus::SubscriptionBus;
    use shared_types::{
        Command, SendTransactionInput, SignTypedDataInput, TransactionCall, VerificationLevel,
        VerifyInput, WalletAuthInput,
    };
    use std::sync::Arc;

    fn page() -> PageContext {
        PageContext::parse(PAGE_URL).unwrap()
    }

    fn browser_bridge() -> MiniKitBridge {
        MiniKitBridge::install(
            config(),
            Arc::new(NoopTransport),
            Arc::new(StaticDescriptor::absent()),
            Arc::new(SubscriptionBus::new()),
        )
        .unwrap()
    }

    async fn sign_in(bridge: &MiniKitBridge, nonce: &str) -> SignedSiweMessage {
        let output = bridge
            .wallet_auth(WalletAuthInput {
                nonce: nonce.into(),
                statement: Some("Welcome back".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        SignedSiweMessage {
            message: output.message,
            signature: output.signature,
            address: output.address,
        }
    }

    #[tokio::test]
    async fn test_browser_sign_in_round_trip() {
        let bridge = browser_bridge();
        let wallet = InMemoryWallet::random(&[NATIVE_CONNECTOR_ID, "injected"]);
        let expected = wallet.address();
        bridge.set_fallback_adapter(Arc::new(WagmiAdapter::new(wallet, page())));

        let nonce = "814434bded2c412eaa2cc4b266a42027";
        let signed = sign_in(&bridge, nonce).await;
        assert_eq!(signed.address, expected);
        assert_eq!(bridge.wallet_address(), Some(expected));

        let siwe = SiweService::new(page());
        let verified = siwe
            .verify(&signed, nonce, &SiweVerifyOptions::default())
            .await
            .unwrap();
        assert!(verified.is_valid);
        assert_eq!(verified.siwe_message_data.uri, PAGE_URL);
        assert_eq!(
            verified.siwe_message_data.statement.as_deref(),
            Some("Welcome back")
        );

        let err = siwe
            .verify(&signed, "someothernonce", &SiweVerifyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SiweError::NonceMismatch { .. }));
    }

    #[tokio::test]
    async fn test_sign_in_expires_with_its_window() {
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(Arc::new(WagmiAdapter::new(
            InMemoryWallet::random(&["injected"]),
            page(),
        )));
        let issued = Utc::now();
        let output = bridge
            .wallet_auth(WalletAuthInput {
                nonce: "window1234".into(),
                expiration_time: Some(issued + Duration::hours(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        let signed = SignedSiweMessage {
            message: output.message,
            signature: output.signature,
            address: output.address,
        };

        let within =
            SiweService::new(page()).with_clock(FixedClock::new(issued + Duration::minutes(30)));
        assert!(within
            .verify(&signed, "window1234", &SiweVerifyOptions::default())
            .await
            .unwrap()
            .is_valid);

        let after =
            SiweService::new(page()).with_clock(FixedClock::new(issued + Duration::hours(2)));
        assert_eq!(
            after
                .verify(&signed, "window1234", &SiweVerifyOptions::default())
                .await
                .unwrap_err(),
            SiweError::Expired
        );
    }

    #[tokio::test]
    async fn test_tampered_sign_in_is_rejected_not_invalid() {
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(Arc::new(WagmiAdapter::new(
            InMemoryWallet::random(&["injected"]),
            page(),
        )));
        let signed = sign_in(&bridge, "abc12345").await;
        let siwe = SiweService::new(page());

        // Flip one byte of `s`.
        let mut bytes = hex::decode(&signed.signature[2..]).unwrap();
        bytes[40] ^= 0x01;
        let tampered = SignedSiweMessage {
            signature: format!("0x{}", hex::encode(bytes)),
            ..signed.clone()
        };
        assert_eq!(
            siwe.verify(&tampered, "abc12345", &SiweVerifyOptions::default())
                .await
                .unwrap_err(),
            SiweError::SignatureVerificationFailed
        );

        let other = InMemoryWallet::random(&["injected"]).address();
        let mismatched = SignedSiweMessage {
            address: other,
            ..signed
        };
        assert_eq!(
            siwe.verify(&mismatched, "abc12345", &SiweVerifyOptions::default())
                .await
                .unwrap_err(),
            SiweError::SignatureVerificationFailed
        );
    }

    #[tokio::test]
    async fn test_report_policy_returns_invalid_for_foreign_address() {
        let wallet = InMemoryWallet::random(&["injected"]);
        let adapter = WagmiAdapter::new(wallet, page());
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(Arc::new(adapter));
        let signed = sign_in(&bridge, "abc12345").await;

        // The body names the signer, the claim names someone else.
        let claimed = InMemoryWallet::random(&[]).address();
        let message = signed.message.replace(&signed.address, &claimed);
        let signature = crate::support::personal_sign(
            &k256::ecdsa::SigningKey::random(&mut rand::thread_rng()),
            &message,
        );
        let verified = SiweService::new(page())
            .verify(
                &SignedSiweMessage {
                    message,
                    signature,
                    address: claimed,
                },
                "abc12345",
                &SiweVerifyOptions {
                    mismatch_policy: AddressMismatchPolicy::Report,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!verified.is_valid);
    }

    #[tokio::test]
    async fn test_batch_transactions_execute_in_order() {
        let wallet = InMemoryWallet::random(&["injected"]);
        let adapter = Arc::new(WagmiAdapter::new(wallet, page()));
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(adapter.clone());

        let call = |byte: &str| TransactionCall {
            address: format!("0x{}", byte.repeat(20)),
            data: Some("0xa9059cbb".into()),
            value: None,
        };
        let output = bridge
            .send_transaction(SendTransactionInput {
                transactions: vec![call("aa"), call("bb")],
                chain_id: Some(480),
            })
            .await
            .unwrap();

        assert_eq!(output.hashes.len(), 2);
        assert_eq!(*adapter.backend().receipts_awaited.lock(), output.hashes);
        assert_eq!(output.transaction_hash.as_ref(), output.hashes.last());
    }

    #[tokio::test]
    async fn test_verify_through_attestation_and_replacement() {
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(Arc::new(WagmiAdapter::new(
            InMemoryWallet::random(&["injected"]),
            page(),
        )));
        assert_eq!(bridge.negotiate(Command::SignMessage).unwrap(), Route::Fallback);

        // Last writer wins: the wagmi adapter is gone.
        bridge.set_fallback_adapter(Arc::new(AttestationAdapter::new(InMemoryProofs {
            blocked_actions: vec!["banned".into()],
        })));
        assert!(matches!(
            bridge.negotiate(Command::SignMessage),
            Err(BridgeError::UnsupportedCommand { .. })
        ));

        let output = bridge
            .verify(VerifyInput {
                action: "claim-airdrop".into(),
                signal: Some("0x01".into()),
                verification_level: VerificationLevel::Orb,
            })
            .await
            .unwrap();
        assert!(output.nullifier_hash.starts_with("0x"));

        let err = bridge
            .verify(VerifyInput {
                action: "banned".into(),
                signal: None,
                verification_level: VerificationLevel::Orb,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UserRejected(_)));

        bridge.fallback().clear_adapter();
        assert!(!bridge.fallback().has_adapter());
    }

    #[tokio::test]
    async fn test_host_without_typed_data_falls_back() {
        let channel = Arc::new(MemoryChannel::new());
        let bridge = MiniKitBridge::install(
            config(),
            Arc::new(WebviewTransport::new().with_ios(channel.clone())),
            Arc::new(StaticDescriptor::new(Some(descriptor(&[("sign-message", 1)])))),
            Arc::new(SubscriptionBus::new()),
        )
        .unwrap();
        bridge.set_fallback_adapter(Arc::new(
            WagmiAdapter::new(InMemoryWallet::random(&[NATIVE_CONNECTOR_ID]), page())
                .with_native_host(true),
        ));

        let output = bridge
            .sign_typed_data(SignTypedDataInput {
                types: json!({ "Permit": [{ "name": "owner", "type": "address" }] }),
                primary_type: "Permit".into(),
                message: json!({ "owner": "0x00" }),
                domain: None,
                chain_id: Some(480),
            })
            .await
            .unwrap();
        assert!(output.signature.starts_with("0x"));
        assert!(channel.posted().is_empty());
    }

    #[tokio::test]
    async fn test_native_only_connector_skipped_in_browser() {
        let bridge = browser_bridge();
        bridge.set_fallback_adapter(Arc::new(WagmiAdapter::new(
            InMemoryWallet::random(&[NATIVE_CONNECTOR_ID]),
            page(),
        )));

        let err = bridge
            .wallet_auth(WalletAuthInput {
                nonce: "abc12345".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Adapter { .. }));
        assert_eq!(bridge.wallet_address(), None);
    }
}
