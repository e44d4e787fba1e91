//! # Native Host Flows
//!
//! The bridge talks to a [`SimulatedHost`] exactly as it would to a real
//! one: envelopes go out over the webview channel, answers come back as raw
//! JSON through the event pump and the Subscription Bus.
//!
//! ## Flows Tested:
//!
//! 1. **Sign-in**: bridge builds the SIWE template, host signs it, the SIWE
//!    engine verifies the result
//! 2. **Correlation**: concurrent commands answered out of order
//! 3. **Rejection / timeout**: host errors and silence map to the taxonomy
//! 4. **Unsolicited pushes**: reach app listeners without touching requests
//! 5. **Shared bus**: app subscribe/unsubscribe on response events never
//!    strands the bridge

#[cfg(test)]
mod tests {
    use crate::support::{descriptor, personal_sign, start_native_session, SimulatedHost, PAGE_URL};
    use mk_01_siwe::domain::ecdsa::recover_personal_signer;
    use mk_01_siwe::{
        address_to_hex, PageContext, SignedSiweMessage, SiweApi, SiweService, SiweVerifyOptions,
    };
    use mk_02_bridge::{BridgeApi, BridgeError};
    use mk_telemetry::{init_logging, TelemetryConfig};
    use serde_json::json;
    use shared_types::{
        Command, CommandRequest, PayInput, SignMessageInput, TokenAmount, WalletAuthInput,
        PERMISSION_REVOKED_EVENT,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn full_host() -> serde_json::Value {
        descriptor(&[
            ("wallet-auth", 2),
            ("sign-message", 1),
            ("pay", 1),
            ("send-transaction", 1),
        ])
    }

    #[tokio::test]
    async fn test_native_sign_in_verifies_end_to_end() {
        let _logging = init_logging(&TelemetryConfig::for_tests()).unwrap();
        let session = start_native_session(SimulatedHost::new(), full_host());
        assert!(session.bridge.is_installed());

        let output = session
            .bridge
            .wallet_auth(WalletAuthInput {
                nonce: "n0nce1234abcd".into(),
                statement: Some("Sign in to the mini-app".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(output.address, session.host_address);
        assert_eq!(
            session.bridge.wallet_address().as_deref(),
            Some(session.host_address.as_str())
        );

        let siwe = SiweService::new(PageContext::parse(PAGE_URL).unwrap());
        let verified = siwe
            .verify(
                &SignedSiweMessage {
                    message: output.message,
                    signature: output.signature,
                    address: output.address,
                },
                "n0nce1234abcd",
                &SiweVerifyOptions {
                    statement: Some("Sign in to the mini-app".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(verified.is_valid);
        assert_eq!(verified.siwe_message_data.chain_id, 480);
        assert_eq!(verified.siwe_message_data.domain, "mini.example.org");
    }

    #[tokio::test]
    async fn test_concurrent_commands_settle_by_request_id() {
        let session = start_native_session(
            SimulatedHost::new().answering_in_reverse_batches(3),
            full_host(),
        );

        let mut calls = Vec::new();
        for text in ["first", "second", "third"] {
            let bridge = session.bridge.clone();
            calls.push(tokio::spawn(async move {
                let output = bridge
                    .sign_message(SignMessageInput {
                        message: text.into(),
                    })
                    .await;
                (text, output)
            }));
        }

        for call in calls {
            let (text, output) = call.await.unwrap();
            let output = output.unwrap();
            let signer = recover_personal_signer(text, &output.signature).unwrap();
            assert_eq!(address_to_hex(&signer), session.host_address);
        }
        assert_eq!(session.bridge.pending_count(), 0);
    }

    fn coffee() -> PayInput {
        PayInput {
            reference: "order-17".into(),
            to: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            tokens: vec![TokenAmount {
                symbol: "WLD".into(),
                token_amount: "1000000000000000000".into(),
            }],
            description: "Coffee".into(),
        }
    }

    #[tokio::test]
    async fn test_native_payment_returns_typed_receipt() {
        let session = start_native_session(SimulatedHost::new(), full_host());
        let output = session.bridge.pay(coffee()).await.unwrap();
        assert_eq!(output.reference, "order-17");
        assert!(output.transaction_id.starts_with("tx-"));
        assert_eq!(output.status, "success");
    }

    #[tokio::test]
    async fn test_host_rejection_is_user_rejected() {
        let session = start_native_session(
            SimulatedHost::new().rejecting(Command::Pay),
            full_host(),
        );

        let err = session
            .bridge
            .pay(coffee())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UserRejected(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_host_times_out() {
        // Batch never fills, so the host never answers.
        let session = start_native_session(
            SimulatedHost::new().answering_in_reverse_batches(100),
            full_host(),
        );

        let err = session
            .bridge
            .run(
                CommandRequest::SignMessage(SignMessageInput {
                    message: "anyone there?".into(),
                }),
                Some(Duration::from_secs(2)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Timeout {
                timeout_ms: 2_000,
                ..
            }
        ));
        assert_eq!(session.bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unsolicited_push_reaches_app_listener() {
        let session = start_native_session(SimulatedHost::new(), full_host());
        let revoked = Arc::new(AtomicUsize::new(0));
        let counter = revoked.clone();
        let _listener = session.bus.subscribe(PERMISSION_REVOKED_EVENT, move |payload| {
            if payload["payload"]["permission"] == "notifications" {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });

        session
            .to_page
            .send(
                json!({
                    "event": PERMISSION_REVOKED_EVENT,
                    "status": "success",
                    "payload": { "permission": "notifications" },
                })
                .to_string(),
            )
            .unwrap();

        while revoked.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_app_listeners_share_response_events() {
        let session = start_native_session(SimulatedHost::new(), full_host());
        let event = Command::SignMessage.response_event();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let app = session.bus.subscribe(event, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let sign = |text: &str| SignMessageInput {
            message: text.into(),
        };
        session.bridge.sign_message(sign("one")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // Clearing the event name takes the bridge's listener with it.
        session.bus.unsubscribe(event);
        assert!(!app.is_active());
        let output = session.bridge.sign_message(sign("two")).await.unwrap();
        let signer = recover_personal_signer("two", &output.signature).unwrap();
        assert_eq!(address_to_hex(&signer), session.host_address);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(session.bus.listener_count(event), 1);
        assert_eq!(session.bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_forged_host_signature_fails_verification() {
        let session = start_native_session(SimulatedHost::new(), full_host());
        let output = session
            .bridge
            .wallet_auth(WalletAuthInput {
                nonce: "abcdef123456".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let impostor = k256::ecdsa::SigningKey::from_slice(&[0x77; 32]).unwrap();
        let siwe = SiweService::new(PageContext::parse(PAGE_URL).unwrap());
        let err = siwe
            .verify(
                &SignedSiweMessage {
                    signature: personal_sign(&impostor, &output.message),
                    message: output.message,
                    address: output.address,
                },
                "abcdef123456",
                &SiweVerifyOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, mk_01_siwe::SiweError::SignatureVerificationFailed);
    }
}
