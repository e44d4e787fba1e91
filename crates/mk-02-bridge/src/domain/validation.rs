//! Local input checks run before a command is sent.

use super::errors::BridgeError;
use chrono::{DateTime, Duration, Utc};
use mk_01_siwe::{is_hex_address, validate_nonce};
use shared_types::{
    CommandRequest, PayInput, SendTransactionInput, SignMessageInput, SignTypedDataInput,
    WalletAuthInput,
};

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::ValidationError(message.into())
}

/// Validate `request` against the rules for its command kind.
pub fn validate_request(request: &CommandRequest, now: DateTime<Utc>) -> Result<(), BridgeError> {
    match request {
        CommandRequest::WalletAuth(input) => validate_wallet_auth(input, now),
        CommandRequest::SendTransaction(input) => validate_send_transaction(input),
        CommandRequest::SignTypedData(input) => validate_sign_typed_data(input),
        CommandRequest::SignMessage(input) => validate_sign_message(input),
        CommandRequest::Pay(input) => validate_pay(input),
        CommandRequest::Verify(input) if input.action.is_empty() => {
            Err(invalid("'action' is required"))
        }
        CommandRequest::Verify(_)
        | CommandRequest::ShareContacts(_)
        | CommandRequest::RequestPermission(_)
        | CommandRequest::GetPermissions
        | CommandRequest::SendHapticFeedback(_)
        | CommandRequest::Share(_)
        | CommandRequest::Chat(_) => Ok(()),
    }
}

pub fn validate_wallet_auth(input: &WalletAuthInput, now: DateTime<Utc>) -> Result<(), BridgeError> {
    validate_nonce(&input.nonce)?;

    if input.statement.as_deref().is_some_and(|s| s.contains('\n')) {
        return Err(invalid("'statement' must not contain a newline"));
    }

    let window = Duration::days(7);
    if let Some(expiration) = input.expiration_time {
        if expiration <= now {
            return Err(invalid("'expirationTime' must be in the future"));
        }
        if expiration - now > window {
            return Err(invalid("'expirationTime' must be within 7 days"));
        }
    }
    if let Some(not_before) = input.not_before {
        if not_before - now > window {
            return Err(invalid("'notBefore' must be within 7 days"));
        }
    }
    Ok(())
}

pub fn validate_send_transaction(input: &SendTransactionInput) -> Result<(), BridgeError> {
    if input.transactions.is_empty() {
        return Err(invalid("at least one transaction is required"));
    }
    for (index, tx) in input.transactions.iter().enumerate() {
        if !is_hex_address(&tx.address) {
            return Err(invalid(format!(
                "transaction {index}: '{}' is not a valid address",
                tx.address
            )));
        }
    }
    Ok(())
}

pub fn validate_sign_typed_data(input: &SignTypedDataInput) -> Result<(), BridgeError> {
    if input.types.get(&input.primary_type).is_none() {
        return Err(invalid(format!(
            "'primaryType' {} is not defined in 'types'",
            input.primary_type
        )));
    }
    Ok(())
}

pub fn validate_sign_message(input: &SignMessageInput) -> Result<(), BridgeError> {
    if input.message.is_empty() {
        return Err(invalid("'message' is required"));
    }
    Ok(())
}

pub fn validate_pay(input: &PayInput) -> Result<(), BridgeError> {
    if input.reference.is_empty() {
        return Err(invalid("'reference' is required"));
    }
    if input.tokens.is_empty() {
        return Err(invalid("at least one token amount is required"));
    }
    Ok(())
}
