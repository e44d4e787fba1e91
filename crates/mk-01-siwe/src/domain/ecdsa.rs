//! # Personal-Sign Signatures (secp256k1)
//!
//! Recovery of the signing address from an EIP-191 `personal_sign`
//! signature.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: high-S signatures are rejected
//! - Signatures are 65 bytes `r || s || v` with `v` in {0, 1, 27, 28}
//! - Uses k256 crate for cryptographic operations

use super::entities::Address;
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

pub const SIGNATURE_LENGTH: usize = 65;

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// EIP-191 hash: `keccak256("\x19Ethereum Signed Message:\n" || len || message)`.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let prefix = format!("\x19Ethereum Signed Message:\n{}", bytes.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Decode a 0x-prefixed hex signature into `(signature, v)`.
pub fn parse_signature_hex(signature: &str) -> Result<(Signature, u8), SignatureError> {
    let hex_part = signature
        .strip_prefix("0x")
        .ok_or(SignatureError::InvalidFormat)?;
    let bytes = hex::decode(hex_part).map_err(|_| SignatureError::InvalidFormat)?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidFormat);
    }

    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| SignatureError::InvalidFormat)?;
    Ok((sig, bytes[64]))
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_personal_signer(message: &str, signature: &str) -> Result<Address, SignatureError> {
    let (sig, v) = parse_signature_hex(signature)?;
    recover_address(&personal_message_hash(message), &sig, v)
}

/// Recover the signer's Ethereum address from a prehashed message.
pub fn recover_address(
    message_hash: &[u8; 32],
    signature: &Signature,
    v: u8,
) -> Result<Address, SignatureError> {
    let recovery_id = parse_recovery_id(v)?;

    // normalize_s yields Some only for high-S input
    if signature.normalize_s().is_some() {
        return Err(SignatureError::MalleableSignature);
    }

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, signature, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 hash of public key (without 0x04 prefix)
    let hash = keccak256(&pubkey_slice[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Lowercase 0x-prefixed hex form of an address.
pub fn address_to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Parse a 0x-prefixed hex address. Case is ignored.
pub fn parse_address(value: &str) -> Option<Address> {
    let bytes = hex::decode(value.strip_prefix("0x")?).ok()?;
    bytes.try_into().ok()
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}
