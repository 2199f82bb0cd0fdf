//! Local ed25519 accounts.

use crate::error::MovementError;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Authentication key scheme byte for single ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// An account whose signing key is held locally.
#[derive(Clone)]
pub struct LocalAccount {
    signing_key: SigningKey,
    address: String,
}

impl LocalAccount {
    /// Generate a fresh random account.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Load an account from a 32-byte hex secret, with or without `0x`.
    pub fn from_secret_hex(secret: &str) -> Result<Self, MovementError> {
        let trimmed = secret.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let bytes = hex::decode(hex_part)
            .map_err(|e| MovementError::InvalidSecret(format!("not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            MovementError::InvalidSecret(format!("expected 32 bytes, got {}", b.len()))
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Account address (`0x` + 64 hex chars).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Public key as `0x`-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.verifying_key().as_bytes()))
    }

    /// Secret key as `0x`-prefixed hex.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Sign a message, returning the signature as `0x`-prefixed hex.
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        format!("0x{}", hex::encode(signature.to_bytes()))
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the account address for a public key: `sha3_256(pubkey || scheme)`.
pub fn derive_address(public_key: &VerifyingKey) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.as_bytes());
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}
