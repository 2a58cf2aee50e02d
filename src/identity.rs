//! Caller credentials
//!
//! The registry itself only compares [`Address`] values. This module is the
//! host-side half: an ed25519 key pair that owns an address, and a check that
//! turns a signed request into the address the registry should be called with.

use crate::types::Address;
use crate::{Error, Result};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// A key pair acting as one registry participant
pub struct Identity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Identity {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_signing_key(SigningKey::generate(&mut rng))
    }

    /// Rebuild an identity from its 32-byte secret
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        let address = Address::from_public_key(&verifying_key);
        Self {
            signing_key,
            verifying_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a request payload
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Verify a signed request and return the caller address it proves
pub fn authenticate(
    public_key: &[u8; 32],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<Address> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|_| Error::authentication("invalid public key"))?;

    let signature = Ed25519Signature::from_bytes(signature);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| Error::authentication("signature verification failed"))?;

    Ok(Address::from_public_key(&verifying_key))
}
