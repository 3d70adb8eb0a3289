//! Canonical message digests for the recovery protocol
//!
//! Both digests are Keccak-256 over fixed-order byte concatenations. The
//! exact composition is a compatibility contract with the verifier: the
//! recovery service rebuilds the same digest from the transmitted fields
//! to check the signature.

use sha3::{Digest, Keccak256};

use crate::types::{Address, Nonce};

/// Digest signed for the setup step
///
/// Keccak-256 over the 20 address bytes followed by the 16 nonce bytes.
pub fn setup_digest(address: &Address, nonce: &Nonce) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(address.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.finalize().into()
}

/// Digest signed for the recovery step
///
/// Keccak-256 over the old address bytes, the new address bytes, then
/// the 16 nonce bytes. Swapping the two addresses changes the digest.
pub fn recovery_digest(old_address: &Address, new_address: &Address, nonce: &Nonce) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(old_address.as_bytes());
    hasher.update(new_address.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.finalize().into()
}
