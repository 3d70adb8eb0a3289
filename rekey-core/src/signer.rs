//! Signing capabilities for recovery protocol messages
//!
//! Key material is explicit: a session is built with either a
//! [`LocalSigner`] holding a secp256k1 secret key, or a
//! [`DelegatedSigner`] that asks the tenant's signing endpoint for the
//! signature tuple. Both produce the same `(r, s, v)` shape over the
//! canonical message digests.

use async_trait::async_trait;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::message::{recovery_digest, setup_digest};
use crate::types::{Address, Nonce, TenantSignature, ADDRESS_LENGTH};
use crate::{RecoveryError, RecoveryResult};

/// Offset added to the recovery id in the signature `v` byte
const V_OFFSET: u8 = 27;

/// Capability for producing tenant signatures over protocol messages
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign the setup message for an address with a fresh nonce
    async fn sign_setup(&self, address: &Address) -> RecoveryResult<TenantSignature>;

    /// Sign the recovery message for an address change with a fresh nonce
    async fn sign_recovery(
        &self,
        old_address: &Address,
        new_address: &Address,
    ) -> RecoveryResult<TenantSignature>;
}

/// Signer backed by a locally held secp256k1 secret key
pub struct LocalSigner {
    secp: Secp256k1<All>,
    secret_key: SecretKey,
}

impl LocalSigner {
    /// Create a signer from an existing secret key
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secp: Secp256k1::new(),
            secret_key,
        }
    }

    /// Create a signer from 32 raw secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> RecoveryResult<Self> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            RecoveryError::InvalidKeyMaterial(format!("invalid secret key: {}", e))
        })?;
        Ok(Self::new(secret_key))
    }

    /// Create a signer from a hex-encoded secret key, `0x` prefix optional
    pub fn from_hex(s: &str) -> RecoveryResult<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(stripped)
            .map_err(|e| RecoveryError::InvalidKeyMaterial(format!("invalid hex: {}", e)))?;
        let signer = Self::from_bytes(&bytes);
        bytes.zeroize();
        signer
    }

    /// Generate a signer with a fresh random secret key
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut rand::thread_rng());
        Self { secp, secret_key }
    }

    /// Secret key held by this signer
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Public key for the held secret key
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&self.secp, &self.secret_key)
    }

    /// Account address controlled by the held key
    ///
    /// The last 20 bytes of the Keccak-256 hash of the uncompressed
    /// public key, without its leading format byte.
    pub fn address(&self) -> Address {
        let public_key = self.public_key().serialize_uncompressed();
        let mut hasher = Keccak256::new();
        hasher.update(&public_key[1..]);
        let hash = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[12..]);
        Address::new(bytes)
    }

    /// Sign a prepared digest, attaching the nonce that was hashed into it
    ///
    /// Signing is deterministic: the same key, digest, and nonce always
    /// produce the same tuple.
    pub fn sign_digest(&self, digest: [u8; 32], nonce: Nonce) -> RecoveryResult<TenantSignature> {
        let message = Message::from_digest(digest);
        let (rec_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        let v = u8::try_from(rec_id.to_i32())
            .map_err(|_| RecoveryError::SigningFailed("recovery id out of range".to_string()))?
            + V_OFFSET;

        Ok(TenantSignature { r, s, v, nonce })
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address())
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign_setup(&self, address: &Address) -> RecoveryResult<TenantSignature> {
        let nonce = Nonce::generate();
        let digest = setup_digest(address, &nonce);
        self.sign_digest(digest, nonce)
    }

    async fn sign_recovery(
        &self,
        old_address: &Address,
        new_address: &Address,
    ) -> RecoveryResult<TenantSignature> {
        let nonce = Nonce::generate();
        let digest = recovery_digest(old_address, new_address, &nonce);
        self.sign_digest(digest, nonce)
    }
}

/// Request sent to the tenant's signing endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum TenantSignRequest {
    Setup {
        address: String,
    },
    #[serde(rename_all = "camelCase")]
    Recovery {
        old_addr: String,
        new_addr: String,
    },
}

/// Signature tuple returned by the tenant's signing endpoint
#[derive(Debug, Clone, Deserialize)]
struct TenantSignResponse {
    r: String,
    s: String,
    v: u8,
    nonce: String,
}

/// Signer that delegates to a tenant's signing endpoint
///
/// The tenant receives the logical message (`POST {tenant}/sign` with a
/// `kind`-tagged JSON body) and returns the `(r, s, v)` tuple together
/// with the nonce it hashed. Failures on this call are signing failures,
/// not transport failures of the recovery exchange.
#[derive(Debug, Clone)]
pub struct DelegatedSigner {
    client: reqwest::Client,
    tenant_url: String,
}

impl DelegatedSigner {
    /// Create a delegated signer for a tenant endpoint
    pub fn new(tenant_url: &str, timeout_ms: u64) -> RecoveryResult<Self> {
        url::Url::parse(tenant_url)
            .map_err(|e| RecoveryError::InvalidEndpoint(format!("tenant endpoint: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RecoveryError::HttpError(e))?;

        Ok(Self {
            client,
            tenant_url: tenant_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request_signature(
        &self,
        request: &TenantSignRequest,
    ) -> RecoveryResult<TenantSignature> {
        let url = format!("{}/sign", self.tenant_url);
        tracing::debug!("Requesting tenant signature from {}", url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| RecoveryError::DelegationFailed(format!("tenant request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecoveryError::DelegationFailed(format!(
                "tenant returned status {}",
                status
            )));
        }

        let tuple: TenantSignResponse = response.json().await.map_err(|e| {
            RecoveryError::DelegationFailed(format!("malformed tenant response: {}", e))
        })?;

        parse_tenant_tuple(tuple)
    }
}

#[async_trait]
impl Signer for DelegatedSigner {
    async fn sign_setup(&self, address: &Address) -> RecoveryResult<TenantSignature> {
        let request = TenantSignRequest::Setup {
            address: address.to_hex(),
        };
        self.request_signature(&request).await
    }

    async fn sign_recovery(
        &self,
        old_address: &Address,
        new_address: &Address,
    ) -> RecoveryResult<TenantSignature> {
        let request = TenantSignRequest::Recovery {
            old_addr: old_address.to_hex(),
            new_addr: new_address.to_hex(),
        };
        self.request_signature(&request).await
    }
}

fn parse_tenant_tuple(response: TenantSignResponse) -> RecoveryResult<TenantSignature> {
    let r = decode_scalar(&response.r, "r")?;
    let s = decode_scalar(&response.s, "s")?;
    let nonce = Nonce::parse(&response.nonce)
        .map_err(|e| RecoveryError::DelegationFailed(format!("invalid tenant nonce: {}", e)))?;

    Ok(TenantSignature {
        r,
        s,
        v: response.v,
        nonce,
    })
}

fn decode_scalar(value: &str, name: &str) -> RecoveryResult<[u8; 32]> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped)
        .map_err(|e| RecoveryError::DelegationFailed(format!("invalid {} scalar: {}", name, e)))?;
    if bytes.len() != 32 {
        return Err(RecoveryError::DelegationFailed(format!(
            "invalid {} scalar: expected 32 bytes, got {}",
            name,
            bytes.len()
        )));
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};

    fn fixed_signer() -> LocalSigner {
        LocalSigner::from_bytes(&[0x42; 32]).unwrap()
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = fixed_signer();
        let address = Address::new([0x01; 20]);
        let nonce = Nonce::generate();
        let digest = setup_digest(&address, &nonce);

        let first = signer.sign_digest(digest, nonce).unwrap();
        let second = signer.sign_digest(digest, nonce).unwrap();

        assert_eq!(first.r, second.r);
        assert_eq!(first.s, second.s);
        assert_eq!(first.v, second.v);
    }

    #[test]
    fn test_v_uses_ethereum_offset() {
        let signer = fixed_signer();
        let address = Address::new([0x02; 20]);
        let nonce = Nonce::generate();
        let digest = setup_digest(&address, &nonce);

        let signature = signer.sign_digest(digest, nonce).unwrap();
        assert!(signature.v == 27 || signature.v == 28);
    }

    #[test]
    fn test_public_key_is_recoverable_from_signature() {
        let signer = fixed_signer();
        let old_address = Address::new([0x03; 20]);
        let new_address = Address::new([0x04; 20]);
        let nonce = Nonce::generate();
        let digest = recovery_digest(&old_address, &new_address, &nonce);

        let signature = signer.sign_digest(digest, nonce).unwrap();

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&signature.r);
        compact[32..].copy_from_slice(&signature.s);
        let rec_id = RecoveryId::from_i32(i32::from(signature.v - 27)).unwrap();
        let recoverable = RecoverableSignature::from_compact(&compact, rec_id).unwrap();

        let secp = Secp256k1::new();
        let recovered = secp
            .recover_ecdsa(&Message::from_digest(digest), &recoverable)
            .unwrap();
        assert_eq!(recovered, signer.public_key());
    }

    #[test]
    fn test_from_hex_accepts_prefix() {
        let hex_key = format!("0x{}", "42".repeat(32));
        let with_prefix = LocalSigner::from_hex(&hex_key).unwrap();
        let without_prefix = LocalSigner::from_hex(&"42".repeat(32)).unwrap();
        assert_eq!(with_prefix.address(), without_prefix.address());
    }

    #[test]
    fn test_from_hex_rejects_invalid_input() {
        assert!(LocalSigner::from_hex("not hex").is_err());
        assert!(LocalSigner::from_hex(&"42".repeat(30)).is_err());
        assert!(LocalSigner::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_address_derivation_matches_keccak_tail() {
        let signer = fixed_signer();
        let public_key = signer.public_key().serialize_uncompressed();
        let hash = Keccak256::digest(&public_key[1..]);
        assert_eq!(signer.address().as_bytes(), &hash[12..]);
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = LocalSigner::generate();
        let b = LocalSigner::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let signer = fixed_signer();
        let output = format!("{:?}", signer);
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("42424242"));
    }

    #[test]
    fn test_scalar_decode_rejects_wrong_length() {
        assert!(decode_scalar(&"ab".repeat(32), "r").is_ok());
        assert!(decode_scalar(&format!("0x{}", "ab".repeat(32)), "r").is_ok());
        assert!(decode_scalar(&"ab".repeat(31), "r").is_err());
        assert!(decode_scalar("zz", "s").is_err());
    }

    #[test]
    fn test_tenant_tuple_requires_uuid_nonce() {
        let response = TenantSignResponse {
            r: "ab".repeat(32),
            s: "cd".repeat(32),
            v: 27,
            nonce: "not-a-uuid".to_string(),
        };
        let result = parse_tenant_tuple(response);
        assert!(matches!(result, Err(RecoveryError::DelegationFailed(_))));
    }

    #[test]
    fn test_tenant_request_wire_shape() {
        let request = TenantSignRequest::Recovery {
            old_addr: "0xaa".to_string(),
            new_addr: "0xbb".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["kind"], "recovery");
        assert_eq!(value["oldAddr"], "0xaa");
        assert_eq!(value["newAddr"], "0xbb");

        let request = TenantSignRequest::Setup {
            address: "0xcc".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["kind"], "setup");
        assert_eq!(value["address"], "0xcc");
    }
}
