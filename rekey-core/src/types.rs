//! Core protocol types: addresses, nonces, signature tuples, and wire payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RecoveryError, RecoveryResult};

/// Length of a binary account address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte binary account address
///
/// Addresses travel on the wire as lowercase hex strings with a `0x`
/// prefix; in memory they are fixed-width byte arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Create an address from raw bytes
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create an address from a byte slice
    pub fn from_slice(bytes: &[u8]) -> RecoveryResult<Self> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(RecoveryError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            )));
        }
        let mut buf = [0u8; ADDRESS_LENGTH];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Parse an address from a hex string, `0x` prefix optional
    pub fn from_hex(s: &str) -> RecoveryResult<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != ADDRESS_LENGTH * 2 {
            return Err(RecoveryError::InvalidAddress(format!(
                "expected {} hex characters, got {}",
                ADDRESS_LENGTH * 2,
                stripped.len()
            )));
        }
        let bytes = hex::decode(stripped)
            .map_err(|e| RecoveryError::InvalidAddress(format!("invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Lowercase hex encoding with `0x` prefix, as sent on the wire
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::str::FromStr for Address {
    type Err = RecoveryError;

    fn from_str(s: &str) -> RecoveryResult<Self> {
        Self::from_hex(s)
    }
}

/// A single-use 16-byte value hashed into every signed message
///
/// Generated fresh immediately before hashing, transmitted once next to
/// the signature so the verifier can rebuild the same digest, and
/// discarded afterwards. Never reused across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce(Uuid);

impl Nonce {
    /// Generate a fresh random nonce
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a nonce from its hyphenated string encoding
    pub fn parse(s: &str) -> RecoveryResult<Self> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// The 16 raw bytes fed into the message digest
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recoverable signature over one protocol message
///
/// `v` follows the Ethereum convention of recovery id plus 27. The nonce
/// is the one hashed into the signed digest and must accompany the
/// signature on the wire.
#[derive(Debug, Clone)]
pub struct TenantSignature {
    /// The 32-byte `r` scalar
    pub r: [u8; 32],
    /// The 32-byte `s` scalar
    pub s: [u8; 32],
    /// Recovery byte, 27 or 28
    pub v: u8,
    /// Nonce hashed into the signed message
    pub nonce: Nonce,
}

impl TenantSignature {
    /// Lowercase hex encoding of `r` with `0x` prefix
    pub fn r_hex(&self) -> String {
        format!("0x{}", hex::encode(self.r))
    }

    /// Lowercase hex encoding of `s` with `0x` prefix
    pub fn s_hex(&self) -> String {
        format!("0x{}", hex::encode(self.s))
    }
}

/// Setup request payload sent to the recovery service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    /// Account address being protected
    pub address: String,
    /// Phone number for out-of-band confirmation
    pub phone: String,
    /// Email address for out-of-band confirmation
    pub email: String,
    /// Tenant signature `r` scalar
    pub r_tenant: String,
    /// Tenant signature `s` scalar
    pub s_tenant: String,
    /// Tenant signature recovery byte
    pub v_tenant: u8,
    /// Nonce hashed into the signed setup message
    pub nonce_tenant: String,
}

/// Confirmation payload carrying the out-of-band code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// Code delivered over the out-of-band channel
    pub code: String,
}

/// Recovery execution payload sent to the recovery service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    /// Address being recovered
    pub old_addr: String,
    /// Replacement address
    pub new_addr: String,
    /// Tenant signature `r` scalar
    pub r_tenant: String,
    /// Tenant signature `s` scalar
    pub s_tenant: String,
    /// Tenant signature recovery byte
    pub v_tenant: u8,
    /// Nonce hashed into the signed recovery message
    pub nonce_tenant: String,
}

/// Recovery service response to a setup request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    /// Correlation id minted by the client for this setup flow
    #[serde(default)]
    pub recovery_id: String,
    /// Verification id issued by the service for the confirm step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_id: Option<String>,
    /// Remaining service fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Recovery service response to a confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    /// Verification id the confirmation was submitted against
    #[serde(default)]
    pub verification_id: String,
    /// Remaining service fields, passed through untouched
    ///
    /// A service that queues a ledger transaction reports its hash here
    /// for the caller's own mining wait.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Recovery service response to a recovery execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResponse {
    /// Correlation id the recovery was submitted against
    #[serde(default)]
    pub recovery_id: String,
    /// Remaining service fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
