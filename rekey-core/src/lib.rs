//! rekey - client-side account recovery protocol
//!
//! This crate implements the client half of a three-party account
//! recovery flow: an account owner, a tenant authority that co-signs
//! recovery actions, and a remote recovery service that verifies
//! signatures and issues out-of-band confirmation codes.
//!
//! The entry point is [`RecoverySession`], built with a recovery service
//! endpoint and a [`Signer`]: either a [`LocalSigner`] holding a
//! secp256k1 key, or a [`DelegatedSigner`] that calls out to the
//! tenant's signing endpoint. The session exposes three independent
//! async operations, one per protocol step:
//!
//! - [`RecoverySession::initiate_setup`] registers an address for
//!   recovery,
//! - [`RecoverySession::confirm_setup`] submits the out-of-band code,
//! - [`RecoverySession::initiate_recovery`] rotates the old address to
//!   a new one.
//!
//! Every signed message hashes in a fresh single-use nonce, and every
//! response is returned merged with the client-side correlation id so
//! callers can thread the multi-step flow themselves.

pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod signer;
pub mod types;

pub use config::{HttpConfig, SessionConfig};
pub use error::{ErrorKind, RecoveryError, RecoveryResult};
pub use message::{recovery_digest, setup_digest};
pub use session::RecoverySession;
pub use signer::{DelegatedSigner, LocalSigner, Signer};
pub use types::{
    Address, ConfirmRequest, ConfirmResponse, Nonce, RecoveryRequest, RecoveryResponse,
    SetupRequest, SetupResponse, TenantSignature, ADDRESS_LENGTH,
};
