//! Recovery session driving the three-step protocol exchange
//!
//! A session holds the recovery service endpoint and a signing
//! capability, both fixed at construction. It keeps no per-flow state:
//! correlation ids are returned to the caller and passed back into later
//! steps, so the caller owns the flow from setup through confirmation to
//! recovery execution.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::signer::{DelegatedSigner, LocalSigner, Signer};
use crate::types::{
    Address, ConfirmRequest, ConfirmResponse, RecoveryRequest, RecoveryResponse, SetupRequest,
    SetupResponse,
};
use crate::{RecoveryError, RecoveryResult};

/// Client session for the account recovery protocol
///
/// Safe to share across tasks behind an [`Arc`]; every operation is a
/// single request with no retries, so each call either returns the
/// service's response or the first error encountered.
#[derive(Clone)]
pub struct RecoverySession {
    client: Client,
    recovery_url: String,
    signer: Arc<dyn Signer>,
}

impl RecoverySession {
    /// Create a session from configuration and an explicit signer
    ///
    /// Fails with a configuration error before any network activity if
    /// the recovery endpoint is missing or unparsable.
    pub fn new(config: &SessionConfig, signer: Arc<dyn Signer>) -> RecoveryResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .build()
            .map_err(|e| RecoveryError::HttpError(e))?;

        Ok(Self {
            client,
            recovery_url: config.recovery_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Create a self-signing session from a local secret key
    pub fn with_local_signer(config: &SessionConfig, signer: LocalSigner) -> RecoveryResult<Self> {
        Self::new(config, Arc::new(signer))
    }

    /// Create a session that delegates signing to the configured tenant
    pub fn with_delegated_signer(config: &SessionConfig) -> RecoveryResult<Self> {
        let tenant_url = config.tenant_url.as_deref().ok_or_else(|| {
            RecoveryError::MissingTenantEndpoint(
                "delegated signing requires a tenant endpoint".to_string(),
            )
        })?;
        let signer = DelegatedSigner::new(tenant_url, config.http.timeout_ms)?;
        Self::new(config, Arc::new(signer))
    }

    /// Begin the setup flow for an address
    ///
    /// Mints a fresh recovery request id, signs the setup message, and
    /// submits it together with the owner's contact details. The phone
    /// and email are passed through unvalidated; the recovery service
    /// owns those rules. The returned response carries the minted id so
    /// the caller can correlate the later recovery step.
    pub async fn initiate_setup(
        &self,
        address: &Address,
        phone: &str,
        email: &str,
    ) -> RecoveryResult<SetupResponse> {
        let recovery_id = Uuid::new_v4().to_string();
        let signature = self.signer.sign_setup(address).await?;

        let payload = SetupRequest {
            address: address.to_hex(),
            phone: phone.to_string(),
            email: email.to_string(),
            r_tenant: signature.r_hex(),
            s_tenant: signature.s_hex(),
            v_tenant: signature.v,
            nonce_tenant: signature.nonce.to_string(),
        };

        let url = format!("{}/setup/{}", self.recovery_url, recovery_id);
        tracing::debug!("Submitting setup request for {} to {}", address, url);

        let mut response: SetupResponse = self.post_json(&url, &payload).await?;
        response.recovery_id = recovery_id;

        tracing::info!("Setup request accepted for {}", address);
        Ok(response)
    }

    /// Confirm a pending setup with the out-of-band code
    ///
    /// The verification id comes from the setup response. The returned
    /// response carries it back for correlation; any transaction hash
    /// the service reports stays in the passthrough fields.
    pub async fn confirm_setup(
        &self,
        code: &str,
        verification_id: &str,
    ) -> RecoveryResult<ConfirmResponse> {
        let payload = ConfirmRequest {
            code: code.to_string(),
        };

        let url = format!("{}/confirm/{}", self.recovery_url, verification_id);
        tracing::debug!("Submitting confirmation to {}", url);

        let mut response: ConfirmResponse = self.post_json(&url, &payload).await?;
        response.verification_id = verification_id.to_string();

        tracing::info!("Setup confirmed for verification id {}", verification_id);
        Ok(response)
    }

    /// Execute the recovery, rotating the old address to the new one
    ///
    /// The recovery id is the correlation token minted during setup.
    pub async fn initiate_recovery(
        &self,
        old_address: &Address,
        new_address: &Address,
        recovery_id: &str,
    ) -> RecoveryResult<RecoveryResponse> {
        let signature = self.signer.sign_recovery(old_address, new_address).await?;

        let payload = RecoveryRequest {
            old_addr: old_address.to_hex(),
            new_addr: new_address.to_hex(),
            r_tenant: signature.r_hex(),
            s_tenant: signature.s_hex(),
            v_tenant: signature.v,
            nonce_tenant: signature.nonce.to_string(),
        };

        let url = format!("{}/recovery/{}", self.recovery_url, recovery_id);
        tracing::debug!("Submitting recovery request {} to {}", recovery_id, url);

        let mut response: RecoveryResponse = self.post_json(&url, &payload).await?;
        response.recovery_id = recovery_id.to_string();

        tracing::info!(
            "Recovery request accepted: {} -> {}",
            old_address,
            new_address
        );
        Ok(response)
    }

    /// POST a JSON payload and decode a JSON response
    ///
    /// Non-success statuses reject before the body is decoded, so error
    /// responses are never merged with correlation ids.
    async fn post_json<B, T>(&self, url: &str, body: &B) -> RecoveryResult<T>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RecoveryError::ServiceError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RecoveryError::ResponseParsingFailed(e.to_string()))
    }
}

impl std::fmt::Debug for RecoverySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoverySession")
            .field("recovery_url", &self.recovery_url)
            .finish()
    }
}
