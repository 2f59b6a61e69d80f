//! Glue between the engine's gateway seam and the PayOS client.

use fulfillment_engine::{
    traits::{CheckoutLink, CheckoutProvider, CheckoutProviderError, CheckoutRequest},
    GatewayCallback,
};
use log::debug;
use payos_tools::{verify_webhook_signature, PayOsApi, PayOsApiError, PayOsConfig, WebhookEnvelope};
use thiserror::Error;

use crate::errors::ServerError;

/// [`PayOsApi`] dressed up as the engine's [`CheckoutProvider`].
#[derive(Clone)]
pub struct PayOsProvider {
    api: PayOsApi,
}

impl PayOsProvider {
    pub fn new(config: PayOsConfig) -> Result<Self, ServerError> {
        let api = PayOsApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }
}

impl CheckoutProvider for PayOsProvider {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutLink, CheckoutProviderError> {
        let data = self
            .api
            .create_payment_link(request.order_code, request.amount.value(), &request.description)
            .await
            .map_err(|e| match e {
                PayOsApiError::GatewayDeclined { code, desc } => {
                    CheckoutProviderError::Declined(format!("{code}: {desc}"))
                },
                other => CheckoutProviderError::Transport(other.to_string()),
            })?;
        Ok(CheckoutLink {
            payment_link_id: data.payment_link_id,
            checkout_url: data.checkout_url,
            qr_code: data.qr_code,
        })
    }
}

#[derive(Debug, Clone, Error)]
pub enum WebhookRejection {
    #[error("The webhook envelope carried no payment data")]
    EmptyEnvelope,
    #[error("The webhook payload was not signed")]
    MissingSignature,
    #[error("The webhook signature does not match the payload")]
    SignatureMismatch,
}

/// Unpacks a raw webhook envelope into a trusted [`GatewayCallback`], verifying the payload
/// signature against the configured checksum key. Everything downstream of this function may
/// assume the callback is authentic.
pub fn verified_callback(config: &PayOsConfig, envelope: WebhookEnvelope) -> Result<GatewayCallback, WebhookRejection> {
    let body = envelope.body.ok_or(WebhookRejection::EmptyEnvelope)?;
    let data = body.data.ok_or(WebhookRejection::EmptyEnvelope)?;
    let signature = body.signature.ok_or(WebhookRejection::MissingSignature)?;
    if !verify_webhook_signature(config.checksum_key.reveal(), &data, &signature) {
        return Err(WebhookRejection::SignatureMismatch);
    }
    debug!("🛍️️ Verified gateway webhook for payment link {}", data.payment_link_id);
    Ok(GatewayCallback {
        payment_link_id: data.payment_link_id,
        code: data.code,
        amount: data.amount,
        desc: data.desc,
    })
}
