//! PayOS gateway client
//!
//! PayOS drives the hosted bank-checkout flow: the server creates a payment link with a signed
//! request, the shopper pays through the hosted page, and PayOS reports the outcome through a
//! webhook. This crate contains the typed request/response objects, the request signing and
//! webhook verification helpers, and a thin async REST client.
//!
//! The result code `"00"` denotes success in both the create-link response and the webhook
//! payload. Any other code is a failure, with `desc` carrying the human-readable reason.

mod api;
mod config;
pub mod data_objects;
mod error;
mod signing;

pub use api::PayOsApi;
pub use config::PayOsConfig;
pub use data_objects::{
    CheckoutLinkData,
    CreateLinkRequest,
    CreateLinkResponse,
    WebhookBody,
    WebhookData,
    WebhookEnvelope,
    PAYOS_SUCCESS_CODE,
};
pub use error::PayOsApiError;
pub use signing::{checkout_signature, sign_checkout_request, verify_webhook_signature, webhook_signature};
