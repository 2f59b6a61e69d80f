use fulfillment_common::Vnd;
use thiserror::Error;

/// A request to open a hosted checkout. `order_code` is the gateway-compacted code, not the
/// platform order code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_code: i64,
    pub amount: Vnd,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLink {
    pub payment_link_id: String,
    pub checkout_url: String,
    pub qr_code: String,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutProviderError {
    /// The gateway answered, but refused to open a checkout.
    #[error("Gateway declined the checkout request. {0}")]
    Declined(String),
    /// The gateway could not be reached, or timed out.
    #[error("Gateway unreachable. {0}")]
    Transport(String),
}

/// The seam to the hosted-checkout gateway.
#[allow(async_fn_in_trait)]
pub trait CheckoutProvider: Clone + Send + Sync {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutLink, CheckoutProviderError>;
}
