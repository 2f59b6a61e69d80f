use thiserror::Error;

use crate::traits::{PaymentStoreError, TtlStoreError};

#[derive(Debug, Error)]
pub enum PaymentFlowError {
    #[error("Payment storage error: {0}")]
    DatabaseError(#[from] PaymentStoreError),
    #[error("Expiry timer error: {0}")]
    TimerError(#[from] TtlStoreError),
    #[error("The gateway refused to open a checkout: {0}")]
    CheckoutFailed(String),
}
