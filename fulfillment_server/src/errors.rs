use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fulfillment_engine::{
    traits::{InventoryError, SellerStoreError},
    PaymentFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("No authenticated principal on the request. {0}")]
    MissingPrincipal(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Payment flow error. {0}")]
    PaymentError(#[from] PaymentFlowError),
    #[error("Seller order error. {0}")]
    SellerError(#[from] SellerStoreError),
    #[error("Inventory error. {0}")]
    InventoryError(#[from] InventoryError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPrincipal(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentError(e) => match e {
                PaymentFlowError::CheckoutFailed(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SellerError(e) => match e {
                SellerStoreError::SnapshotNotFound(_) => StatusCode::NOT_FOUND,
                SellerStoreError::InvalidStatus { .. } => StatusCode::CONFLICT,
                SellerStoreError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InventoryError(e) => match e {
                InventoryError::InsufficientStock { .. } => StatusCode::CONFLICT,
                InventoryError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                InventoryError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
