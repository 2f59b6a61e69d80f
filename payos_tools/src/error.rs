use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayOsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Gateway declined the request. Code {code}. {desc}")]
    GatewayDeclined { code: String, desc: String },
}
