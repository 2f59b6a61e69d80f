use actix_web::HttpRequest;
use log::trace;

use crate::errors::ServerError;

/// The principal behind a request/reply call. The edge gateway terminates authentication and
/// forwards the verified identity in the `X-User-Id` header; a request that arrives without it
/// did not pass through the gateway and is rejected.
pub fn get_user_id(req: &HttpRequest) -> Result<String, ServerError> {
    trace!("Extracting principal from request to {}", req.uri());
    req.headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| ServerError::MissingPrincipal("The X-User-Id header is missing or empty".to_string()))
}
