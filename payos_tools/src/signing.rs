//! Request signing and webhook verification.
//!
//! PayOS signs with HMAC-SHA256 over a canonical `key=value&...` string with keys in
//! alphabetical order, hex-encoded. The create-link request signs exactly five fields:
//! `amount`, `cancelUrl`, `description`, `orderCode`, `returnUrl`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::data_objects::{CreateLinkRequest, WebhookData};

type HmacSha256 = Hmac<Sha256>;

fn hmac_hex(key: &str, data: &str) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The canonical string for a create-link request. Kept separate from the digest so it can be
/// asserted byte-for-byte in tests.
pub fn checkout_canonical_string(
    amount: i64,
    cancel_url: &str,
    description: &str,
    order_code: i64,
    return_url: &str,
) -> String {
    format!(
        "amount={amount}&cancelUrl={cancel_url}&description={description}&orderCode={order_code}&returnUrl={return_url}"
    )
}

pub fn checkout_signature(
    checksum_key: &str,
    amount: i64,
    cancel_url: &str,
    description: &str,
    order_code: i64,
    return_url: &str,
) -> String {
    let canonical = checkout_canonical_string(amount, cancel_url, description, order_code, return_url);
    hmac_hex(checksum_key, &canonical)
}

/// Fills in the `signature` field of a create-link request.
pub fn sign_checkout_request(checksum_key: &str, request: &mut CreateLinkRequest) {
    request.signature = checkout_signature(
        checksum_key,
        request.amount,
        &request.cancel_url,
        &request.description,
        request.order_code,
        &request.return_url,
    );
}

/// The signature PayOS attaches to a webhook payload. The signed string is the sorted
/// `key=value` form of the data fields.
pub fn webhook_signature(checksum_key: &str, data: &WebhookData) -> String {
    let canonical = format!(
        "amount={}&code={}&desc={}&paymentLinkId={}",
        data.amount, data.code, data.desc, data.payment_link_id
    );
    hmac_hex(checksum_key, &canonical)
}

/// Verifies the signature of an inbound webhook payload.
pub fn verify_webhook_signature(checksum_key: &str, data: &WebhookData, signature: &str) -> bool {
    webhook_signature(checksum_key, data) == signature
}
