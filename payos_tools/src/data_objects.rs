use serde::{Deserialize, Serialize};

/// The result code PayOS uses for a successful operation, in both create-link responses and
/// webhook payloads.
pub const PAYOS_SUCCESS_CODE: &str = "00";

//--------------------------------------  Create payment link  -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    /// The numeric order code registered with the gateway. PayOS caps this well below i64::MAX,
    /// which is why callers pass a compacted code rather than the raw platform order code.
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub return_url: String,
    pub cancel_url: String,
    /// HMAC-SHA256 hex digest over the canonical query string of the fields above.
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkResponse {
    pub code: String,
    pub desc: String,
    pub data: Option<CheckoutLinkData>,
}

impl CreateLinkResponse {
    pub fn is_success(&self) -> bool {
        self.code == PAYOS_SUCCESS_CODE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLinkData {
    pub payment_link_id: String,
    pub checkout_url: String,
    pub qr_code: String,
}

//--------------------------------------      Webhook       ----------------------------------------------------------
/// The webhook envelope as it arrives on the wire: `{ body: { data: {...}, signature } }`.
/// Every field is optional so that malformed deliveries deserialize rather than bounce; the
/// handler decides what to do with the holes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub body: Option<WebhookBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookBody {
    pub data: Option<WebhookData>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    pub payment_link_id: String,
    pub code: String,
    pub amount: i64,
    #[serde(default)]
    pub desc: String,
}
