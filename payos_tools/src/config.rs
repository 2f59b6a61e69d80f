use fulfillment_common::Secret;
use log::*;

#[derive(Debug, Clone)]
pub struct PayOsConfig {
    /// Base URL for the PayOS REST API.
    pub base_url: String,
    pub client_id: String,
    pub api_key: Secret<String>,
    /// Key used to sign outbound checkout requests and verify webhook payloads.
    pub checksum_key: Secret<String>,
    /// Where PayOS sends the shopper after a completed checkout.
    pub return_url: String,
    /// Where PayOS sends the shopper after an abandoned checkout.
    pub cancel_url: String,
}

impl Default for PayOsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-merchant.payos.vn".to_string(),
            client_id: String::default(),
            api_key: Secret::default(),
            checksum_key: Secret::default(),
            return_url: String::default(),
            cancel_url: String::default(),
        }
    }
}

impl PayOsConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("OFS_PAYOS_BASE_URL").unwrap_or_else(|_| {
            info!("OFS_PAYOS_BASE_URL not set, using the production PayOS endpoint");
            "https://api-merchant.payos.vn".to_string()
        });
        let client_id = std::env::var("OFS_PAYOS_CLIENT_ID").unwrap_or_else(|_| {
            warn!("OFS_PAYOS_CLIENT_ID not set, using a (probably useless) default");
            String::default()
        });
        let api_key = Secret::new(std::env::var("OFS_PAYOS_API_KEY").unwrap_or_else(|_| {
            warn!("OFS_PAYOS_API_KEY not set, using a (probably useless) default");
            String::default()
        }));
        let checksum_key = Secret::new(std::env::var("OFS_PAYOS_CHECKSUM_KEY").unwrap_or_else(|_| {
            warn!("OFS_PAYOS_CHECKSUM_KEY not set, webhook signatures cannot be verified");
            String::default()
        }));
        let return_url = std::env::var("OFS_PAYOS_RETURN_URL").unwrap_or_else(|_| {
            warn!("OFS_PAYOS_RETURN_URL not set, using a (probably useless) default");
            "http://localhost/checkout/result".to_string()
        });
        let cancel_url = std::env::var("OFS_PAYOS_CANCEL_URL").unwrap_or_else(|_| {
            warn!("OFS_PAYOS_CANCEL_URL not set, using a (probably useless) default");
            "http://localhost/checkout/cancel".to_string()
        });
        Self { base_url, client_id, api_key, checksum_key, return_url, cancel_url }
    }
}
