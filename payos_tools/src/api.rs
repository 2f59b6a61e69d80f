use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PayOsConfig,
    data_objects::{CheckoutLinkData, CreateLinkRequest, CreateLinkResponse},
    signing::sign_checkout_request,
    PayOsApiError,
};

/// Outbound calls to the gateway must not stall a consumer indefinitely, so every request
/// carries this client-level timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct PayOsApi {
    config: PayOsConfig,
    client: Arc<Client>,
}

impl PayOsApi {
    pub fn new(config: PayOsConfig) -> Result<Self, PayOsApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let client_id = HeaderValue::from_str(&config.client_id)
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        let api_key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        headers.insert("x-client-id", client_id);
        headers.insert("x-api-key", api_key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PayOsConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PayOsApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PayOsApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PayOsApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PayOsApiError::RestResponseError(e.to_string()))?;
            Err(PayOsApiError::QueryError { status, message })
        }
    }

    /// Creates a hosted checkout link for the given (gateway-compacted) order code. The request
    /// is signed with the configured checksum key before being sent.
    pub async fn create_payment_link(
        &self,
        order_code: i64,
        amount: i64,
        description: &str,
    ) -> Result<CheckoutLinkData, PayOsApiError> {
        let mut request = CreateLinkRequest {
            order_code,
            amount,
            description: description.to_string(),
            return_url: self.config.return_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            signature: String::new(),
        };
        sign_checkout_request(self.config.checksum_key.reveal(), &mut request);
        debug!("Requesting payment link for gateway order code {order_code}");
        let response: CreateLinkResponse =
            self.rest_query(Method::POST, "/v2/payment-requests", Some(request)).await?;
        if !response.is_success() {
            info!("Gateway declined payment link for order code {order_code}: {} {}", response.code, response.desc);
            return Err(PayOsApiError::GatewayDeclined { code: response.code, desc: response.desc });
        }
        let data = response
            .data
            .ok_or_else(|| PayOsApiError::JsonError("success response carried no link data".to_string()))?;
        info!("Payment link {} created for gateway order code {order_code}", data.payment_link_id);
        Ok(data)
    }
}
