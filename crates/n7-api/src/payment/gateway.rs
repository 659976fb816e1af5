//! Client for the Guiddini e-payment gateway.

use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// Transaction opened on the gateway; the customer pays through `form_url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTransaction {
    /// Order number later used to confirm the payment
    pub order_number: String,
    pub form_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    data: InitiateData,
}

#[derive(Debug, Deserialize)]
struct InitiateData {
    id: serde_json::Value,
    attributes: Option<InitiateAttributes>,
}

#[derive(Debug, Deserialize)]
struct InitiateAttributes {
    form_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
}

impl PaymentGateway {
    pub fn new(client: reqwest::Client, base_url: &str, app_key: &str, app_secret: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
        }
    }

    /// Open a transaction for `amount` (DZD)
    ///
    /// Any transport, status or decoding failure becomes a 502 for the caller;
    /// the details are only logged.
    pub async fn initiate(&self, amount: f64) -> Result<GatewayTransaction, ApiError> {
        let url = format!("{}/payment/initiate", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header("x-app-key", &self.app_key)
            .header("x-app-secret", &self.app_secret)
            .json(&json!({ "amount": amount.to_string() }))
            .send()
            .await
            .map_err(|e| gateway_failure(&format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(gateway_failure(&format!("status {status}: {body}")));
        }

        let body: InitiateResponse = response
            .json()
            .await
            .map_err(|e| gateway_failure(&format!("invalid response: {e}")))?;

        let order_number = match body.data.id {
            serde_json::Value::String(id) if !id.is_empty() => id,
            serde_json::Value::Number(id) => id.to_string(),
            other => return Err(gateway_failure(&format!("unexpected transaction id {other}"))),
        };

        Ok(GatewayTransaction {
            order_number,
            form_url: body.data.attributes.and_then(|a| a.form_url),
        })
    }
}

fn gateway_failure(detail: &str) -> ApiError {
    tracing::error!("Payment gateway error: {detail}");
    ApiError::Gateway("Payment initiation failed. Please try again.".to_string())
}
