use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway configuration error: {0}")]
    Config(String),
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gateway declined the refund: {0}")]
    Declined(String),
}

/// Status reported by the payment gateway for a refund it accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayRefundStatus {
    Accepted,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    pub reference: String,
    pub status: GatewayRefundStatus,
}

#[derive(Debug, Serialize)]
struct RefundPayload<'a> {
    refund_id: Uuid,
    amount: Decimal,
    currency: &'a str,
    reason: &'a str,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub api_key: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            api_url: env::var("GATEWAY_API_URL")
                .map_err(|_| GatewayError::Config("GATEWAY_API_URL not set".to_string()))?,
            api_key: env::var("GATEWAY_API_KEY")
                .map_err(|_| GatewayError::Config("GATEWAY_API_KEY not set".to_string()))?,
        })
    }
}

pub struct GatewayService {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayService {
    pub fn new() -> Result<Self, GatewayError> {
        Ok(Self {
            client: reqwest::Client::new(),
            config: GatewayConfig::from_env()?,
        })
    }

    /// Asks the gateway to refund a gcash payment. The refund id doubles
    /// as the idempotency key, so re-invoking for the same refund is safe.
    pub async fn initiate_refund(
        &self,
        refund_id: Uuid,
        amount: Decimal,
        reason: &str,
    ) -> Result<GatewayRefund, GatewayError> {
        let payload = RefundPayload {
            refund_id,
            amount,
            currency: "PHP",
            reason,
        };

        let response = self
            .client
            .post(format!("{}/refunds", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .header("Idempotency-Key", refund_id.to_string())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Declined(body));
        }

        let refund: GatewayRefund = response.json().await?;
        info!(
            "Gateway accepted refund {} with reference {}",
            refund_id, refund.reference
        );

        Ok(refund)
    }
}
