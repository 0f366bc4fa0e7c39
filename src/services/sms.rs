use serde::Serialize;
use std::env;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SmsError {
    #[error("SMS configuration error: {0}")]
    Config(String),
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("SMS gateway rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
struct SmsPayload<'a> {
    api_key: &'a str,
    number: &'a str,
    message: &'a str,
    sender_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_id: String,
}

impl SmsConfig {
    pub fn from_env() -> Result<Self, SmsError> {
        Ok(Self {
            api_url: env::var("SMS_API_URL")
                .map_err(|_| SmsError::Config("SMS_API_URL not set".to_string()))?,
            api_key: env::var("SMS_API_KEY")
                .map_err(|_| SmsError::Config("SMS_API_KEY not set".to_string()))?,
            sender_id: env::var("SMS_SENDER_ID").unwrap_or_else(|_| "Furever".to_string()),
        })
    }
}

pub struct SmsService {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsService {
    pub fn new() -> Result<Self, SmsError> {
        Ok(Self {
            client: reqwest::Client::new(),
            config: SmsConfig::from_env()?,
        })
    }

    pub async fn send_sms(&self, number: &str, message: &str) -> Result<(), SmsError> {
        let payload = SmsPayload {
            api_key: &self.config.api_key,
            number,
            message,
            sender_id: &self.config.sender_id,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Rejected(body));
        }

        info!("SMS sent to: {}", number);
        Ok(())
    }
}
