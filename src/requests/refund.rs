use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub booking_id: Uuid,
    pub reason: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct RefundDecisionRequest {
    pub action: String,
    pub notes: Option<String>,
}
