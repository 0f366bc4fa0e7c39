use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReceiptDecisionRequest {
    pub confirm: bool,
    pub notes: Option<String>,
}
