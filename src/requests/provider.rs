use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProviderApplicationRequest {
    pub business_name: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationDecisionRequest {
    pub status: String,
}
