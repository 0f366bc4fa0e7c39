use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PackageRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cremation_type: String,
    pub processing_time: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cremation_type: Option<String>,
    pub processing_time: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}
