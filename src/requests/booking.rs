use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub provider_id: Uuid,
    pub package_id: Uuid,
    pub pet_name: String,
    pub pet_type: String,
    pub cause_of_death: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub payment_method: String,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub reference_number: Option<String>,
    pub receipt_path: Option<String>,
}
