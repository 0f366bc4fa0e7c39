pub mod auth;
pub mod bookings;
pub mod notifications;
pub mod packages;
pub mod providers;
pub mod receipts;
pub mod refunds;
pub mod users;
