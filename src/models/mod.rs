pub mod auth;
pub mod booking;
pub mod notification;
pub mod package;
pub mod provider;
pub mod receipt;
pub mod refund;
pub mod user;
