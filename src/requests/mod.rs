pub mod booking;
pub mod package;
pub mod provider;
pub mod receipt;
pub mod refund;
