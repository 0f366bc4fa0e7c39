pub mod auth;
pub mod email;
pub mod gateway;
pub mod notifier;
pub mod realtime;
pub mod refunds;
pub mod sms;
