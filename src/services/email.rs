use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    Config(String),
    #[error("Email sending failed: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
    #[error("Message building failed: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("Address parsing failed: {0}")]
    Address(#[from] lettre::address::AddressError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, EmailError> {
        Ok(Self {
            smtp_server: env::var("SMTP_SERVER")
                .map_err(|_| EmailError::Config("SMTP_SERVER not set".to_string()))?,
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| EmailError::Config("Invalid SMTP_PORT".to_string()))?,
            username: env::var("SMTP_USERNAME")
                .map_err(|_| EmailError::Config("SMTP_USERNAME not set".to_string()))?,
            password: env::var("SMTP_PASSWORD")
                .map_err(|_| EmailError::Config("SMTP_PASSWORD not set".to_string()))?,
            from_email: env::var("FROM_EMAIL")
                .map_err(|_| EmailError::Config("FROM_EMAIL not set".to_string()))?,
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "Furever".to_string()),
        })
    }
}

pub struct EmailService {
    mailer: SmtpTransport,
    config: EmailConfig,
}

impl EmailService {
    pub fn new() -> Result<Self, EmailError> {
        let config = EmailConfig::from_env()?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.smtp_server)
            .map_err(|e| EmailError::Config(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    pub fn send_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        template: EmailTemplate,
    ) -> Result<(), EmailError> {
        let to_address = match to_name {
            Some(name) => format!("{} <{}>", name, to_email),
            None => to_email.to_string(),
        };

        let from_address = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let message_builder = Message::builder()
            .from(from_address.parse()?)
            .to(to_address.parse()?)
            .subject(&template.subject);

        let message = if let Some(text_body) = &template.text_body {
            message_builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(template.html_body.clone()),
                    ),
            )?
        } else {
            message_builder
                .header(ContentType::TEXT_HTML)
                .body(template.html_body.clone())?
        };

        info!("Sending email to: {}", to_email);
        self.mailer.send(&message)?;
        info!("Email sent successfully to: {}", to_email);

        Ok(())
    }

    pub fn refund_requested_template(
        &self,
        provider_name: &str,
        pet_name: &str,
        amount: Decimal,
    ) -> EmailTemplate {
        let html_body = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body style="font-family: Arial, sans-serif; color: #333;">
                <h2>New refund request</h2>
                <p>Hi {}!</p>
                <p>A fur parent has requested a refund of PHP {} for the cremation booking for <strong>{}</strong>.</p>
                <p>Please review the request from your provider dashboard.</p>
            </body>
            </html>
            "#,
            provider_name, amount, pet_name
        );

        EmailTemplate {
            subject: "New refund request".to_string(),
            html_body,
            text_body: Some(format!(
                "Hi {}!\n\nA refund of PHP {} was requested for the booking for {}.\nPlease review it from your provider dashboard.",
                provider_name, amount, pet_name
            )),
        }
    }

    pub fn refund_decided_template(
        &self,
        user_name: &str,
        pet_name: &str,
        amount: Decimal,
        approved: bool,
        notes: Option<&str>,
    ) -> EmailTemplate {
        let (subject, line) = if approved {
            (
                "Your refund has been processed",
                format!("Your refund of PHP {} has been approved and processed.", amount),
            )
        } else {
            (
                "Your refund request was declined",
                format!("Your refund request of PHP {} was declined.", amount),
            )
        };

        let note_line = notes
            .map(|n| format!("<p>Note from the provider: {}</p>", n))
            .unwrap_or_default();

        let html_body = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body style="font-family: Arial, sans-serif; color: #333;">
                <h2>{}</h2>
                <p>Hi {}!</p>
                <p>{}</p>
                <p>Booking: cremation service for <strong>{}</strong>.</p>
                {}
            </body>
            </html>
            "#,
            subject, user_name, line, pet_name, note_line
        );

        EmailTemplate {
            subject: subject.to_string(),
            html_body,
            text_body: Some(format!("Hi {}!\n\n{}\nBooking: {}.", user_name, line, pet_name)),
        }
    }
}
