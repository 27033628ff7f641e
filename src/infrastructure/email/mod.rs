//! Email Delivery
//!
//! SMTP mailer behind a trait so services stay testable without a relay.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpSettings;
use crate::shared::error::AppError;

/// Outgoing mail contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a plain-text mail to a single recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// SMTP mailer using a pooled async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Build a mailer from SMTP settings.
    pub fn new(settings: &SmtpSettings) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| AppError::Internal(format!("SMTP relay setup failed: {}", e)))?;

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build mail: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send mail: {}", e)))?;

        tracing::debug!(to = %to, subject = %subject, "Mail sent");
        Ok(())
    }
}

/// Body of the account-confirmation mail.
pub fn confirmation_mail_body(frontend_url: &str, token_body: &str) -> String {
    format!(
        "Welcome!\n\nConfirm your email address within 5 minutes by opening:\n\n{}/confirm-email/{}\n",
        frontend_url.trim_end_matches('/'),
        token_body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_mail_body_contains_link() {
        let body = confirmation_mail_body("https://flock.example", "tok123");
        assert!(body.contains("https://flock.example/confirm-email/tok123"));
    }

    #[test]
    fn test_confirmation_mail_body_trims_trailing_slash() {
        let body = confirmation_mail_body("https://flock.example/", "tok123");
        assert!(body.contains("https://flock.example/confirm-email/tok123"));
        assert!(!body.contains("example//confirm"));
    }
}
