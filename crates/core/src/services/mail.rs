//! Outgoing mail service.
//!
//! Built on lettre's async SMTP transport. When no mail configuration is
//! present the service is disabled and sends become no-ops, so local
//! development does not need an SMTP relay.

use atelier_common::{AppError, AppResult, config::MailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};

/// Mail service.
#[derive(Clone)]
pub struct MailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    server_url: String,
}

impl MailService {
    /// Create a new mail service. `config` may be `None` to disable mail.
    pub fn new(config: Option<&MailConfig>, server_url: &str) -> AppResult<Self> {
        let transport = match config {
            Some(mail) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.host)
                        .map_err(|e| AppError::Mail(e.to_string()))?
                        .port(mail.port);

                if let (Some(username), Some(password)) = (&mail.username, &mail.password) {
                    builder = builder
                        .credentials(Credentials::new(username.clone(), password.clone()));
                }

                Some(builder.build())
            }
            None => None,
        };

        Ok(Self {
            transport,
            from_address: config.map(|m| m.from_address.clone()),
            server_url: server_url.to_string(),
        })
    }

    /// Whether mail sending is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a password-reset mail carrying the reset link.
    pub async fn send_password_reset(&self, to: &str, token: &str) -> AppResult<()> {
        let link = format!("{}/reset-password?token={}", self.server_url, token);
        let body = format!(
            "A password reset was requested for your account.\n\n\
             Follow this link to choose a new password:\n{link}\n\n\
             The link expires in one hour. If you did not request a reset,\n\
             ignore this mail."
        );

        self.send(to, "Reset your password", body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> AppResult<()> {
        let Some(ref transport) = self.transport else {
            tracing::debug!(to = %to, subject = %subject, "Mail disabled, skipping send");
            return Ok(());
        };

        let from = self
            .from_address
            .as_deref()
            .ok_or_else(|| AppError::Mail("Missing from address".to_string()))?;

        let message = Message::builder()
            .from(from.parse().map_err(|e| AppError::Mail(format!("{e}")))?)
            .to(to.parse().map_err(|e| AppError::Mail(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Mail(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        tracing::info!(to = %to, subject = %subject, "Sent mail");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_config() {
        let service = MailService::new(None, "https://example.com").unwrap();
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let service = MailService::new(None, "https://example.com").unwrap();
        let result = service.send_password_reset("user@example.com", "tok").await;
        assert!(result.is_ok());
    }
}
