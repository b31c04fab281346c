use crate::config::EmailConfig;
use crate::error::app_error::AppError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the password-reset link. When the service is disabled (tests,
    /// local development) the send is skipped and logged.
    pub async fn send_password_reset_email(&self, to_email: &str, to_name: &str, reset_token: &str, reset_url: &str) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::warn!("Email service is disabled, skipping password reset email to {}", to_email);
            return Ok(());
        }

        let reset_link = format!("{}?token={}", reset_url, reset_token);
        let body = format!(
            "Hi {to_name},\n\n\
             A password reset was requested for your account. Open the link below\n\
             to continue; you will be asked to answer your security questions.\n\n\
             {reset_link}\n\n\
             If you did not request this, you can ignore this email.\n"
        );

        let message = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| AppError::BadRequest(format!("Invalid from address: {e}")))?,
            )
            .to(to_email.parse().map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?)
            .subject("Reset your password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::BadRequest(format!("Failed to build email: {e}")))?;

        let credentials = Credentials::new(self.config.smtp_username.clone(), self.config.smtp_password.clone());
        let mailer = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| AppError::BadRequest(format!("Failed to create SMTP transport: {e}")))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        mailer.send(&message).map_err(|e| AppError::BadRequest(format!("Failed to send email: {e}")))?;

        tracing::info!("Password reset email sent to {}", to_email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_service_skips_sending() {
        let service = EmailService::new(EmailConfig {
            enabled: false,
            ..EmailConfig::default()
        });

        let result = service
            .send_password_reset_email("jane@example.com", "Jane", "token123", "http://localhost/reset")
            .await;
        assert!(result.is_ok());
    }
}
