//! Outbound transactional email (verification codes, password resets).
//!
//! SMTP via lettre. Credentials come from the environment; a missing
//! configuration is an explicit error so callers can fail the request
//! instead of silently dropping mail.

use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    /// Missing or unusable environment configuration.
    #[error("Server configuration error: {0}")]
    Config(String),

    /// SMTP transport error (relay rejected the connection or the message).
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid sender or recipient address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Build the transport from `EMAIL_USER` / `EMAIL_PASS` (plus optional
    /// `SMTP_HOST`, `SMTP_PORT`, `EMAIL_FROM`).
    pub fn from_env() -> Result<Self, EmailError> {
        let user = std::env::var("EMAIL_USER")
            .map_err(|_| EmailError::Config("Missing email credentials (EMAIL_USER)".into()))?;
        let pass = std::env::var("EMAIL_PASS")
            .map_err(|_| EmailError::Config("Missing email credentials (EMAIL_PASS)".into()))?;

        // App passwords copied from Google come with spaces
        let clean_pass: String = pass.chars().filter(|c| !c.is_whitespace()).collect();

        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let from_address =
            std::env::var("EMAIL_FROM").unwrap_or_else(|_| format!("AgriMarket <{}>", user));

        let credentials = Credentials::new(user, clean_pass);

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer, from_address })
    }

    /// Send the 6-digit verification code.
    pub async fn send_otp_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let text = format!(
            "Your AgriMarket verification code is: {}\n\n\
             This code will expire in 10 minutes.\n\
             If you didn't request this code, please ignore this email.\n",
            code
        );
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
    <div style="text-align: center; margin-bottom: 20px;">
        <h1 style="color: #16a34a; margin: 0;">AgriMarket</h1>
    </div>
    <div style="background-color: #f9fafb; padding: 20px; border-radius: 8px; text-align: center;">
        <p style="color: #4b5563; font-size: 16px; margin-bottom: 10px;">Your verification code is:</p>
        <h2 style="color: #111827; font-size: 32px; letter-spacing: 5px; margin: 10px 0;">{}</h2>
        <p style="color: #6b7280; font-size: 14px; margin-top: 10px;">This code will expire in 10 minutes.</p>
    </div>
    <div style="text-align: center; margin-top: 20px; color: #9ca3af; font-size: 12px;">
        <p>If you didn't request this code, please ignore this email.</p>
    </div>
</div>"#,
            code
        );

        self.send_multipart_email(to, "Your Verification Code - AgriMarket", &text, &html)
            .await
    }

    /// Send the password reset link.
    pub async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let text = format!(
            "We received a request to reset your AgriMarket password.\n\n\
             Open this link to choose a new one (valid for 1 hour):\n{}\n\n\
             If you didn't request a reset, you can safely ignore this email.\n",
            reset_url
        );
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
    <div style="text-align: center; margin-bottom: 20px;">
        <h1 style="color: #16a34a; margin: 0;">AgriMarket</h1>
    </div>
    <div style="background-color: #f9fafb; padding: 20px; border-radius: 8px; text-align: center;">
        <p style="color: #4b5563; font-size: 16px;">We received a request to reset your password.</p>
        <a href="{}" style="display: inline-block; background-color: #16a34a; color: #ffffff; padding: 12px 24px; border-radius: 6px; text-decoration: none; font-size: 16px; margin: 10px 0;">Reset Password</a>
        <p style="color: #6b7280; font-size: 14px; margin-top: 10px;">This link will expire in 1 hour.</p>
    </div>
    <div style="text-align: center; margin-top: 20px; color: #9ca3af; font-size: 12px;">
        <p>If you didn't request a reset, you can safely ignore this email.</p>
    </div>
</div>"#,
            reset_url
        );

        self.send_multipart_email(to, "Reset Your Password - AgriMarket", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        log::info!("📧 Email sent to {} ({})", to, subject);
        Ok(())
    }
}
