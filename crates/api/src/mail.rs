//! Alert email relay via SMTP.
//!
//! [`AlertMailer`] wraps the `lettre` async SMTP transport and sends the
//! plain-text alert bodies the dashboard posts to `/auth/send-alert`.
//! If `SMTP_HOST` is not set, [`MailConfig::from_env`] returns `None` and the
//! endpoint answers 503.

use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Error type for alert email failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Silo Dashboard <noreply@silo.local>";

/// Subject line of every alert email.
pub const ALERT_SUBJECT: &str = "Critical alert in the silo";

/// SMTP settings plus the alert recipient.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" mailbox.
    pub from_address: String,
    /// Where alerts go. Falls back to the sender when unset.
    pub recipient: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable          | Required | Default                                 |
    /// |-------------------|----------|-----------------------------------------|
    /// | `SMTP_HOST`       | yes      | --                                      |
    /// | `SMTP_PORT`       | no       | `587`                                   |
    /// | `SMTP_FROM`       | no       | `Silo Dashboard <noreply@silo.local>`   |
    /// | `ALERT_RECIPIENT` | no       | value of `SMTP_FROM`                    |
    /// | `SMTP_USER`       | no       | --                                      |
    /// | `SMTP_PASSWORD`   | no       | --                                      |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let from_address =
            std::env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string());
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            recipient: std::env::var("ALERT_RECIPIENT").unwrap_or_else(|_| from_address.clone()),
            from_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends alert emails to the configured recipient.
pub struct AlertMailer {
    config: MailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl AlertMailer {
    /// Build the SMTP transport. No connection is made until the first send.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    pub fn recipient(&self) -> &str {
        &self.config.recipient
    }

    /// Assemble the multipart (plain text + HTML) alert message.
    pub fn build_message(&self, text: &str) -> Result<Message, MailError> {
        let html = format!("<p>{}</p>", escape_html(text).replace('\n', "<br>"));

        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.config.recipient.parse()?)
            .subject(ALERT_SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))
    }

    /// Send one alert email.
    pub async fn send_alert(&self, text: &str) -> Result<(), MailError> {
        let email = self.build_message(text)?;
        self.transport.send(email).await?;
        tracing::info!(to = %self.config.recipient, "Alert email sent");
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.into(),
            recipient: "ops@example.com".into(),
            smtp_user: None,
            smtp_password: None,
        }
    }

    #[test]
    fn message_carries_subject_recipient_and_both_bodies() {
        let mailer = AlertMailer::new(config()).expect("transport should build");
        let message = mailer
            .build_message("Critical alert\nHumidity out of range: 80.00%")
            .expect("message should build");

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Critical alert in the silo"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert_eq!(mailer.recipient(), "ops@example.com");
    }

    #[test]
    fn bad_recipient_is_an_address_error() {
        let mut cfg = config();
        cfg.recipient = "not-an-email".into();
        let mailer = AlertMailer::new(cfg).unwrap();
        let err = mailer.build_message("x").unwrap_err();
        assert_matches!(err, MailError::Address(_));
    }

    #[test]
    fn html_escaping_neutralises_markup() {
        assert_eq!(escape_html("<b>a & b</b>"), "&lt;b&gt;a &amp; b&lt;/b&gt;");
    }

    #[test]
    fn mail_error_display_build() {
        let err = MailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
