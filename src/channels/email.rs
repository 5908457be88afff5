//! Email channel: support-team notifications over SMTP via lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use super::{Mailer, OutgoingEmail};
use crate::config::SmtpConfig;
use crate::error::ChannelError;

const CHANNEL: &str = "email";

/// Port that speaks TLS from the first byte; every other port uses STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP mailer. The transport is blocking, so sends run on the blocking pool.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message for `email` (plain text + HTML alternative).
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, ChannelError> {
        let from: Mailbox = self.config.from_address.parse().map_err(|e| {
            ChannelError::InvalidMessage(format!("Invalid from address: {e}"))
        })?;
        let to: Mailbox = self
            .config
            .to_address
            .parse()
            .map_err(|e| ChannelError::InvalidMessage(format!("Invalid to address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| ChannelError::InvalidMessage(format!("Failed to build email: {e}")))
    }

    fn transport(&self) -> Result<SmtpTransport, ChannelError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let builder = if self.config.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&self.config.host)
        } else {
            SmtpTransport::starttls_relay(&self.config.host)
        }
        .map_err(|e| ChannelError::SendFailed {
            name: CHANNEL.into(),
            reason: format!("SMTP relay error: {e}"),
        })?;

        Ok(builder.port(self.config.port).credentials(creds).build())
    }
}

/// Map a lettre SMTP error, singling out rejected credentials.
fn classify_smtp_error(e: lettre::transport::smtp::Error) -> ChannelError {
    let code = e.status().map(|c| c.to_string());
    if matches!(code.as_deref(), Some("530" | "534" | "535")) {
        ChannelError::AuthFailed {
            name: CHANNEL.into(),
            reason: e.to_string(),
        }
    } else {
        ChannelError::SendFailed {
            name: CHANNEL.into(),
            reason: format!("SMTP send failed: {e}"),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ChannelError> {
        let message = self.build_message(email)?;
        let transport = self.transport()?;

        let response = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL.into(),
                reason: format!("SMTP task failed: {e}"),
            })?
            .map_err(classify_smtp_error)?;

        tracing::info!(
            to = %self.config.to_address,
            code = %response.code(),
            subject = %email.subject,
            "Notification email sent"
        );
        Ok(())
    }
}
