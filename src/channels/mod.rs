//! Outbound delivery channels: WhatsApp messaging and SMTP email.

pub mod email;
pub mod whatsapp;

use async_trait::async_trait;

use crate::error::ChannelError;

pub use email::SmtpMailer;
pub use whatsapp::TwilioClient;

/// Provider acknowledgement for a sent WhatsApp message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Provider message id (Twilio `sid`).
    pub sid: String,
}

/// Sends WhatsApp messages to a single recipient.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `body` to `to`. `to` may omit the `whatsapp:` prefix.
    async fn send_message(&self, to: &str, body: &str) -> Result<SentMessage, ChannelError>;
}

/// A notification email. Sender and recipient come from the mailer's config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivers notification emails to the support team.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ChannelError>;
}
