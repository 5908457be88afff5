//! Error types for the feedback service.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A rejected inbound payload. `message` is safe to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outbound delivery errors (WhatsApp messaging and SMTP).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Authentication failed for channel {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("Channel {name} rejected the request ({status}): {reason}")]
    Rejected {
        name: String,
        status: u16,
        reason: String,
    },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl ChannelError {
    /// Name of the channel that produced the error, if known.
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::SendFailed { name, .. }
            | Self::AuthFailed { name, .. }
            | Self::Rejected { name, .. } => Some(name),
            Self::InvalidMessage(_) => None,
        }
    }
}
