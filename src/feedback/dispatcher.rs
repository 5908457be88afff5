//! Notification dispatcher: reply to the sender and notify the support team.
//!
//! The two sends run concurrently and independently: a failure on one side
//! never cancels or blocks the other, and `dispatch` itself never fails. The
//! outcome flags are the only signal of partial failure.
//!
//! The WhatsApp reply is retried with linear backoff (`n * unit` before retry
//! `n`); with `max_attempts = 3` a persistently failing send is tried four
//! times. The email is sent once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use super::composer::{compose_reply, email_html, email_subject, email_text};
use super::model::{DispatchOutcome, IncomingMessage};
use crate::channels::{Mailer, MessageSender, OutgoingEmail, SentMessage};
use crate::config::RetryConfig;
use crate::error::ChannelError;

/// Sleep abstraction so retry delays can be observed without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fans a classified message out to the messaging and mail channels.
pub struct NotificationDispatcher {
    messenger: Arc<dyn MessageSender>,
    mailer: Arc<dyn Mailer>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryConfig,
}

impl NotificationDispatcher {
    pub fn new(
        messenger: Arc<dyn MessageSender>,
        mailer: Arc<dyn Mailer>,
        sleeper: Arc<dyn Sleeper>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            messenger,
            mailer,
            sleeper,
            retry,
        }
    }

    /// Send the composed reply and the notification email; report which landed.
    pub async fn dispatch(&self, message: &IncomingMessage) -> DispatchOutcome {
        let reply = compose_reply(message.rating);
        let email = OutgoingEmail {
            subject: email_subject(message.rating).to_string(),
            text: email_text(&message.from, &message.body, message.rating),
            html: email_html(&message.from, &message.body, message.rating, Utc::now()),
        };

        let (email_result, message_result) = tokio::join!(
            self.mailer.send(&email),
            self.send_with_retry(&message.from, &reply),
        );

        if let Err(ref e) = email_result {
            error!(from = %message.from, rating = ?message.rating, error = %e, "Feedback email failed");
        }
        if let Err(ref e) = message_result {
            error!(to = %message.from, error = %e, "WhatsApp reply failed");
        }

        let outcome = DispatchOutcome {
            email_sent: email_result.is_ok(),
            message_sent: message_result.is_ok(),
            message: reply,
        };
        info!(
            from = %message.from,
            rating = ?message.rating,
            category = ?message.category,
            email_sent = outcome.email_sent,
            message_sent = outcome.message_sent,
            "Feedback dispatched"
        );
        outcome
    }

    /// Send through the messaging channel, retrying up to `max_attempts` times.
    pub async fn send_with_retry(&self, to: &str, body: &str) -> Result<SentMessage, ChannelError> {
        let mut retries: u32 = 0;
        loop {
            match self.messenger.send_message(to, body).await {
                Ok(sent) => {
                    if retries > 0 {
                        info!(to = %to, retries, "WhatsApp send succeeded after retry");
                    }
                    return Ok(sent);
                }
                Err(e) if retries < self.retry.max_attempts => {
                    retries += 1;
                    let delay = self.retry.backoff_unit * retries;
                    warn!(
                        to = %to,
                        error = %e,
                        retry = retries,
                        max_retries = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "WhatsApp send failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
