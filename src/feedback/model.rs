//! Feedback data model: classified inbound messages, tiers, and dispatch outcomes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// NPS tier derived from a 1-10 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 9-10.
    Promoter,
    /// 7-8.
    Passive,
    /// 1-6.
    Detractor,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promoter => "promoter",
            Self::Passive => "passive",
            Self::Detractor => "detractor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated feedback webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackPayload {
    /// Sender, e.g. `whatsapp:+15551234567`.
    pub from: String,
    pub body: String,
    /// Allow-listed vendor fields that came along with the webhook.
    pub passthrough: BTreeMap<String, String>,
}

/// A validated survey request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyRequest {
    /// Destination in `+<digits>` form, without channel prefix.
    pub to: String,
}

/// An inbound message after classification. Rating and category are derived
/// once and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingMessage {
    pub from: String,
    pub body: String,
    pub rating: Option<u8>,
    pub category: Option<Category>,
}

/// Result of the reply + notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub email_sent: bool,
    pub message_sent: bool,
    /// The reply text that was (or would have been) sent.
    pub message: String,
}

/// A processed feedback entry kept in the in-memory log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub from: String,
    pub body: String,
    pub rating: Option<u8>,
    pub category: Option<Category>,
    pub processed: bool,
    pub email_sent: bool,
    pub response_sent: bool,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(message: &IncomingMessage, outcome: &DispatchOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: message.from.clone(),
            body: message.body.clone(),
            rating: message.rating,
            category: message.category,
            processed: true,
            email_sent: outcome.email_sent,
            response_sent: outcome.message_sent,
            timestamp: Utc::now(),
        }
    }
}
