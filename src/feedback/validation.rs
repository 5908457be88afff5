//! Input validation for the feedback webhook and the survey endpoint.
//!
//! Checks run in a fixed order and stop at the first violation. Messages name
//! the offending field in quotes so the caller can tell what to fix.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::model::{FeedbackPayload, SurveyRequest};
use crate::error::ValidationError;

/// Maximum feedback body length, in characters.
pub const MAX_BODY_CHARS: usize = 500;

static WHATSAPP_SENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^whatsapp:\+[0-9]{10,15}$").expect("valid sender regex"));

static E164_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{10,15}$").expect("valid phone regex"));

/// Optional Twilio webhook fields that are carried along with a valid payload.
/// Anything else in the form is dropped.
pub const PASSTHROUGH_FIELDS: &[&str] = &[
    "SmsMessageSid",
    "MessageSid",
    "AccountSid",
    "MessagingServiceSid",
    "NumMedia",
    "ProfileName",
    "WaId",
    "SmsStatus",
    "To",
    "NumSegments",
    "ReferralNumMedia",
    "MessageType",
    "ApiVersion",
];

/// Validate a decoded feedback webhook form.
pub fn validate_feedback(fields: &HashMap<String, String>) -> Result<FeedbackPayload, ValidationError> {
    let result = check_feedback(fields);
    if let Err(ref e) = result {
        warn!(field = %e.field, error = %e.message, "Invalid feedback input");
    }
    result
}

fn check_feedback(fields: &HashMap<String, String>) -> Result<FeedbackPayload, ValidationError> {
    let body = fields
        .get("Body")
        .ok_or_else(|| ValidationError::new("Body", "\"Body\" is required"))?;
    if body.is_empty() {
        return Err(ValidationError::new("Body", "\"Body\" is not allowed to be empty"));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ValidationError::new(
            "Body",
            format!("\"Body\" length must be less than or equal to {MAX_BODY_CHARS} characters long"),
        ));
    }

    let from = fields
        .get("From")
        .ok_or_else(|| ValidationError::new("From", "\"From\" is required"))?;
    if !WHATSAPP_SENDER.is_match(from) {
        return Err(ValidationError::new(
            "From",
            format!(
                "\"From\" with value \"{from}\" must be a WhatsApp address like whatsapp:+15551234567"
            ),
        ));
    }

    let passthrough: BTreeMap<String, String> = PASSTHROUGH_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();

    Ok(FeedbackPayload {
        from: from.clone(),
        body: body.clone(),
        passthrough,
    })
}

/// Validate the `to` query parameter of a survey request.
pub fn validate_survey(to: Option<&str>) -> Result<SurveyRequest, ValidationError> {
    let result = match to {
        None => Err(ValidationError::new("to", "\"to\" is required")),
        Some(to) if !E164_NUMBER.is_match(to) => Err(ValidationError::new(
            "to",
            format!("\"to\" with value \"{to}\" must be a phone number like +15551234567"),
        )),
        Some(to) => Ok(SurveyRequest { to: to.to_string() }),
    };
    if let Err(ref e) = result {
        warn!(field = %e.field, error = %e.message, "Invalid survey input");
    }
    result
}
