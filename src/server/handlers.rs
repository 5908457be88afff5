//! HTTP handlers for the feedback webhook, survey trigger and feedback log.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::AppState;
use super::response::ApiError;
use crate::channels::whatsapp::format_whatsapp_address;
use crate::feedback::composer::survey_invite;
use crate::feedback::model::FeedbackRecord;
use crate::feedback::rating::classify;
use crate::feedback::validation::{validate_feedback, validate_survey};

// ── Feedback intake ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAccepted {
    pub message: &'static str,
    pub response: String,
    pub email_sent: bool,
    pub message_sent: bool,
    pub feedback_id: Uuid,
}

/// POST /whatsapp
///
/// Always 200 once the payload validates, even if the reply or the email
/// could not be delivered.
pub async fn handle_feedback(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<FeedbackAccepted>, ApiError> {
    let Form(fields) = form.map_err(|e| {
        warn!(error = %e, "Undecodable webhook body");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        } else {
            ApiError::bad_request("Invalid request body format")
        }
    })?;

    let payload = validate_feedback(&fields)?;
    if let Some(sid) = payload.passthrough.get("MessageSid") {
        info!(message_sid = %sid, from = %payload.from, "Webhook received");
    }

    let message = classify(&payload.from, &payload.body);
    let outcome = state.dispatcher.dispatch(&message).await;
    let record = state.store.save(FeedbackRecord::new(&message, &outcome)).await;

    Ok(Json(FeedbackAccepted {
        message: "Feedback processed successfully",
        response: outcome.message,
        email_sent: outcome.email_sent,
        message_sent: outcome.message_sent,
        feedback_id: record.id,
    }))
}

// ── Survey ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SurveyQuery {
    to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySent {
    pub status: &'static str,
    pub message: &'static str,
    pub sent_to: String,
}

/// An unencoded `+` in a query string decodes to a space; put it back.
fn restore_plus(to: String) -> String {
    match to.strip_prefix(' ') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => format!("+{rest}"),
        _ => to,
    }
}

/// GET /send-survey?to=+15551234567
///
/// Single send attempt; no retry and no email.
pub async fn send_survey(
    State(state): State<AppState>,
    query: Result<Query<SurveyQuery>, QueryRejection>,
) -> Result<Json<SurveySent>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!(error = %e, "Undecodable survey query");
        ApiError::bad_request("Invalid query string")
    })?;

    let request = validate_survey(query.to.map(restore_plus).as_deref())?;

    state
        .messenger
        .send_message(&format_whatsapp_address(&request.to), survey_invite())
        .await
        .map_err(|e| {
            error!(to = %request.to, error = %e, "Survey send failed");
            ApiError::from(e)
        })?;

    info!(to = %request.to, "Survey sent");
    Ok(Json(SurveySent {
        status: "success",
        message: "Survey sent successfully",
        sent_to: request.to,
    }))
}

// ── Feedback log ────────────────────────────────────────────────────────

/// GET /feedback
pub async fn list_feedback(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.all().await)
}

/// GET /feedback/{id}
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackRecord>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid feedback ID"))?;
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Feedback not found"))
}

// ── Misc ────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "whatsapp-feedback"
    }))
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    warn!(method = %method, path = %uri.path(), "Route not found");
    ApiError::not_found("Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_leading_plus() {
        assert_eq!(restore_plus(" 1234567890".into()), "+1234567890");
        assert_eq!(restore_plus("+1234567890".into()), "+1234567890");
        assert_eq!(restore_plus(" abc".into()), " abc");
        assert_eq!(restore_plus("invalid".into()), "invalid");
    }
}
