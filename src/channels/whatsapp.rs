//! WhatsApp channel via the Twilio Messages REST API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, info};

use super::{MessageSender, SentMessage};
use crate::config::TwilioConfig;
use crate::error::ChannelError;

const CHANNEL: &str = "whatsapp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful `Messages.json` response (only the fields we log).
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

/// Twilio error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio REST client for outbound WhatsApp messages.
pub struct TwilioClient {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL.into(),
                reason: format!("HTTP client setup failed: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base, self.config.account_sid
        )
    }
}

/// Prefix a bare phone number with `whatsapp:`; leave prefixed ones alone.
pub fn format_whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send_message(&self, to: &str, body: &str) -> Result<SentMessage, ChannelError> {
        let to = format_whatsapp_address(to);
        let form = [
            ("From", self.config.whatsapp_number.as_str()),
            ("To", to.as_str()),
            ("Body", body),
        ];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(ApiErrorBody {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{message} (code {code})"),
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => text,
            };
            debug!(status = status.as_u16(), reason = %reason, "Twilio rejected message");
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED {
                ChannelError::AuthFailed {
                    name: CHANNEL.into(),
                    reason,
                }
            } else {
                ChannelError::Rejected {
                    name: CHANNEL.into(),
                    status: status.as_u16(),
                    reason,
                }
            });
        }

        let resource: MessageResource =
            resp.json().await.map_err(|e| ChannelError::SendFailed {
                name: CHANNEL.into(),
                reason: format!("Unreadable Twilio response: {e}"),
            })?;

        info!(
            message_sid = %resource.sid,
            status = resource.status.as_deref().unwrap_or("unknown"),
            to = %to,
            "WhatsApp message accepted"
        );
        Ok(SentMessage { sid: resource.sid })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Form, Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone, Default)]
    struct StubState {
        requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    }

    async fn create_message(
        State(state): State<StubState>,
        Path(account): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Basic QUMxMjM6dG9rZW4=" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"code": 20003, "message": "Authenticate"})),
            );
        }
        if form.get("To").map(String::as_str) == Some("whatsapp:+19999999999") {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"code": 21211, "message": "Invalid 'To' Phone Number"})),
            );
        }
        state.requests.lock().unwrap().push((account, form));
        (
            StatusCode::CREATED,
            Json(serde_json::json!({"sid": "SM0001", "status": "queued"})),
        )
    }

    async fn start_stub() -> (String, StubState) {
        let state = StubState::default();
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/{account}/Messages.json",
                post(create_message),
            )
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), state)
    }

    fn config(api_base: String, token: &str) -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: SecretString::from(token.to_string()),
            whatsapp_number: "whatsapp:+14155238886".into(),
            api_base,
        }
    }

    #[test]
    fn formats_bare_number() {
        assert_eq!(format_whatsapp_address("+1234567890"), "whatsapp:+1234567890");
    }

    #[test]
    fn does_not_double_prefix() {
        assert_eq!(
            format_whatsapp_address("whatsapp:+1234567890"),
            "whatsapp:+1234567890"
        );
    }

    #[tokio::test]
    async fn sends_form_with_basic_auth() {
        let (base, state) = start_stub().await;
        let client = TwilioClient::new(config(base, "token")).unwrap();

        let sent = client.send_message("+15551234567", "hello").await.unwrap();
        assert_eq!(sent.sid, "SM0001");

        let requests = state.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (account, form) = &requests[0];
        assert_eq!(account, "AC123");
        assert_eq!(form["To"], "whatsapp:+15551234567");
        assert_eq!(form["From"], "whatsapp:+14155238886");
        assert_eq!(form["Body"], "hello");
    }

    #[tokio::test]
    async fn bad_credentials_map_to_auth_failure() {
        let (base, _state) = start_stub().await;
        let client = TwilioClient::new(config(base, "wrong")).unwrap();

        let err = client.send_message("+15551234567", "hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::AuthFailed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn api_rejection_carries_status_and_message() {
        let (base, _state) = start_stub().await;
        let client = TwilioClient::new(config(base, "token")).unwrap();

        let err = client.send_message("+19999999999", "hello").await.unwrap_err();
        match err {
            ChannelError::Rejected { status, reason, .. } => {
                assert_eq!(status, 400);
                assert!(reason.contains("Invalid 'To' Phone Number"));
                assert!(reason.contains("21211"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_send_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = TwilioClient::new(config(format!("http://127.0.0.1:{port}"), "token")).unwrap();
        let err = client.send_message("+15551234567", "hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed { .. }), "{err:?}");
    }
}
