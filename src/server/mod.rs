//! HTTP surface: router, shared state, and cross-cutting layers.

pub mod handlers;
pub mod response;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    X_CONTENT_TYPE_OPTIONS,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::channels::{Mailer, MessageSender};
use crate::config::RetryConfig;
use crate::feedback::{FeedbackStore, NotificationDispatcher, Sleeper};

pub use response::{ApiError, ErrorEnvelope};

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Collaborators shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub messenger: Arc<dyn MessageSender>,
    pub store: Arc<FeedbackStore>,
}

impl AppState {
    pub fn new(
        messenger: Arc<dyn MessageSender>,
        mailer: Arc<dyn Mailer>,
        sleeper: Arc<dyn Sleeper>,
        retry: RetryConfig,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&messenger),
            mailer,
            sleeper,
            retry,
        ));
        Self {
            dispatcher,
            messenger,
            store: Arc::new(FeedbackStore::new()),
        }
    }
}

/// Build the full application router.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/whatsapp", post(handlers::handle_feedback))
        .route("/send-survey", get(handlers::send_survey))
        .route("/health", get(handlers::health))
        .route("/feedback", get(handlers::list_feedback))
        .route("/feedback/{id}", get(handlers::get_feedback))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(answer_preflight))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

/// Answer every OPTIONS request with 200; CORS headers are added further out.
async fn answer_preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");
    ApiError::internal().into_response()
}
