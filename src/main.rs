use std::sync::Arc;

use anyhow::Context;

use whatsapp_feedback::channels::{SmtpMailer, TwilioClient};
use whatsapp_feedback::config::AppConfig;
use whatsapp_feedback::feedback::TokioSleeper;
use whatsapp_feedback::server::{AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::from_env().context("Config validation error")?;
    let _log_guards = whatsapp_feedback::logging::init(&config.logging, config.env)?;

    // ── Collaborators ───────────────────────────────────────────────────
    let messenger = Arc::new(TwilioClient::new(config.twilio.clone())?);
    let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
    let state = AppState::new(
        messenger,
        mailer,
        Arc::new(TokioSleeper),
        config.retry.clone(),
    );

    let app = routes(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    tracing::info!(
        port = config.port,
        env = ?config.env,
        max_retries = config.retry.max_attempts,
        "Server running"
    );
    eprintln!("📱 WhatsApp webhook: http://localhost:{}/whatsapp", config.port);
    eprintln!(
        "📨 Survey endpoint: http://localhost:{}/send-survey?to=+1234567890",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
