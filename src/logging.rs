//! Tracing setup: JSON log files plus a console layer outside production.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{AppEnv, LoggingConfig};

/// Keeps the background log writers alive; drop it only at shutdown.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// `RUST_LOG` wins over the configured level when set.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. `combined.log` gets everything the filter
/// allows, `error.log` only errors.
pub fn init(config: &LoggingConfig, env: AppEnv) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(&config.dir)?;

    let (combined, combined_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&config.dir, "combined.log"));
    let (errors, errors_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&config.dir, "error.log"));

    let console = (env != AppEnv::Production).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().json().with_writer(combined))
        .with(
            fmt::layer()
                .json()
                .with_writer(errors)
                .with_filter(LevelFilter::ERROR),
        )
        .with(console)
        .try_init()?;

    Ok(LogGuards {
        _guards: vec![combined_guard, errors_guard],
    })
}
