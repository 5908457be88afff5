//! Configuration types, loaded once from the environment at startup.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Twilio REST API base URL.
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Upper bound for `MAX_RETRY_ATTEMPTS`.
pub const RETRY_CEILING: u32 = 10;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "expected one of development, production, test (got {other:?})"
            )),
        }
    }
}

/// Twilio WhatsApp credentials and sender.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender number, e.g. `whatsapp:+14155238886`.
    pub whatsapp_number: String,
    pub api_base: String,
}

/// SMTP settings for the support-team notification email.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    pub to_address: String,
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`.
    pub level: String,
    pub dir: String,
}

/// Messaging retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_attempts: u32,
    /// Delay before retry `n` is `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub port: u16,
    pub twilio: TwilioConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an in-memory map (tests, embedding).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup. Fails on the first missing
    /// or malformed value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.into()));

        let env = parse_or(get("APP_ENV"), "APP_ENV", AppEnv::Development)?;
        let port = parse_or(get("PORT"), "PORT", 3000u16)?;

        let twilio = TwilioConfig {
            account_sid: required("TWILIO_ACCOUNT_SID")?,
            auth_token: SecretString::from(required("TWILIO_AUTH_TOKEN")?),
            whatsapp_number: required("TWILIO_WHATSAPP_NUMBER")?,
            api_base: get("TWILIO_API_BASE")
                .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        let smtp = SmtpConfig {
            host: required("EMAIL_HOST")?,
            port: parse_or(get("EMAIL_PORT"), "EMAIL_PORT", 587u16)?,
            username: email_address("EMAIL_USER", required("EMAIL_USER")?)?,
            password: SecretString::from(required("EMAIL_PASS")?),
            from_address: email_address("FROM_EMAIL", required("FROM_EMAIL")?)?,
            to_address: email_address("TO_EMAIL", required("TO_EMAIL")?)?,
        };

        let level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        if !matches!(level.as_str(), "error" | "warn" | "info" | "debug") {
            return Err(ConfigError::InvalidValue {
                key: "LOG_LEVEL".into(),
                message: format!("expected one of error, warn, info, debug (got {level:?})"),
            });
        }
        let logging = LoggingConfig {
            level,
            dir: get("LOG_DIR").unwrap_or_else(|| "./logs".to_string()),
        };

        let max_attempts = parse_or(get("MAX_RETRY_ATTEMPTS"), "MAX_RETRY_ATTEMPTS", 3u32)?;
        if max_attempts > RETRY_CEILING {
            return Err(ConfigError::InvalidValue {
                key: "MAX_RETRY_ATTEMPTS".into(),
                message: format!("must be at most {RETRY_CEILING} (got {max_attempts})"),
            });
        }
        let retry = RetryConfig {
            max_attempts,
            ..RetryConfig::default()
        };

        Ok(Self {
            env,
            port,
            twilio,
            smtp,
            logging,
            retry,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        }),
    }
}

fn email_address(key: &str, value: String) -> Result<String, ConfigError> {
    value
        .parse::<lettre::Address>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: format!("not an email address: {e}"),
        })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn base_vars() -> HashMap<String, String> {
        [
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "token"),
            ("TWILIO_WHATSAPP_NUMBER", "whatsapp:+14155238886"),
            ("EMAIL_HOST", "smtp.example.com"),
            ("EMAIL_USER", "bot@example.com"),
            ("EMAIL_PASS", "secret"),
            ("FROM_EMAIL", "bot@example.com"),
            ("TO_EMAIL", "support@example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn defaults_applied_when_optional_vars_absent() {
        let config = AppConfig::from_map(&base_vars()).unwrap();
        assert_eq!(config.env, AppEnv::Development);
        assert_eq!(config.port, 3000);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_unit, Duration::from_secs(1));
        assert_eq!(config.twilio.api_base, DEFAULT_TWILIO_API_BASE);
        assert_eq!(config.twilio.auth_token.expose_secret(), "token");
    }

    #[test]
    fn missing_required_var_fails() {
        let mut vars = base_vars();
        vars.remove("TWILIO_AUTH_TOKEN");
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "TWILIO_AUTH_TOKEN"));
    }

    #[test]
    fn blank_required_var_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("EMAIL_HOST".into(), "   ".into());
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "EMAIL_HOST"));
    }

    #[test]
    fn invalid_email_address_rejected() {
        let mut vars = base_vars();
        vars.insert("TO_EMAIL".into(), "not-an-email".into());
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TO_EMAIL"));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let mut vars = base_vars();
        vars.insert("LOG_LEVEL".into(), "trace".into());
        assert!(AppConfig::from_map(&vars).is_err());
    }

    #[test]
    fn overrides_parsed() {
        let mut vars = base_vars();
        vars.insert("MAX_RETRY_ATTEMPTS".into(), "5".into());
        vars.insert("EMAIL_PORT".into(), "465".into());
        vars.insert("APP_ENV".into(), "production".into());
        vars.insert("TWILIO_API_BASE".into(), "http://127.0.0.1:9999/".into());
        let config = AppConfig::from_map(&vars).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.env, AppEnv::Production);
        assert_eq!(config.twilio.api_base, "http://127.0.0.1:9999");
    }

    #[test]
    fn non_numeric_retry_count_rejected() {
        let mut vars = base_vars();
        vars.insert("MAX_RETRY_ATTEMPTS".into(), "lots".into());
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAX_RETRY_ATTEMPTS")
        );
    }

    #[test]
    fn retry_count_above_ceiling_rejected() {
        let mut vars = base_vars();
        vars.insert("MAX_RETRY_ATTEMPTS".into(), "100000".into());
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAX_RETRY_ATTEMPTS")
        );

        vars.insert("MAX_RETRY_ATTEMPTS".into(), RETRY_CEILING.to_string());
        let config = AppConfig::from_map(&vars).unwrap();
        assert_eq!(config.retry.max_attempts, RETRY_CEILING);
    }
}
