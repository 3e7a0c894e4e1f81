//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use passin_registration::application::policy::{AdmissionPolicy, RetryPolicy};

use crate::error::AppError;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// Connection pool size (`DATABASE_MAX_CONNECTIONS`).
    pub database_max_connections: u32,
    /// Attempts per admission (`ADMISSION_MAX_ATTEMPTS`).
    pub admission_max_attempts: u32,
    /// Per-request admission deadline (`ADMISSION_TIMEOUT_MS`).
    pub admission_timeout: Option<Duration>,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`).
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".into())
        })?;

        let admission_timeout = lookup("ADMISSION_TIMEOUT_MS")
            .map(|raw| parse_var::<u64>("ADMISSION_TIMEOUT_MS", &raw))
            .transpose()?
            .map(Duration::from_millis);

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var("PORT", &lookup("PORT").unwrap_or_else(|| "3333".to_string()))?,
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                &lookup("DATABASE_MAX_CONNECTIONS").unwrap_or_else(|| "10".to_string()),
            )?,
            admission_max_attempts: parse_var(
                "ADMISSION_MAX_ATTEMPTS",
                &lookup("ADMISSION_MAX_ATTEMPTS").unwrap_or_else(|| "5".to_string()),
            )?,
            admission_timeout,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Admission policy derived from this configuration.
    #[must_use]
    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            retry: RetryPolicy::new().with_max_attempts(self.admission_max_attempts),
            timeout: self.admission_timeout,
        }
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| {
        AppError::Config(format!(
            "{name} must be a valid {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/passin")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3333);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.admission_max_attempts, 5);
        assert_eq!(config.admission_timeout, None);
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.bind_addr().unwrap().port(), 3333);
    }

    #[test]
    fn test_missing_database_url_is_a_config_error() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]).unwrap_err();
        match err {
            AppError::Config(msg) => assert!(msg.starts_with("PORT must be a valid u16")),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_admission_settings_flow_into_policy() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMISSION_MAX_ATTEMPTS", "3"),
            ("ADMISSION_TIMEOUT_MS", "1500"),
        ])
        .unwrap();

        let policy = config.admission_policy();

        assert_eq!(policy.retry.max_attempts(), 3);
        assert_eq!(policy.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_empty_otlp_endpoint_is_ignored() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", ""),
        ])
        .unwrap();

        assert_eq!(config.otlp_endpoint, None);
    }
}
