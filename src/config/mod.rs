use axum::http::HeaderValue;
use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

// Top-level configuration, one sub-struct per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub frontend_origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_seconds: u64,
}

// Session tokens are issued elsewhere; we only verify them
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub cookie_name: String,
}

// Behaviour switches for the booking core
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureFlags {
    /// Reject seats already held by a live booking of the same showtime.
    pub prevent_double_booking: bool,
    /// Pending -> Paid, anything else -> Pending. Lets a payment leave Refunded.
    pub legacy_payment_toggle: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            prevent_double_booking: true,
            legacy_payment_toggle: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let log_format = match var("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid { name: "LOG_FORMAT", value: other.to_string() });
            }
        };

        let frontend_origin = var("FRONTEND_ORIGIN", "http://localhost:3000");
        if HeaderValue::from_str(&frontend_origin).is_err() {
            return Err(ConfigError::Invalid { name: "FRONTEND_ORIGIN", value: frontend_origin });
        }

        Ok(Config {
            app: AppConfig {
                host: var("HOST", "0.0.0.0"),
                port: parse("PORT", var("PORT", "8000"))?,
                environment: var("ENVIRONMENT", "development"),
                rust_log: var("RUST_LOG", "showtime_booking=debug,tower_http=debug"),
                log_format,
                frontend_origin,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parse("DB_POOL_SIZE", var("DB_POOL_SIZE", "20"))?,
                acquire_timeout_seconds: parse(
                    "DB_ACQUIRE_TIMEOUT_SECONDS",
                    var("DB_ACQUIRE_TIMEOUT_SECONDS", "5"),
                )?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                cookie_name: var("JWT_COOKIE_NAME", "token"),
            },
            features: FeatureFlags {
                prevent_double_booking: parse(
                    "PREVENT_DOUBLE_BOOKING",
                    var("PREVENT_DOUBLE_BOOKING", "true"),
                )?,
                legacy_payment_toggle: parse(
                    "LEGACY_PAYMENT_TOGGLE",
                    var("LEGACY_PAYMENT_TOGGLE", "false"),
                )?,
            },
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.log_format, LogFormat::Pretty);
        assert_eq!(config.database.pool_size, 20);
        assert_eq!(config.jwt.cookie_name, "token");
        assert!(config.features.prevent_double_booking);
        assert!(!config.features.legacy_payment_toggle);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn malformed_numbers_and_flags_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("LEGACY_PAYMENT_TOGGLE", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "LEGACY_PAYMENT_TOGGLE", .. }));
    }

    #[test]
    fn json_log_format_is_case_insensitive() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.app.log_format, LogFormat::Json);
    }
}
