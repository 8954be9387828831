//! Counter configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                      | Default                 |
//! |-------------------------------|-------------------------|
//! | `SPLASH_DB_PATH`              | `./splash.db`           |
//! | `SPLASH_JWT_SECRET`           | development secret      |
//! | `SPLASH_TZ_OFFSET_MINUTES`    | `330` (IST)             |
//! | `SPLASH_GST_BPS`              | `0`                     |
//! | `SPLASH_MAX_CONFLICT_RETRIES` | `3`                     |
//! | `SPLASH_PRINT_QUEUE`          | `64`                    |
//! | `SPLASH_RECEIPT_FILE`         | unset: log receipts     |
//! | `SPLASH_FACILITY_NAME`        | `Splash Water Park`     |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use splash_core::validation::validate_rate_bps;
use splash_core::{Rate, DEFAULT_FACILITY_OFFSET_MINUTES};
use splash_engine::config::offset_from_minutes;
use splash_engine::{EngineConfig, DEFAULT_SPOOL_CAPACITY};

const DEV_JWT_SECRET: &str = "splash-counter-dev-secret-change-in-production";

/// Counter configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// HS256 secret shared with whoever issues cashier tokens
    pub jwt_secret: String,

    /// Facility clock, minutes east of UTC
    pub tz_offset_minutes: i32,

    /// GST in basis points, applied after discount
    pub gst_bps: u32,

    /// Compare-and-set retries before a command reports `CONFLICT`
    pub max_conflict_retries: u32,

    /// Receipts that may wait for the printer
    pub print_queue: usize,

    /// Append receipts here instead of logging them
    pub receipt_file: Option<PathBuf>,

    /// Printed on every receipt
    pub facility_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from("./splash.db"),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            tz_offset_minutes: DEFAULT_FACILITY_OFFSET_MINUTES,
            gst_bps: 0,
            max_conflict_retries: 3,
            print_queue: DEFAULT_SPOOL_CAPACITY,
            receipt_file: None,
            facility_name: "Splash Water Park".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let jwt_secret = match lookup("SPLASH_JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            Some(_) => return Err(ConfigError::MissingRequired("SPLASH_JWT_SECRET".to_string())),
            None => {
                warn!("SPLASH_JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let config = AppConfig {
            db_path: lookup("SPLASH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            jwt_secret,

            tz_offset_minutes: parse_or(
                &lookup,
                "SPLASH_TZ_OFFSET_MINUTES",
                defaults.tz_offset_minutes,
            )?,

            gst_bps: parse_or(&lookup, "SPLASH_GST_BPS", defaults.gst_bps)?,

            max_conflict_retries: parse_or(
                &lookup,
                "SPLASH_MAX_CONFLICT_RETRIES",
                defaults.max_conflict_retries,
            )?,

            print_queue: parse_or(&lookup, "SPLASH_PRINT_QUEUE", defaults.print_queue)?,

            receipt_file: lookup("SPLASH_RECEIPT_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            facility_name: lookup("SPLASH_FACILITY_NAME")
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.facility_name),
        };

        config.engine_config()?;
        if config.print_queue == 0 {
            return Err(ConfigError::InvalidValue("SPLASH_PRINT_QUEUE".to_string()));
        }

        Ok(config)
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let offset = offset_from_minutes(self.tz_offset_minutes)
            .ok_or_else(|| ConfigError::InvalidValue("SPLASH_TZ_OFFSET_MINUTES".to_string()))?;

        validate_rate_bps(self.gst_bps)
            .map_err(|_| ConfigError::InvalidValue("SPLASH_GST_BPS".to_string()))?;

        Ok(EngineConfig::default()
            .with_facility_name(self.facility_name.clone())
            .with_facility_offset(offset)
            .with_gst_rate(Rate::from_bps(self.gst_bps))
            .with_max_conflict_retries(self.max_conflict_retries))
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.tz_offset_minutes, 330);
        assert_eq!(config.gst_bps, 0);
        assert_eq!(config.max_conflict_retries, 3);
        assert!(config.receipt_file.is_none());

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.facility_offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SPLASH_DB_PATH", "/var/lib/splash/park.db"),
            ("SPLASH_JWT_SECRET", "s3cret"),
            ("SPLASH_GST_BPS", "1800"),
            ("SPLASH_TZ_OFFSET_MINUTES", "-300"),
            ("SPLASH_RECEIPT_FILE", "/tmp/receipts.txt"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/splash/park.db"));
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.engine_config().unwrap().gst_rate, Rate::from_bps(1800));
        assert_eq!(config.receipt_file, Some(PathBuf::from("/tmp/receipts.txt")));
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("SPLASH_GST_BPS", "eighteen")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(k) if k == "SPLASH_GST_BPS"));

        let err =
            AppConfig::from_lookup(lookup(&[("SPLASH_TZ_OFFSET_MINUTES", "2000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = AppConfig::from_lookup(lookup(&[("SPLASH_JWT_SECRET", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
