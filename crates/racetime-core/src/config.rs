//! Environment configuration shared by the poller and API binaries.
//!
//! Every variable has a default, so an empty environment yields a working
//! local setup. Parsing goes through [`RelayConfig::from_lookup`] so tests can
//! supply a map instead of touching the process environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use racetime_store::live::DEFAULT_REDIS_URL;
use racetime_store::{PostgresConfig, StoreSettings};

use crate::poller::PollerSettings;

/// Default `PostgreSQL` user when composing a URL from parts.
pub const DEFAULT_POSTGRES_USER: &str = "eventrelayuser";

/// Default `PostgreSQL` database when composing a URL from parts.
pub const DEFAULT_POSTGRES_DB: &str = "eventrelay";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that could not be used.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The environment variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "plain" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Shared store URL.
    pub redis_url: String,
    /// Connect and per-command timeout for the shared store.
    pub store_timeout: Duration,
    /// Sleep between poller ticks.
    pub poll_interval: Duration,
    /// Stop the poller after this many ticks (0 = until signalled).
    pub max_ticks: u64,
    /// `PostgreSQL` URL for the event log, if configured.
    pub database_url: Option<String>,
    /// API bind host.
    pub api_host: String,
    /// API bind port.
    pub api_port: u16,
    /// Log line format.
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    ///
    /// Variables (all optional):
    /// - `REDIS_URL` -- shared store URL (default `redis://localhost:6379/0`)
    /// - `STORE_TIMEOUT_MS` -- store timeout in milliseconds (default 2000)
    /// - `POLL_INTERVAL_SECONDS` -- poll interval, finite and > 0 (default 1.0)
    /// - `POLL_MAX_TICKS` -- tick limit, 0 for none (default 0)
    /// - `DATABASE_URL` -- event log URL; otherwise composed from
    ///   `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_USER`,
    ///   `POSTGRES_PASSWORD` and `POSTGRES_DB` when `POSTGRES_HOST` is set
    /// - `API_HOST` / `API_PORT` -- bind address (default `0.0.0.0:8000`)
    /// - `LOG_FORMAT` -- `text` or `json` (default `text`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let redis_url = get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_owned());

        let store_timeout_ms: u64 = parse_or(&get, "STORE_TIMEOUT_MS", 2000)?;
        if store_timeout_ms == 0 {
            return Err(invalid("STORE_TIMEOUT_MS", "must be greater than zero"));
        }

        let poll_interval_secs: f64 = parse_or(&get, "POLL_INTERVAL_SECONDS", 1.0)?;
        let poll_interval = Duration::try_from_secs_f64(poll_interval_secs)
            .ok()
            .filter(|d| !d.is_zero() && poll_interval_secs.is_finite())
            .ok_or_else(|| invalid("POLL_INTERVAL_SECONDS", "must be a finite number > 0"))?;

        let max_ticks: u64 = parse_or(&get, "POLL_MAX_TICKS", 0)?;

        let database_url = match get("DATABASE_URL") {
            Some(url) => Some(url),
            None => compose_postgres_url(&get)?,
        };

        let api_host = get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let api_port: u16 = parse_or(&get, "API_PORT", 8000)?;
        let log_format: LogFormat = parse_or(&get, "LOG_FORMAT", LogFormat::Text)?;

        Ok(Self {
            redis_url,
            store_timeout: Duration::from_millis(store_timeout_ms),
            poll_interval,
            max_ticks,
            database_url,
            api_host,
            api_port,
            log_format,
        })
    }

    /// Shared store settings (both timeouts use `store_timeout`).
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::new(&self.redis_url)
            .with_connect_timeout(self.store_timeout)
            .with_command_timeout(self.store_timeout)
    }

    /// Event log pool settings, if a database is configured.
    pub fn postgres_config(&self) -> Option<PostgresConfig> {
        self.database_url.as_deref().map(PostgresConfig::new)
    }

    /// Poll loop timing.
    pub const fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            interval: self.poll_interval,
            max_ticks: self.max_ticks,
        }
    }

    /// API bind address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

/// Parse a variable, falling back to `default` when unset.
fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(name).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| invalid(name, e.to_string()))
    })
}

/// Build a `PostgreSQL` URL from `POSTGRES_*` parts, if `POSTGRES_HOST` is set.
fn compose_postgres_url<G>(get: &G) -> Result<Option<String>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(host) = get("POSTGRES_HOST") else {
        return Ok(None);
    };
    let port: u16 = parse_or(get, "POSTGRES_PORT", 5432)?;
    let user = get("POSTGRES_USER").unwrap_or_else(|| DEFAULT_POSTGRES_USER.to_owned());
    let db = get("POSTGRES_DB").unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_owned());
    let credentials = get("POSTGRES_PASSWORD")
        .map_or_else(|| user.clone(), |password| format!("{user}:{password}"));

    Ok(Some(format!("postgresql://{credentials}@{host}:{port}/{db}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RelayConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_ticks, 0);
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.postgres_config().is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("REDIS_URL", "redis://cache:6380/2"),
            ("STORE_TIMEOUT_MS", "750"),
            ("POLL_INTERVAL_SECONDS", "0.25"),
            ("POLL_MAX_TICKS", "10"),
            ("API_PORT", "9100"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.redis_url, "redis://cache:6380/2");
        assert_eq!(config.store_timeout, Duration::from_millis(750));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.api_port, 9100);

        let settings = config.poller_settings();
        assert_eq!(settings.max_ticks, 10);
        assert_eq!(settings.interval, Duration::from_millis(250));

        let store = config.store_settings();
        assert_eq!(store.url, "redis://cache:6380/2");
        assert_eq!(store.command_timeout, Duration::from_millis(750));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("REDIS_URL", "  "), ("API_PORT", "")]).unwrap();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.api_port, 8000);
    }

    #[test]
    fn poll_interval_must_be_positive_and_finite() {
        for bad in ["0", "-1", "NaN", "inf", "soon"] {
            let err = load(&[("POLL_INTERVAL_SECONDS", bad)]).unwrap_err();
            assert!(
                err.to_string().contains("POLL_INTERVAL_SECONDS"),
                "{bad} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn unparseable_numbers_name_the_variable() {
        let err = load(&[("API_PORT", "99999")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let err = load(&[("STORE_TIMEOUT_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("STORE_TIMEOUT_MS"));

        let err = load(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert!(err.to_string().contains("LOG_FORMAT"));
    }

    #[test]
    fn database_url_wins_over_parts() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://a:b@db:5432/x"),
            ("POSTGRES_HOST", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgresql://a:b@db:5432/x"));
        assert!(config.postgres_config().is_some());
    }

    #[test]
    fn database_url_is_composed_from_parts() {
        let config = load(&[("POSTGRES_HOST", "db"), ("POSTGRES_PASSWORD", "secret")]).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgresql://eventrelayuser:secret@db:5432/eventrelay")
        );

        let config = load(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PORT", "6543"),
            ("POSTGRES_USER", "relay"),
            ("POSTGRES_DB", "events"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgresql://relay@db:6543/events")
        );
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
