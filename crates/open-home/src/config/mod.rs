use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::accounts::credentials::DEFAULT_PASSWORD_COST;
use crate::workflows::accounts::SessionPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub inspections: InspectionConfig,
    pub sessions: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fixture_path = env::var("APP_INSPECTIONS_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let mock_seed = optional_number::<u64>("APP_MOCK_SEED")?;

        let access_ttl_hours = optional_number::<u32>("APP_ACCESS_TOKEN_TTL_HOURS")?
            .unwrap_or(DEFAULT_ACCESS_TTL_HOURS);
        let refresh_ttl_days = optional_number::<u32>("APP_REFRESH_TOKEN_TTL_DAYS")?
            .unwrap_or(DEFAULT_REFRESH_TTL_DAYS);
        let password_cost = optional_number::<u32>("APP_PASSWORD_HASH_COST")?
            .unwrap_or(DEFAULT_PASSWORD_COST);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            inspections: InspectionConfig {
                fixture_path,
                mock_seed,
            },
            sessions: SessionConfig {
                access_ttl_hours,
                refresh_ttl_days,
                password_cost,
            },
        })
    }
}

fn optional_number<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key }),
        _ => Ok(None),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where inspection listings come from. Without a fixture file the mock
/// generator is the only source.
#[derive(Debug, Clone, Default)]
pub struct InspectionConfig {
    pub fixture_path: Option<PathBuf>,
    pub mock_seed: Option<u64>,
}

pub const DEFAULT_ACCESS_TTL_HOURS: u32 = 24;
pub const DEFAULT_REFRESH_TTL_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub access_ttl_hours: u32,
    pub refresh_ttl_days: u32,
    /// Bcrypt work factor for newly stored passwords.
    pub password_cost: u32,
}

impl SessionConfig {
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: chrono::Duration::hours(i64::from(self.access_ttl_hours)),
            refresh_ttl: chrono::Duration::days(i64::from(self.refresh_ttl_days)),
            password_cost: self.password_cost,
            ..SessionPolicy::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl_hours: DEFAULT_ACCESS_TTL_HOURS,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_INSPECTIONS_FILE",
            "APP_MOCK_SEED",
            "APP_ACCESS_TOKEN_TTL_HOURS",
            "APP_REFRESH_TOKEN_TTL_DAYS",
            "APP_PASSWORD_HASH_COST",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.inspections.fixture_path.is_none());
        assert!(config.inspections.mock_seed.is_none());
        assert_eq!(config.sessions.access_ttl_hours, 24);
        assert_eq!(config.sessions.refresh_ttl_days, 30);
        assert_eq!(config.sessions.password_cost, 12);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_inspection_and_session_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_INSPECTIONS_FILE", "fixtures/inspections.json");
        env::set_var("APP_MOCK_SEED", "42");
        env::set_var("APP_ACCESS_TOKEN_TTL_HOURS", "2");
        env::set_var("APP_PASSWORD_HASH_COST", "10");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(
            config.inspections.fixture_path,
            Some(PathBuf::from("fixtures/inspections.json"))
        );
        assert_eq!(config.inspections.mock_seed, Some(42));
        let policy = config.sessions.policy();
        assert_eq!(policy.access_ttl, chrono::Duration::hours(2));
        assert_eq!(policy.refresh_ttl, chrono::Duration::days(30));
        assert_eq!(policy.max_failed_logins, 5);
        assert_eq!(policy.password_cost, 10);
    }

    #[test]
    fn rejects_non_numeric_seed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MOCK_SEED", "lucky");

        let err = AppConfig::load().expect_err("seed must be numeric");
        reset_env();

        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "APP_MOCK_SEED"
            }
        ));
        assert_eq!(err.to_string(), "APP_MOCK_SEED must be a non-negative integer");
    }
}
