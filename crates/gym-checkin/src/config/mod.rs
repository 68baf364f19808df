use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the kiosk.
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

/// Top-level configuration for the kiosk service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub membership_api: MembershipApiConfig,
    pub kiosk: KioskConfig,
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

        let base_url = env::var("MEMBERSHIP_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let timeout_secs = parse_positive_secs("MEMBERSHIP_API_TIMEOUT_SECS", "10")
            .ok_or(ConfigError::InvalidTimeout)?;
        let membership_api = MembershipApiConfig::new(base_url, Duration::from_secs(timeout_secs))?;

        let reload_after_secs =
            parse_positive_secs("KIOSK_RELOAD_SECS", "5").ok_or(ConfigError::InvalidReloadDelay)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            membership_api,
            kiosk: KioskConfig { reload_after_secs },
        })
    }
}

fn parse_positive_secs(key: &str, default: &str) -> Option<u64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
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

/// Location of the remote membership API and the per-call deadline.
#[derive(Debug, Clone)]
pub struct MembershipApiConfig {
    base_url: String,
    pub timeout: Duration,
}

impl MembershipApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
        let has_host = trimmed
            .split_once("://")
            .map(|(_, rest)| !rest.is_empty())
            .unwrap_or(false);

        if !has_scheme || !has_host {
            return Err(ConfigError::InvalidApiBaseUrl(base_url));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            timeout,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Kiosk page behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KioskConfig {
    pub reload_after_secs: u64,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            reload_after_secs: 5,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApiBaseUrl(String),
    InvalidTimeout,
    InvalidReloadDelay,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiBaseUrl(value) => write!(
                f,
                "MEMBERSHIP_API_BASE_URL must be an http(s) URL, got '{}'",
                value
            ),
            ConfigError::InvalidTimeout => write!(
                f,
                "MEMBERSHIP_API_TIMEOUT_SECS must be a positive number of seconds"
            ),
            ConfigError::InvalidReloadDelay => {
                write!(f, "KIOSK_RELOAD_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApiBaseUrl(_)
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidReloadDelay => None,
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("MEMBERSHIP_API_BASE_URL");
        env::remove_var("MEMBERSHIP_API_TIMEOUT_SECS");
        env::remove_var("KIOSK_RELOAD_SECS");
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
        assert_eq!(config.membership_api.base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.membership_api.timeout, Duration::from_secs(10));
        assert_eq!(config.kiosk.reload_after_secs, 5);
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
    fn reads_membership_api_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MEMBERSHIP_API_BASE_URL", "https://gym.example.com/");
        env::set_var("MEMBERSHIP_API_TIMEOUT_SECS", "3");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.membership_api.base_url(), "https://gym.example.com");
        assert_eq!(config.membership_api.timeout, Duration::from_secs(3));
        reset_env();
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MEMBERSHIP_API_BASE_URL", "167.99.144.56:8000");
        let err = AppConfig::load().expect_err("scheme is required");
        assert!(matches!(err, ConfigError::InvalidApiBaseUrl(_)));
        reset_env();
    }

    #[test]
    fn rejects_zero_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MEMBERSHIP_API_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout is invalid");
        assert!(matches!(err, ConfigError::InvalidTimeout));
        reset_env();
    }
}
