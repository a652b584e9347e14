//! Configuration management for the admin client stack

use crate::error::CoreResult;
use crate::tracing::InstrumentationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `MEDADMIN__API__BASE_URL`
pub const ENV_PREFIX: &str = "MEDADMIN";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Backend REST API configuration
    pub api: ApiConfig,

    /// Session lifetime and routing configuration
    pub session: SessionConfig,

    /// Real-time notification socket configuration
    pub socket: SocketConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: InstrumentationConfig,
}

/// Backend REST API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address every request path is appended to
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Session lifetime and routing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime granted to an access token on login or refresh
    pub max_age_secs: u64,

    /// A token is refreshed once it is this close to expiry
    pub refresh_window_secs: u64,

    /// Upper bound on a single refresh call
    pub refresh_timeout_secs: u64,

    /// Login entry point
    pub login_path: String,

    /// Dashboard entry point
    pub dashboard_path: String,

    /// Paths that only make sense without a session
    pub public_paths: Vec<String>,

    /// Paths that require a session
    pub protected_paths: Vec<String>,

    /// Cookie carrying the identity provider's session JWT
    pub cookie_name: String,

    /// Secret the session JWT is signed with
    #[serde(default)]
    pub secret: Option<String>,
}

/// Real-time notification socket configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Socket server address
    pub url: String,

    /// First reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,

    /// Reconnection delay cap in milliseconds
    pub reconnect_delay_max_ms: u64,

    /// Reconnection attempts before giving up
    pub reconnect_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_secs: 30,
            user_agent: concat!("medadmin/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 24 * 60 * 60,
            refresh_window_secs: 60,
            refresh_timeout_secs: 10,
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            public_paths: vec![
                "/login".to_string(),
                "/forgot-password".to_string(),
                "/reset-password".to_string(),
                "/verify-otp".to_string(),
            ],
            protected_paths: vec!["/dashboard".to_string()],
            cookie_name: "session-token".to_string(),
            secret: None,
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3001".to_string(),
            reconnect_delay_ms: 1_000,
            reconnect_delay_max_ms: 5_000,
            reconnect_attempts: 5,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    /// Token lifetime as a [`chrono::Duration`]
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.max_age_secs).unwrap_or(i64::MAX / 1_000))
    }

    /// Refresh safety window as a [`chrono::Duration`]
    pub fn refresh_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            i64::try_from(self.refresh_window_secs).unwrap_or(i64::MAX / 1_000),
        )
    }

    /// Refresh call timeout as a [`Duration`]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

impl SocketConfig {
    /// First reconnection delay as a [`Duration`]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Reconnection delay cap as a [`Duration`]
    pub const fn reconnect_delay_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_max_ms)
    }
}

impl DashboardConfig {
    /// Load configuration from file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let settings = Self::with_defaults()?
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        let settings = Self::with_defaults()?
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("session.public_paths")
            .with_list_parse_key("session.protected_paths")
            .try_parsing(true)
    }

    fn with_defaults() -> CoreResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();

        Ok(config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("api.user_agent", defaults.api.user_agent)?
            .set_default("session.max_age_secs", defaults.session.max_age_secs)?
            .set_default(
                "session.refresh_window_secs",
                defaults.session.refresh_window_secs,
            )?
            .set_default(
                "session.refresh_timeout_secs",
                defaults.session.refresh_timeout_secs,
            )?
            .set_default("session.login_path", defaults.session.login_path)?
            .set_default("session.dashboard_path", defaults.session.dashboard_path)?
            .set_default("session.public_paths", defaults.session.public_paths)?
            .set_default("session.protected_paths", defaults.session.protected_paths)?
            .set_default("session.cookie_name", defaults.session.cookie_name)?
            .set_default("socket.url", defaults.socket.url)?
            .set_default("socket.reconnect_delay_ms", defaults.socket.reconnect_delay_ms)?
            .set_default(
                "socket.reconnect_delay_max_ms",
                defaults.socket.reconnect_delay_max_ms,
            )?
            .set_default(
                "socket.reconnect_attempts",
                i64::from(defaults.socket.reconnect_attempts),
            )?
            .set_default("logging.service_name", defaults.logging.service_name)?
            .set_default("logging.log_level", defaults.logging.log_level)?)
    }
}
