//! Process-level configuration.

/// Loopback literal that triggers the development substitution.
pub const LOOPBACK: &str = "127.0.0.1";

/// Real-world address used in place of loopback during development.
///
/// Sits inside a TelstraClear New Zealand netblock.
pub const DEFAULT_LOOPBACK_SUBSTITUTE: &str = "203.167.129.4";

/// Public base URL of the service.
pub const PRODUCTION_BASE: &str = "http://steam-limiter.appspot.com";

/// Base URL of a local development server.
pub const DEVELOPMENT_BASE: &str = "http://localhost:8080";

/// Configuration for an [`IspMapper`](crate::IspMapper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Running in a development or test environment
    pub dev_mode: bool,
    /// Address classified instead of loopback when `dev_mode` is set
    pub loopback_substitute: String,
    /// Base URL substituted for `%(base)s` in catalog defaults
    pub self_base: String,
}

impl MapperConfig {
    /// Create a production configuration.
    pub fn production() -> Self {
        Self {
            dev_mode: false,
            loopback_substitute: DEFAULT_LOOPBACK_SUBSTITUTE.to_string(),
            self_base: PRODUCTION_BASE.to_string(),
        }
    }

    /// Create a development configuration.
    pub fn development() -> Self {
        Self {
            dev_mode: true,
            loopback_substitute: DEFAULT_LOOPBACK_SUBSTITUTE.to_string(),
            self_base: DEVELOPMENT_BASE.to_string(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Development mode is on when `SERVER_SOFTWARE` contains `Development`
    /// or `ISPMAP_DEV` is `1`/`true`.
    pub fn from_env() -> Self {
        let server_software = std::env::var("SERVER_SOFTWARE").ok();
        let forced = std::env::var("ISPMAP_DEV").ok();
        Self::from_vars(server_software.as_deref(), forced.as_deref())
    }

    fn from_vars(server_software: Option<&str>, forced: Option<&str>) -> Self {
        let forced = forced
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let development = server_software
            .map(|s| s.contains("Development"))
            .unwrap_or(false);

        if forced || development {
            Self::development()
        } else {
            Self::production()
        }
    }

    /// Override the loopback substitute address.
    pub fn with_loopback_substitute(mut self, address: impl Into<String>) -> Self {
        self.loopback_substitute = address.into();
        self
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::production()
    }
}
