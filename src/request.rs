//! Request-time inputs to classification.

use crate::CatalogVersion;

/// Request carries what the HTTP layer knows about one client query.
///
/// # Examples
/// ```
/// use ispmap::{CatalogVersion, Request};
///
/// let request = Request::new("203.167.129.4")
///     .with_country("NZ")
///     .with_user_agent("steam-limiter/0.7.0.3");
/// assert_eq!(request.catalog_version(), CatalogVersion::Legacy);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Transport-level source address
    pub source: String,
    /// Explicit address override (the `ip` query parameter)
    pub alt_source: Option<String>,
    /// Platform-supplied country code
    pub country: Option<String>,
    /// Explicit protocol version (the `v` query parameter)
    pub version: Option<String>,
    /// Client user-agent header
    pub user_agent: Option<String>,
}

impl Request {
    /// Create a request from a source address.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Set the explicit address override.
    pub fn with_alt_source(mut self, address: impl Into<String>) -> Self {
        self.alt_source = Some(address.into());
        self
    }

    /// Set the country code.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the protocol version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the user-agent header.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Get the address to classify.
    pub fn address(&self) -> &str {
        self.alt_source.as_deref().unwrap_or(&self.source)
    }

    /// Check whether the user agent identifies a legacy client.
    pub fn is_legacy_agent(&self) -> bool {
        self.user_agent
            .as_deref()
            .map(CatalogVersion::is_legacy_agent)
            .unwrap_or(false)
    }

    /// Resolve which catalog generation answers this request.
    pub fn catalog_version(&self) -> CatalogVersion {
        CatalogVersion::resolve(self.version.as_deref(), self.is_legacy_agent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_override() {
        let request = Request::new("10.0.0.1");
        assert_eq!(request.address(), "10.0.0.1");

        let request = request.with_alt_source("203.167.129.4");
        assert_eq!(request.address(), "203.167.129.4");
    }

    #[test]
    fn test_catalog_version() {
        let request = Request::new("10.0.0.1");
        assert_eq!(request.catalog_version(), CatalogVersion::Current);

        let legacy = request.clone().with_user_agent("steam-limiter/0.7.0.3");
        assert!(legacy.is_legacy_agent());
        assert_eq!(legacy.catalog_version(), CatalogVersion::Legacy);

        let explicit = legacy.with_version("1");
        assert_eq!(explicit.catalog_version(), CatalogVersion::Current);

        let zero = request.with_version("0");
        assert_eq!(zero.catalog_version(), CatalogVersion::Legacy);
    }
}
