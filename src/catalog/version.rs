//! Catalog generations.

use std::fmt;

/// User-agent prefix sent by clients that predate the current catalog.
pub const LEGACY_AGENT_PREFIX: &str = "steam-limiter/";

/// CatalogVersion selects which catalog and defaults answer a request.
///
/// Resolved once per request and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CatalogVersion {
    /// Rules for clients older than 0.7.1.0
    Legacy,
    /// Proxy-shorthand rules for 0.7.1.0 and later
    #[default]
    Current,
}

impl CatalogVersion {
    /// Resolve the catalog for a request.
    ///
    /// An explicit version of `"0"` always selects the legacy catalog. With
    /// no version at all, a legacy user agent selects the legacy catalog.
    /// Anything else selects the current one.
    pub fn resolve(version: Option<&str>, legacy_agent: bool) -> Self {
        match version.map(str::trim) {
            Some("0") => CatalogVersion::Legacy,
            Some(_) => CatalogVersion::Current,
            None if legacy_agent => CatalogVersion::Legacy,
            None => CatalogVersion::Current,
        }
    }

    /// Check whether a user-agent header identifies a legacy client.
    pub fn is_legacy_agent(user_agent: &str) -> bool {
        user_agent.starts_with(LEGACY_AGENT_PREFIX)
    }

    /// Get the internal name of this version.
    pub fn name(&self) -> &'static str {
        match self {
            CatalogVersion::Legacy => "legacy",
            CatalogVersion::Current => "current",
        }
    }

    /// Parse a version name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Some(CatalogVersion::Legacy),
            "current" => Some(CatalogVersion::Current),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
