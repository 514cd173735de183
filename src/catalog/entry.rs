//! Catalog record types.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Version-wide values merged underneath every catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Latest client version string
    pub latest: String,
    /// Download URL for the latest installer
    pub download: String,
    /// Filter-rule template for proxy shorthand entries
    #[serde(default)]
    pub proxyfilter: Option<String>,
    /// Allow-rule template for proxy shorthand entries
    #[serde(default)]
    pub proxyallow: Option<String>,
}

/// IspEntry describes what one classification id resolves to.
///
/// Either `proxy` names a hostname that the `proxyfilter`/`proxyallow`
/// templates expand around, or `filter`/`allow` carry literal rule text. An
/// entry with neither falls back to its plain `server` address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IspEntry {
    /// Human-readable ISP name
    pub name: String,
    /// Default origin server address
    #[serde(default)]
    pub server: Option<String>,
    /// Unmetered proxy hostname
    #[serde(default)]
    pub proxy: Option<String>,
    /// Literal filter rule
    #[serde(default)]
    pub filter: Option<String>,
    /// Literal allow rule
    #[serde(default)]
    pub allow: Option<String>,
    /// Per-entry filter template, overriding the defaults
    #[serde(default)]
    pub proxyfilter: Option<String>,
    /// Per-entry allow template, overriding the defaults
    #[serde(default)]
    pub proxyallow: Option<String>,
    /// Dual-ISP probe passed through to the client
    #[serde(default)]
    pub test: Option<ProbeTest>,
}

impl IspEntry {
    /// Create an entry with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: None,
            proxy: None,
            filter: None,
            allow: None,
            proxyfilter: None,
            proxyallow: None,
            test: None,
        }
    }

    /// Check whether the entry can produce a non-empty filter rule on its own.
    pub fn has_literal_rule(&self) -> bool {
        non_empty(&self.filter).is_some() || non_empty(&self.server).is_some()
    }
}

/// ProbeTest asks the client to run a secondary connectivity probe.
///
/// Several retail ISPs share one upstream netblock, so the server cannot tell
/// them apart. The client runs `probe` and, if the result code has an entry
/// in `outcomes`, applies those overrides locally.
///
/// Serializes to the client wire shape
/// `{"report": true, "<probe>": {"<code>": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeTest {
    /// Probe description, e.g. `steam.wa.co.za icmp *.wa.co.za`
    pub probe: String,
    /// Ask the client to report the probe result back
    #[serde(default)]
    pub report: bool,
    /// Overrides keyed by probe result code
    #[serde(default)]
    pub outcomes: BTreeMap<i32, ProbeOverride>,
}

impl ProbeTest {
    /// Get the overrides for a probe result code.
    pub fn outcome(&self, code: i32) -> Option<&ProbeOverride> {
        self.outcomes.get(&code)
    }
}

impl Serialize for ProbeTest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("report", &self.report)?;
        map.serialize_entry(&self.probe, &self.outcomes)?;
        map.end()
    }
}

/// Fields a probe outcome replaces in the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeOverride {
    /// Replacement ISP name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ispname: Option<String>,
    /// Replacement filter rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterrule: Option<String>,
    /// Replacement allow rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
