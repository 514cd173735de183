//! Configuration bundle assembly.

use serde::Serialize;
use std::fmt;

use crate::catalog::{non_empty, Defaults, IspEntry, ProbeTest};
use crate::template;

/// Country reported when the platform supplies none.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Bundle is the per-request configuration handed back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Latest client version
    pub latest: String,
    /// Installer download URL
    pub download: String,
    /// ISP display name
    pub ispname: String,
    /// Client country code, or `Unknown`
    pub country: String,
    /// Host rewrite rule
    pub filterrule: String,
    /// Allow-list rule
    pub allow: String,
    /// Proxy hostname the rules were expanded around
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Dual-ISP probe for the client to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<ProbeTest>,
}

impl Bundle {
    /// Get a single text field.
    pub fn get(&self, field: BundleField) -> &str {
        match field {
            BundleField::Latest => &self.latest,
            BundleField::Download => &self.download,
            BundleField::IspName => &self.ispname,
            BundleField::Country => &self.country,
            BundleField::FilterRule => &self.filterrule,
            BundleField::Allow => &self.allow,
        }
    }

    /// Apply the client-side result of the dual-ISP probe.
    ///
    /// Overrides from the matching outcome replace `ispname`, `filterrule`
    /// and `allow`. The probe is consumed either way.
    pub fn resolve_probe(&self, code: i32) -> Bundle {
        let mut resolved = self.clone();
        let Some(test) = resolved.test.take() else {
            return resolved;
        };

        if let Some(outcome) = test.outcome(code) {
            if let Some(ref name) = outcome.ispname {
                resolved.ispname = name.clone();
            }
            if let Some(ref rule) = outcome.filterrule {
                resolved.filterrule = rule.clone();
            }
            if let Some(ref allow) = outcome.allow {
                resolved.allow = allow.clone();
            }
        }

        resolved
    }
}

/// Individually addressable bundle fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleField {
    Latest,
    Download,
    IspName,
    Country,
    FilterRule,
    Allow,
}

impl BundleField {
    /// Parse a field from its JSON key.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Some(BundleField::Latest),
            "download" => Some(BundleField::Download),
            "ispname" => Some(BundleField::IspName),
            "country" => Some(BundleField::Country),
            "filterrule" => Some(BundleField::FilterRule),
            "allow" => Some(BundleField::Allow),
            _ => None,
        }
    }

    /// Get the JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleField::Latest => "latest",
            BundleField::Download => "download",
            BundleField::IspName => "ispname",
            BundleField::Country => "country",
            BundleField::FilterRule => "filterrule",
            BundleField::Allow => "allow",
        }
    }
}

impl fmt::Display for BundleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assemble the bundle for a catalog entry.
///
/// Proxy shorthand wins when the entry names a proxy and both templates
/// resolve (entry first, then defaults) to non-empty text. Otherwise the
/// literal `filter` (or `server`) and `allow` fields are used. Any probe is
/// passed through unchanged.
pub fn assemble(entry: &IspEntry, country: Option<&str>, defaults: &Defaults) -> Bundle {
    let proxyfilter = entry
        .proxyfilter
        .as_deref()
        .or(defaults.proxyfilter.as_deref())
        .filter(|s| !s.is_empty());
    let proxyallow = entry
        .proxyallow
        .as_deref()
        .or(defaults.proxyallow.as_deref())
        .filter(|s| !s.is_empty());
    let proxy = non_empty(&entry.proxy);

    let (filterrule, allow, proxy) = match (proxy, proxyfilter, proxyallow) {
        (Some(proxy), Some(filter), Some(allow)) => {
            let vars = [("proxy", proxy)];
            (
                template::expand(filter, &vars),
                template::expand(allow, &vars),
                Some(proxy.to_string()),
            )
        }
        _ => (
            non_empty(&entry.filter)
                .or(entry.server.as_deref())
                .unwrap_or_default()
                .to_string(),
            non_empty(&entry.allow).unwrap_or_default().to_string(),
            None,
        ),
    };

    Bundle {
        latest: defaults.latest.clone(),
        download: defaults.download.clone(),
        ispname: entry.name.clone(),
        country: country
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY)
            .to_string(),
        filterrule,
        allow,
        proxy,
        test: entry.test.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProbeOverride;
    use std::collections::BTreeMap;

    fn defaults() -> Defaults {
        Defaults {
            latest: "0.7.1.0".to_string(),
            download: "http://example.com/steamlimit.exe".to_string(),
            proxyfilter: Some("content*.steampowered.com=%(proxy)s".to_string()),
            proxyallow: Some("//%(proxy)s=*".to_string()),
        }
    }

    #[test]
    fn test_proxy_shorthand() {
        let mut entry = IspEntry::named("Internode Australia");
        entry.proxy = Some("x.example.com".to_string());
        entry.filter = Some("literal-filter".to_string());

        let bundle = assemble(&entry, Some("AU"), &defaults());
        assert_eq!(bundle.filterrule, "content*.steampowered.com=x.example.com");
        assert_eq!(bundle.allow, "//x.example.com=*");
        assert_ne!(bundle.filterrule, "literal-filter");
        assert_eq!(bundle.proxy.as_deref(), Some("x.example.com"));
        assert_eq!(bundle.country, "AU");
        assert_eq!(bundle.latest, "0.7.1.0");
    }

    #[test]
    fn test_entry_templates_override_defaults() {
        let mut entry = IspEntry::named("Custom");
        entry.proxy = Some("p.example.com".to_string());
        entry.proxyallow = Some("//*.example.com=%(proxy)s".to_string());

        let bundle = assemble(&entry, None, &defaults());
        assert_eq!(bundle.filterrule, "content*.steampowered.com=p.example.com");
        assert_eq!(bundle.allow, "//*.example.com=p.example.com");
    }

    #[test]
    fn test_proxy_without_templates_falls_back() {
        let mut entry = IspEntry::named("Legacy proxy");
        entry.proxy = Some("p.example.com".to_string());
        entry.server = Some("10.0.0.1".to_string());

        let mut no_templates = defaults();
        no_templates.proxyfilter = None;

        let bundle = assemble(&entry, None, &no_templates);
        assert_eq!(bundle.filterrule, "10.0.0.1");
        assert_eq!(bundle.allow, "");
        assert!(bundle.proxy.is_none());
    }

    #[test]
    fn test_empty_entry_template_disables_shorthand() {
        let mut entry = IspEntry::named("Opt out");
        entry.proxy = Some("p.example.com".to_string());
        entry.proxyfilter = Some(String::new());
        entry.filter = Some("*:27030=p.example.com".to_string());

        let bundle = assemble(&entry, None, &defaults());
        assert_eq!(bundle.filterrule, "*:27030=p.example.com");
    }

    #[test]
    fn test_literal_fields() {
        let mut entry = IspEntry::named("iPrimus Australia");
        entry.filter = Some("content*.steampowered.com=valve217.cs.steampowered.com".to_string());
        entry.allow = Some("//*.steampowered.com=*".to_string());
        entry.server = Some("0.0.0.0".to_string());

        let bundle = assemble(&entry, Some(""), &defaults());
        assert_eq!(
            bundle.filterrule,
            "content*.steampowered.com=valve217.cs.steampowered.com"
        );
        assert_eq!(bundle.allow, "//*.steampowered.com=*");
        assert_eq!(bundle.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_server_fallback_and_empty() {
        let mut entry = IspEntry::named("Server only");
        entry.server = Some("119.224.142.146".to_string());
        entry.filter = Some(String::new());
        assert_eq!(assemble(&entry, None, &defaults()).filterrule, "119.224.142.146");

        let bare = IspEntry::named("Bare");
        let bundle = assemble(&bare, None, &defaults());
        assert_eq!(bundle.filterrule, "");
        assert_eq!(bundle.allow, "");
    }

    fn probe_entry() -> IspEntry {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            0,
            ProbeOverride {
                ispname: Some("WebAfrica/MWeb dual ISP".to_string()),
                filterrule: Some("content*.steampowered.com=steam.wa.co.za".to_string()),
                allow: None,
            },
        );

        let mut entry = IspEntry::named("MWeb, South Africa");
        entry.server = Some("196.28.69.201".to_string());
        entry.allow = Some("//196.28.69.201=*".to_string());
        entry.test = Some(ProbeTest {
            probe: "steam.wa.co.za icmp *.wa.co.za".to_string(),
            report: true,
            outcomes,
        });
        entry
    }

    #[test]
    fn test_probe_passthrough_and_resolve() {
        let bundle = assemble(&probe_entry(), Some("ZA"), &defaults());
        assert_eq!(bundle.test, probe_entry().test);

        let resolved = bundle.resolve_probe(0);
        assert_eq!(resolved.ispname, "WebAfrica/MWeb dual ISP");
        assert_eq!(resolved.filterrule, "content*.steampowered.com=steam.wa.co.za");
        assert_eq!(resolved.allow, "//196.28.69.201=*");
        assert!(resolved.test.is_none());

        let unmatched = bundle.resolve_probe(1);
        assert_eq!(unmatched.ispname, "MWeb, South Africa");
        assert!(unmatched.test.is_none());
    }

    #[test]
    fn test_idempotent() {
        let a = assemble(&probe_entry(), Some("ZA"), &defaults());
        let b = assemble(&probe_entry(), Some("ZA"), &defaults());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_json_omits_absent_optionals() {
        let bundle = assemble(&IspEntry::named("Bare"), None, &defaults());
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("proxy").is_none());
        assert!(json.get("test").is_none());
        assert!(json.get("proxyfilter").is_none());
        assert_eq!(json["ispname"], serde_json::json!("Bare"));
    }

    #[test]
    fn test_field_access() {
        let bundle = assemble(&probe_entry(), None, &defaults());
        assert_eq!(bundle.get(BundleField::IspName), "MWeb, South Africa");
        assert_eq!(bundle.get(BundleField::Latest), "0.7.1.0");
        assert_eq!(BundleField::parse("FilterRule"), Some(BundleField::FilterRule));
        assert_eq!(BundleField::parse("proxy"), None);
        assert_eq!(BundleField::Allow.to_string(), "allow");
    }
}
