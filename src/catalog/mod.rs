//! ISP catalogs.
//!
//! A catalog is an immutable table from classification id to [`IspEntry`],
//! paired with the [`Defaults`] for its generation. Two generations coexist
//! and are chosen per request through [`CatalogVersion`].

mod entry;
mod version;

pub use entry::{Defaults, IspEntry, ProbeOverride, ProbeTest};
pub use version::{CatalogVersion, LEGACY_AGENT_PREFIX};

pub(crate) use entry::non_empty;

use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::MapperConfig;
use crate::error::{Error, Result};
use crate::{template, IspId};

/// On-disk layout of a catalog document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    defaults: Defaults,
    isps: BTreeMap<IspId, IspEntry>,
}

/// IspCatalog resolves classification ids to entries.
///
/// Always holds an entry for [`IspId::UNKNOWN`], which also answers ids the
/// catalog does not define.
#[derive(Debug, Clone)]
pub struct IspCatalog {
    version: CatalogVersion,
    defaults: Defaults,
    entries: AHashMap<IspId, IspEntry>,
    unknown: IspEntry,
}

impl IspCatalog {
    /// Create a catalog from entries.
    ///
    /// Fails if no entry is defined for the unknown id.
    pub fn new(
        version: CatalogVersion,
        defaults: Defaults,
        entries: impl IntoIterator<Item = (IspId, IspEntry)>,
    ) -> Result<Self> {
        let entries: AHashMap<IspId, IspEntry> = entries.into_iter().collect();
        let unknown = entries
            .get(&IspId::UNKNOWN)
            .cloned()
            .ok_or(Error::MissingUnknownEntry(version))?;

        for text in [&defaults.proxyfilter, &defaults.proxyallow].into_iter().flatten() {
            if !text.is_empty() && !template::references(text, "proxy") {
                log::warn!(
                    "{} catalog default template {:?} never mentions %(proxy)s",
                    version,
                    text
                );
            }
        }

        for (id, entry) in &entries {
            if yields_empty_rule(entry, &defaults) {
                log::warn!(
                    "{} catalog entry {} ({}) yields an empty filter rule",
                    version,
                    id,
                    entry.name
                );
            }
        }

        Ok(Self {
            version,
            defaults,
            entries,
            unknown,
        })
    }

    /// Parse a catalog from a YAML document.
    ///
    /// `%(base)s` in the default download URL is replaced by the configured
    /// service base URL.
    pub fn from_yaml(version: CatalogVersion, text: &str, config: &MapperConfig) -> Result<Self> {
        let doc: CatalogDocument = serde_yaml::from_str(text)?;

        let mut defaults = doc.defaults;
        let base = [("base", config.self_base.as_str())];
        defaults.download = template::expand(&defaults.download, &base);

        Self::new(version, defaults, doc.isps)
    }

    /// Get the entry for an id, if the catalog defines it.
    pub fn get(&self, id: IspId) -> Option<&IspEntry> {
        self.entries.get(&id)
    }

    /// Get the entry for an id, falling back to the unknown entry.
    pub fn entry(&self, id: IspId) -> &IspEntry {
        match self.entries.get(&id) {
            Some(entry) => entry,
            None => {
                log::error!("{} catalog has no entry for id {}", self.version, id);
                &self.unknown
            }
        }
    }

    /// Check if the catalog defines an id.
    pub fn contains(&self, id: IspId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Get the defaults for this generation.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Get the generation of this catalog.
    pub fn version(&self) -> CatalogVersion {
        self.version
    }

    /// Get all defined ids in ascending order.
    pub fn ids(&self) -> Vec<IspId> {
        let mut ids: Vec<IspId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no entries.
    ///
    /// Never true for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check if an entry assembles to an empty filter rule.
///
/// An empty `proxy` counts as absent, as it does during assembly.
fn yields_empty_rule(entry: &IspEntry, defaults: &Defaults) -> bool {
    let filter = entry.proxyfilter.as_ref().or(defaults.proxyfilter.as_ref());
    let allow = entry.proxyallow.as_ref().or(defaults.proxyallow.as_ref());
    let shorthand = non_empty(&entry.proxy).is_some()
        && filter.map_or(false, |s| !s.is_empty())
        && allow.map_or(false, |s| !s.is_empty());
    !shorthand && !entry.has_literal_rule()
}

/// Both catalog generations.
#[derive(Debug, Clone)]
pub struct Catalogs {
    legacy: IspCatalog,
    current: IspCatalog,
}

impl Catalogs {
    /// Pair a legacy and a current catalog.
    pub fn new(legacy: IspCatalog, current: IspCatalog) -> Result<Self> {
        if legacy.version() != CatalogVersion::Legacy {
            return Err(Error::Config(format!(
                "expected legacy catalog, got {}",
                legacy.version()
            )));
        }
        if current.version() != CatalogVersion::Current {
            return Err(Error::Config(format!(
                "expected current catalog, got {}",
                current.version()
            )));
        }
        Ok(Self { legacy, current })
    }

    /// Get the catalog for a generation.
    pub fn select(&self, version: CatalogVersion) -> &IspCatalog {
        match version {
            CatalogVersion::Legacy => &self.legacy,
            CatalogVersion::Current => &self.current,
        }
    }

    /// Check that every id is defined by both generations.
    pub fn ensure_defined(&self, ids: impl IntoIterator<Item = IspId>) -> Result<()> {
        for id in ids {
            for catalog in [&self.legacy, &self.current] {
                if !catalog.contains(id) {
                    return Err(Error::UnmappedIsp {
                        id,
                        version: catalog.version(),
                    });
                }
            }
        }
        Ok(())
    }
}
