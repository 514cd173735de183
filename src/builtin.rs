//! Netblocks and catalogs compiled into the binary.

use crate::catalog::{CatalogVersion, Catalogs, IspCatalog};
use crate::classifier::AddressClassifier;
use crate::config::MapperConfig;
use crate::converter::{NetblockParser, Netblocks};
use crate::error::Result;
use crate::mapper::IspMapper;

/// Built-in netblock table source.
pub const NETBLOCKS: &str = include_str!("../data/netblocks.txt");

/// Built-in legacy catalog source.
pub const LEGACY_CATALOG: &str = include_str!("../data/catalog_legacy.yml");

/// Built-in current catalog source.
pub const CURRENT_CATALOG: &str = include_str!("../data/catalog_current.yml");

/// Parse the built-in netblocks.
pub fn builtin_netblocks() -> Result<Netblocks> {
    NetblockParser::parse_str(NETBLOCKS)
}

/// Build a classifier over the built-in netblocks.
pub fn builtin_classifier() -> Result<AddressClassifier> {
    let (ranges, prefixes) = builtin_netblocks()?.into_tables()?;
    Ok(AddressClassifier::new(ranges, prefixes))
}

/// Parse both built-in catalogs.
pub fn builtin_catalogs(config: &MapperConfig) -> Result<Catalogs> {
    Catalogs::new(
        IspCatalog::from_yaml(CatalogVersion::Legacy, LEGACY_CATALOG, config)?,
        IspCatalog::from_yaml(CatalogVersion::Current, CURRENT_CATALOG, config)?,
    )
}

impl IspMapper {
    /// Create a mapper over the built-in netblocks and catalogs.
    pub fn builtin(config: MapperConfig) -> Result<Self> {
        let classifier = builtin_classifier()?;
        let catalogs = builtin_catalogs(&config)?;
        Self::new(config, classifier, catalogs)
    }
}
