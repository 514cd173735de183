//! IspMapper ties classification, catalogs and assembly together.

use crate::bundle::{self, Bundle};
use crate::catalog::{CatalogVersion, Catalogs, IspCatalog};
use crate::classifier::AddressClassifier;
use crate::config::MapperConfig;
use crate::error::Result;
use crate::request::Request;
use crate::IspId;

/// IspMapper answers "which ISP owns this address, and what rules apply".
///
/// Built once at startup from validated tables and catalogs and never
/// mutated afterwards; share it behind an `Arc` across request handlers.
///
/// # Examples
/// ```
/// use ispmap::{IspMapper, MapperConfig, Request};
///
/// let mapper = IspMapper::builtin(MapperConfig::production()).unwrap();
/// let bundle = mapper.bundle_for(&Request::new("203.167.129.4").with_country("NZ"));
/// assert_eq!(bundle.ispname, "TelstraClear New Zealand");
/// ```
#[derive(Debug, Clone)]
pub struct IspMapper {
    config: MapperConfig,
    classifier: AddressClassifier,
    catalogs: Catalogs,
}

impl IspMapper {
    /// Create a mapper.
    ///
    /// Fails if any id reachable from the netblock tables, or the unknown
    /// id, is missing from either catalog.
    pub fn new(
        config: MapperConfig,
        classifier: AddressClassifier,
        catalogs: Catalogs,
    ) -> Result<Self> {
        let range_ids = classifier.ranges().ids();
        let prefix_ids = classifier.prefixes().entries().iter().map(|e| e.id);
        catalogs.ensure_defined(
            std::iter::once(IspId::UNKNOWN)
                .chain(range_ids)
                .chain(prefix_ids),
        )?;

        log::info!(
            "ISP mapper ready: {} IPv4 ranges, {} IPv6 prefixes, {} legacy / {} current entries{}",
            classifier.ranges().len(),
            classifier.prefixes().len(),
            catalogs.select(CatalogVersion::Legacy).len(),
            catalogs.select(CatalogVersion::Current).len(),
            if config.dev_mode { " (development)" } else { "" }
        );

        Ok(Self {
            config,
            classifier,
            catalogs,
        })
    }

    /// Classify address text.
    pub fn classify(&self, address: &str) -> IspId {
        self.classifier.classify(address, &self.config)
    }

    /// Assemble a bundle for an already-classified id.
    pub fn assemble(
        &self,
        id: IspId,
        country: Option<&str>,
        version: Option<&str>,
        legacy_agent: bool,
    ) -> Bundle {
        let version = CatalogVersion::resolve(version, legacy_agent);
        self.assemble_with(id, country, version)
    }

    /// Assemble a bundle against an explicit catalog generation.
    pub fn assemble_with(&self, id: IspId, country: Option<&str>, version: CatalogVersion) -> Bundle {
        let catalog = self.catalogs.select(version);
        log::debug!("Assembling id {} from {} catalog", id, version);
        bundle::assemble(catalog.entry(id), country, catalog.defaults())
    }

    /// Classify a request and assemble its bundle.
    pub fn bundle_for(&self, request: &Request) -> Bundle {
        let id = self.classify(request.address());
        self.assemble_with(id, request.country.as_deref(), request.catalog_version())
    }

    /// Get the catalog for a generation.
    pub fn catalog(&self, version: CatalogVersion) -> &IspCatalog {
        self.catalogs.select(version)
    }

    /// Get the classifier.
    pub fn classifier(&self) -> &AddressClassifier {
        &self.classifier
    }

    /// Get the configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Defaults, IspEntry};
    use crate::table::{PrefixEntry, PrefixTable, RangeEntry, RangeTable};
    use crate::Error;

    fn catalog(version: CatalogVersion, ids: &[i32]) -> IspCatalog {
        let defaults = Defaults {
            latest: version.name().to_string(),
            download: format!("http://example.com/{}.exe", version),
            proxyfilter: None,
            proxyallow: None,
        };
        let entries = ids.iter().map(|&id| {
            let mut entry = IspEntry::named(format!("{} {}", version, id));
            entry.server = Some("0.0.0.0".to_string());
            (IspId(id), entry)
        });
        IspCatalog::new(version, defaults, entries).unwrap()
    }

    fn classifier() -> AddressClassifier {
        AddressClassifier::new(
            RangeTable::new(vec![RangeEntry::new(100, 200, 3)]).unwrap(),
            PrefixTable::new(vec![PrefixEntry::new("2406:E000:", 2)]).unwrap(),
        )
    }

    #[test]
    fn test_rejects_unmapped_ids() {
        let catalogs = Catalogs::new(
            catalog(CatalogVersion::Legacy, &[-1, 2, 3]),
            catalog(CatalogVersion::Current, &[-1, 3]),
        )
        .unwrap();
        let err = IspMapper::new(MapperConfig::default(), classifier(), catalogs).unwrap_err();
        assert!(matches!(
            err,
            Error::UnmappedIsp {
                id: IspId(2),
                version: CatalogVersion::Current
            }
        ));
    }

    #[test]
    fn test_assemble_by_version() {
        let catalogs = Catalogs::new(
            catalog(CatalogVersion::Legacy, &[-1, 2, 3]),
            catalog(CatalogVersion::Current, &[-1, 2, 3]),
        )
        .unwrap();
        let mapper = IspMapper::new(MapperConfig::default(), classifier(), catalogs).unwrap();

        let id = mapper.classify("0.0.0.150");
        assert_eq!(id, IspId(3));

        let legacy = mapper.assemble(id, None, None, true);
        assert_eq!(legacy.ispname, "legacy 3");
        assert_eq!(legacy.latest, "legacy");

        let current = mapper.assemble(id, Some("NZ"), None, false);
        assert_eq!(current.ispname, "current 3");
        assert_eq!(current.country, "NZ");

        let bundle = mapper.bundle_for(&Request::new("2406:e000:1::1").with_version("0"));
        assert_eq!(bundle.ispname, "legacy 2");
    }
}
