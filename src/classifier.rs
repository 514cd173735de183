//! Address classification.

use crate::address::AddressKey;
use crate::config::{MapperConfig, LOOPBACK};
use crate::table::{PrefixTable, RangeTable};
use crate::IspId;

/// AddressClassifier maps source addresses to classification ids.
///
/// Classification always succeeds: addresses outside every netblock, and
/// text that is not a valid address, yield [`IspId::UNKNOWN`].
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    ranges: RangeTable,
    prefixes: PrefixTable,
}

impl AddressClassifier {
    /// Create a classifier over the given tables.
    pub fn new(ranges: RangeTable, prefixes: PrefixTable) -> Self {
        Self { ranges, prefixes }
    }

    /// Classify address text.
    ///
    /// When `dev_mode` is set the loopback literal is replaced by the
    /// configured substitute so local testing still hits a real catalog
    /// entry.
    pub fn classify(&self, address: &str, config: &MapperConfig) -> IspId {
        let address = address.trim();
        let address = if config.dev_mode && address == LOOPBACK {
            log::debug!(
                "Substituting {} for loopback in development mode",
                config.loopback_substitute
            );
            config.loopback_substitute.as_str()
        } else {
            address
        };

        match AddressKey::parse(address) {
            Some(key) => self.classify_key(&key),
            None => {
                log::warn!("Malformed address {:?}", address);
                IspId::UNKNOWN
            }
        }
    }

    /// Classify an already-normalized key.
    pub fn classify_key(&self, key: &AddressKey) -> IspId {
        let found = match key {
            AddressKey::V4(v4) => self.ranges.lookup(*v4),
            AddressKey::V6(text) => self.prefixes.lookup(text),
        };

        match found {
            Some(id) => id,
            None => {
                let family = if key.is_v6() { "IPv6" } else { "IPv4" };
                log::warn!("Unknown mapping for {} address {}", family, key);
                IspId::UNKNOWN
            }
        }
    }

    /// Classify a numeric IPv4 key.
    pub fn classify_v4(&self, key: u32) -> IspId {
        self.classify_key(&AddressKey::V4(key))
    }

    /// Get the IPv4 range table.
    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    /// Get the IPv6 prefix table.
    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }
}
