//! GeoASN CSV converter.
//!
//! Turns an ASN database export into netblock entries for the ISPs the
//! catalogs know about. Two layouts are accepted:
//!
//! - legacy GeoIPASNum: `16777216,16777471,"AS15169 Google Inc."`
//! - GeoLite2 ASN blocks: `1.0.0.0/24,13335,"Cloudflare, Inc."`
//!
//! Rows for unmapped ASNs, header rows and anything unrecognised are skipped.

use ahash::AHashMap;
use flate2::read::GzDecoder;
use ipnet::Ipv4Net;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::table::{RangeEntry, RangeTable};
use crate::IspId;

/// ASN to classification id mapping for the built-in catalogs.
pub const DEFAULT_ASN_MAP: &[(u32, i32)] = &[
    // TelstraClear
    (4768, 0),
    (7714, 0),
    (9901, 0),
    // Orcon
    (17746, 1),
    (55454, 1),
    // Snap!, plus universities reaching the internet through it
    (23655, 2),
    (9432, 2),
    (23905, 2),
    (38319, 2),
    // Slingshot
    (9790, 3),
    // University of Waikato
    (681, 4),
    // Xnet / WorldxChange
    (17435, 5),
    (1221, 10),
    (4739, 11),
    // iiNet and Netspace
    (4802, 12),
    (4854, 12),
    (7474, 13),
    (9443, 14),
    (9543, 15),
    (9556, 16),
    (3741, 30),
    (36943, 31),
    (5713, 32),
    (15169, 50),
    (7922, 60),
    (7018, 61),
];

static LEGACY_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*"?(?P<start>\d+)"?\s*,\s*"?(?P<end>\d+)"?\s*,\s*"?AS(?P<asn>\d+)\s*(?P<org>[^"]*)"?"#)
        .unwrap()
});

static GEOLITE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*"?(?P<net>[0-9.]+/\d+)"?\s*,\s*"?(?P<asn>\d+)"?\s*(?:,\s*"?(?P<org>[^"]*)"?)?"#)
        .unwrap()
});

/// A netblock attributed to a mapped ASN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnBlock {
    /// The resulting table entry
    pub entry: RangeEntry,
    /// Autonomous system number
    pub asn: u32,
    /// Organisation name from the export
    pub organization: String,
}

impl AsnBlock {
    /// Describe the block's origin, e.g. `AS9790 CallPlus Services Limited`.
    pub fn describe(&self) -> String {
        if self.organization.is_empty() {
            format!("AS{}", self.asn)
        } else {
            format!("AS{} {}", self.asn, self.organization)
        }
    }
}

/// GeoASN CSV converter.
pub struct AsnConverter {
    mapping: AHashMap<u32, IspId>,
}

impl AsnConverter {
    /// Create a converter with [`DEFAULT_ASN_MAP`].
    pub fn new() -> Self {
        Self::with_mapping(DEFAULT_ASN_MAP.iter().map(|&(asn, id)| (asn, IspId(id))))
    }

    /// Create a converter with a custom ASN mapping.
    pub fn with_mapping(mapping: impl IntoIterator<Item = (u32, IspId)>) -> Self {
        Self {
            mapping: mapping.into_iter().collect(),
        }
    }

    /// Look up the id for an ASN.
    pub fn id_for(&self, asn: u32) -> Option<IspId> {
        self.mapping.get(&asn).copied()
    }

    /// Convert CSV rows from a reader.
    pub fn convert<R: Read>(&self, reader: R) -> Result<Vec<AsnBlock>> {
        let mut blocks = Vec::new();
        let mut skipped = 0usize;

        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match self.parse_row(&line) {
                Some(Some(block)) => blocks.push(block),
                Some(None) => {}
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {} unrecognised ASN rows", skipped);
        }
        log::info!("Matched {} netblocks to mapped ASNs", blocks.len());

        Ok(blocks)
    }

    /// Convert raw bytes, gunzipping first when `gzip` is set.
    pub fn convert_bytes(&self, data: &[u8], gzip: bool) -> Result<Vec<AsnBlock>> {
        if gzip {
            self.convert(GzDecoder::new(data))
        } else {
            self.convert(data)
        }
    }

    /// Convert a file; `.gz` files are decompressed.
    pub fn convert_path(&self, path: &Path) -> Result<Vec<AsnBlock>> {
        let file = File::open(path)?;
        if is_gzip(&path.to_string_lossy()) {
            self.convert(GzDecoder::new(file))
        } else {
            self.convert(file)
        }
    }

    /// Build a validated range table from converted blocks.
    pub fn to_table(blocks: &[AsnBlock]) -> Result<RangeTable> {
        let entries = blocks.iter().map(|b| b.entry).collect();
        Ok(RangeTable::from_unsorted(entries)?)
    }

    /// Parse one row: `None` if unrecognised, `Some(None)` if the ASN is unmapped.
    fn parse_row(&self, line: &str) -> Option<Option<AsnBlock>> {
        let (low, high, asn, org) = if let Some(caps) = LEGACY_ROW.captures(line) {
            let low: u32 = caps["start"].parse().ok()?;
            let high: u32 = caps["end"].parse().ok()?;
            let asn: u32 = caps["asn"].parse().ok()?;
            (low, high, asn, caps.name("org").map(|m| m.as_str()))
        } else if let Some(caps) = GEOLITE_ROW.captures(line) {
            let net: Ipv4Net = caps["net"].parse().ok()?;
            let asn: u32 = caps["asn"].parse().ok()?;
            (
                u32::from(net.network()),
                u32::from(net.broadcast()),
                asn,
                caps.name("org").map(|m| m.as_str()),
            )
        } else {
            return None;
        };

        let Some(id) = self.id_for(asn) else {
            return Some(None);
        };

        Some(Some(AsnBlock {
            entry: RangeEntry::new(low, high, id),
            asn,
            organization: org.unwrap_or_default().trim().to_string(),
        }))
    }
}

impl Default for AsnConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_gzip(name: &str) -> bool {
    name.to_lowercase().ends_with(".gz")
}

/// Download an ASN export.
///
/// Returns the body and whether it should be treated as gzip (by URL suffix).
pub fn fetch(url: &str) -> Result<(Vec<u8>, bool)> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    log::info!("Downloading {}", url);
    let response = client.get(url).send()?.error_for_status()?;
    let body = response.bytes()?.to_vec();
    log::info!("Downloaded {} bytes", body.len());

    Ok((body, is_gzip(url)))
}
