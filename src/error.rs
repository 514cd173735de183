//! Error types for ispmap.
//!
//! Only loading and validating static data can fail. Classification and
//! bundle assembly are total and have no error path.

use thiserror::Error;

use crate::{CatalogVersion, IspId};

/// Error type for ispmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Netblock table invariant violated
    #[error("netblock table error: {0}")]
    Table(#[from] TableError),

    /// Malformed line in a netblock or ASN source file
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Catalog has no entry for the unknown id
    #[error("{0} catalog has no entry for id -1")]
    MissingUnknownEntry(CatalogVersion),

    /// A netblock maps to an id the catalog does not define
    #[error("{version} catalog has no entry for id {id}")]
    UnmappedIsp { id: IspId, version: CatalogVersion },

    /// Invalid address text
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),
}

/// Result type alias for ispmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for netblock table construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    /// Range with low above high
    #[error("inverted range {low}-{high} for id {id}")]
    InvertedRange { low: u32, high: u32, id: IspId },

    /// Entries not sorted by low bound
    #[error("range starting at {low} is out of order after {previous}")]
    Unsorted { previous: u32, low: u32 },

    /// Two ranges share addresses
    #[error("range {low}-{high} overlaps previous range ending at {previous_high}")]
    Overlap {
        low: u32,
        high: u32,
        previous_high: u32,
    },

    /// Empty IPv6 prefix
    #[error("empty IPv6 prefix for id {0}")]
    EmptyPrefix(IspId),

    /// One IPv6 prefix shadows another with a different id
    #[error("IPv6 prefix {shorter} ({shorter_id}) collides with {longer} ({longer_id})")]
    PrefixCollision {
        shorter: String,
        shorter_id: IspId,
        longer: String,
        longer_id: IspId,
    },
}
