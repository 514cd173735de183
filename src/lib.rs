//! ispmap - Address-to-ISP classification for the Steam limiter.
//!
//! Given a client's public address, this crate works out which ISP's
//! unmetered content server the client should use, and assembles the rule
//! bundle that tells the limiter how to rewrite Steam content hosts.
//!
//! # Features
//!
//! - **IPv4 ranges**: sorted, disjoint inclusive ranges searched by bisection
//! - **IPv6 prefixes**: textual first-match prefix table
//! - **Two catalog generations**: legacy clients keep their frozen rules
//! - **Proxy shorthand**: ISPs running a plain proxy only name the host
//! - **Dual-ISP probes**: passed through for the client to resolve
//! - **Thread-safe**: the mapper is immutable once built
//!
//! # Quick Start
//!
//! ```
//! use ispmap::{IspMapper, MapperConfig, Request};
//!
//! let mapper = IspMapper::builtin(MapperConfig::production()).unwrap();
//!
//! let request = Request::new("119.224.10.20").with_country("NZ");
//! let bundle = mapper.bundle_for(&request);
//! assert_eq!(bundle.ispname, "Slingshot New Zealand");
//! ```
//!
//! # Catalog Selection
//!
//! A request with `v=0`, or with no version and a `steam-limiter/` user
//! agent, is answered from the legacy catalog. Everything else gets the
//! current catalog. See [`CatalogVersion::resolve`].
//!
//! # Unknown Addresses
//!
//! Classification never fails. Addresses outside every netblock, and
//! malformed input, map to [`IspId::UNKNOWN`], whose catalog entry must
//! exist in both generations.

mod builtin;
mod bundle;
mod classifier;
mod config;
mod error;
mod isp_id;
mod mapper;
mod request;

pub mod address;
pub mod catalog;
pub mod converter;
pub mod table;
pub mod template;

// Re-export core types
pub use error::{Error, Result, TableError};
pub use isp_id::IspId;

// Re-export classification
pub use address::AddressKey;
pub use classifier::AddressClassifier;
pub use config::{MapperConfig, DEFAULT_LOOPBACK_SUBSTITUTE, LOOPBACK};
pub use table::{PrefixEntry, PrefixTable, RangeEntry, RangeTable};

// Re-export catalogs and bundles
pub use bundle::{assemble, Bundle, BundleField, UNKNOWN_COUNTRY};
pub use catalog::{CatalogVersion, Catalogs, Defaults, IspCatalog, IspEntry, ProbeTest};

// Re-export the request-level API
pub use mapper::IspMapper;
pub use request::Request;

// Re-export built-in data
pub use builtin::{builtin_catalogs, builtin_classifier, builtin_netblocks};
