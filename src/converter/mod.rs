//! Netblock data converters.
//!
//! - [`NetblockParser`] / [`NetblockWriter`]: the sectioned text format the
//!   built-in tables are authored in
//! - [`AsnConverter`]: GeoASN CSV exports to netblock entries

mod asn;
mod netblock;

pub use asn::{fetch, AsnBlock, AsnConverter, DEFAULT_ASN_MAP};
pub use netblock::{Family, NetblockParser, NetblockWriter, Netblocks};
