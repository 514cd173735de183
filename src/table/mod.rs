//! Immutable netblock tables.
//!
//! - [`RangeTable`]: sorted, disjoint IPv4 ranges searched by binary search
//! - [`PrefixTable`]: literal IPv6 text prefixes scanned in order
//!
//! Both are built once at startup and never mutated, so they can be shared
//! across threads without locking.

mod prefix;
mod range;

pub use prefix::{PrefixEntry, PrefixTable};
pub use range::{RangeEntry, RangeTable};
