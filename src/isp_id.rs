//! Classification ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IspId identifies which catalog entry an address belongs to.
///
/// Ids are stable slot numbers shared by every catalog generation. Gaps
/// between them are reserved for future entries. `-1` is the unknown id and
/// is a valid classification, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IspId(pub i32);

impl IspId {
    /// No known ISP covers the address.
    pub const UNKNOWN: IspId = IspId(-1);

    /// Check whether this is the unknown id.
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl Default for IspId {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl From<i32> for IspId {
    fn from(v: i32) -> Self {
        IspId(v)
    }
}

impl fmt::Display for IspId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IspId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map(IspId)
    }
}
