//! IPv4 range table.

use ipnet::Ipv4Net;

use crate::error::TableError;
use crate::IspId;

/// A single inclusive IPv4 netblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    /// First address of the block
    pub low: u32,
    /// Last address of the block
    pub high: u32,
    /// Classification for every address in the block
    pub id: IspId,
}

impl RangeEntry {
    /// Create a new entry.
    pub fn new(low: u32, high: u32, id: impl Into<IspId>) -> Self {
        Self {
            low,
            high,
            id: id.into(),
        }
    }

    /// Create an entry covering a CIDR block.
    pub fn from_cidr(net: Ipv4Net, id: impl Into<IspId>) -> Self {
        Self::new(
            u32::from(net.network()),
            u32::from(net.broadcast()),
            id,
        )
    }

    /// Check if a key falls inside this block.
    pub fn contains(&self, key: u32) -> bool {
        self.low <= key && key <= self.high
    }
}

/// RangeTable maps IPv4 keys to classification ids.
///
/// Entries are ascending by `low` and pairwise disjoint; [`RangeTable::new`]
/// refuses anything else. Lookups are O(log N), which matters once the
/// generated table reaches the low thousands of entries.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
}

impl RangeTable {
    /// Build a table from entries, validating order and disjointness.
    pub fn new(entries: Vec<RangeEntry>) -> Result<Self, TableError> {
        Self::validate(&entries)?;
        Ok(Self { entries })
    }

    /// Build a table from entries in any order.
    ///
    /// Entries are sorted by `low` first; overlaps are still rejected.
    pub fn from_unsorted(mut entries: Vec<RangeEntry>) -> Result<Self, TableError> {
        entries.sort_by_key(|e| (e.low, e.high));
        Self::new(entries)
    }

    /// Check the ordering invariants over a slice of entries.
    pub fn validate(entries: &[RangeEntry]) -> Result<(), TableError> {
        let mut previous: Option<&RangeEntry> = None;

        for entry in entries {
            if entry.low > entry.high {
                return Err(TableError::InvertedRange {
                    low: entry.low,
                    high: entry.high,
                    id: entry.id,
                });
            }

            if let Some(prev) = previous {
                if entry.low < prev.low {
                    return Err(TableError::Unsorted {
                        previous: prev.low,
                        low: entry.low,
                    });
                }
                if entry.low <= prev.high {
                    return Err(TableError::Overlap {
                        low: entry.low,
                        high: entry.high,
                        previous_high: prev.high,
                    });
                }
            }

            previous = Some(entry);
        }

        Ok(())
    }

    /// Find the id of the block containing `key`.
    ///
    /// Returns `None` when the key falls in a gap between blocks.
    pub fn lookup(&self, key: u32) -> Option<IspId> {
        // The match, if any, lies in entries[low..high].
        let mut low = 0;
        let mut high = self.entries.len();

        while low < high {
            let mid = low + (high - low) / 2;
            let entry = &self.entries[mid];

            if entry.high < key {
                low = mid + 1;
            } else if entry.low > key {
                high = mid;
            } else {
                return Some(entry.id);
            }
        }

        None
    }

    /// Find the id of the block containing `key` by scanning every entry.
    ///
    /// Reference implementation for [`RangeTable::lookup`].
    pub fn lookup_linear(&self, key: u32) -> Option<IspId> {
        self.entries
            .iter()
            .find(|e| e.contains(key))
            .map(|e| e.id)
    }

    /// Get all entries in ascending order.
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// Get the number of blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no blocks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the distinct ids referenced by this table.
    pub fn ids(&self) -> impl Iterator<Item = IspId> + '_ {
        let mut seen = ahash::AHashSet::new();
        self.entries
            .iter()
            .map(|e| e.id)
            .filter(move |id| seen.insert(*id))
    }
}
