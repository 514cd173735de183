//! IPv6 prefix table.

use crate::error::TableError;
use crate::IspId;

/// A literal IPv6 text prefix, such as `2001:4478:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    /// Upper-cased prefix text
    pub prefix: String,
    /// Classification for addresses starting with the prefix
    pub id: IspId,
}

impl PrefixEntry {
    /// Create a new entry; the prefix is upper-cased.
    pub fn new(prefix: &str, id: impl Into<IspId>) -> Self {
        Self {
            prefix: prefix.trim().to_uppercase(),
            id: id.into(),
        }
    }
}

/// PrefixTable classifies IPv6 addresses by textual prefix.
///
/// No integer expansion of the address is done: `2001:4478:ABCD::1` matches
/// `2001:4478:` but the compressed form `2001:4478::1` does too. The first
/// matching entry wins, so construction rejects tables where one prefix is a
/// prefix of another with a different id.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    entries: Vec<PrefixEntry>,
}

impl PrefixTable {
    /// Build a table, rejecting empty and colliding prefixes.
    pub fn new(entries: Vec<PrefixEntry>) -> Result<Self, TableError> {
        Self::validate(&entries)?;
        Ok(Self { entries })
    }

    /// Check that no two prefixes with different ids can match the same address.
    pub fn validate(entries: &[PrefixEntry]) -> Result<(), TableError> {
        for (i, a) in entries.iter().enumerate() {
            if a.prefix.is_empty() {
                return Err(TableError::EmptyPrefix(a.id));
            }

            for b in &entries[i + 1..] {
                let (shorter, longer) = if a.prefix.len() <= b.prefix.len() {
                    (a, b)
                } else {
                    (b, a)
                };

                if !longer.prefix.starts_with(&shorter.prefix) {
                    continue;
                }

                if shorter.id != longer.id {
                    return Err(TableError::PrefixCollision {
                        shorter: shorter.prefix.clone(),
                        shorter_id: shorter.id,
                        longer: longer.prefix.clone(),
                        longer_id: longer.id,
                    });
                }

                log::warn!(
                    "IPv6 prefix {} is redundant with {} (both id {})",
                    longer.prefix,
                    shorter.prefix,
                    shorter.id
                );
            }
        }

        Ok(())
    }

    /// Find the id for upper-cased IPv6 text.
    pub fn lookup(&self, address: &str) -> Option<IspId> {
        self.entries
            .iter()
            .find(|e| address.starts_with(e.prefix.as_str()))
            .map(|e| e.id)
    }

    /// Get all entries in table order.
    pub fn entries(&self) -> &[PrefixEntry] {
        &self.entries
    }

    /// Get the number of prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no prefixes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
