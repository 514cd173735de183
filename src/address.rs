//! Address lookup keys.

use std::fmt;
use std::net::Ipv4Addr;

/// AddressKey is the normalized form used to search the netblock tables.
///
/// IPv4 addresses become a big-endian `u32`. IPv6 addresses are kept as
/// upper-cased text and are only ever matched by literal prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressKey {
    /// Numeric IPv4 key
    V4(u32),
    /// Upper-cased IPv6 text
    V6(String),
}

impl AddressKey {
    /// Parse address text into a lookup key.
    ///
    /// Text containing a colon is treated as IPv6. Anything else must be a
    /// dotted quad of exactly four octets in `0..=255`; returns `None`
    /// otherwise.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.contains(':') {
            return Some(AddressKey::V6(text.to_uppercase()));
        }
        parse_dotted_quad(text).map(AddressKey::V4)
    }

    /// Check whether this is an IPv6 key.
    pub fn is_v6(&self) -> bool {
        matches!(self, AddressKey::V6(_))
    }
}

impl From<u32> for AddressKey {
    fn from(v: u32) -> Self {
        AddressKey::V4(v)
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKey::V4(v) => write!(f, "{}", Ipv4Addr::from(*v)),
            AddressKey::V6(s) => f.write_str(s),
        }
    }
}

/// Convert dotted-quad text to its numeric key.
///
/// Leading zeros are tolerated (`010.1.1.1` is `10.1.1.1`); wrong field
/// counts, empty fields and octets above 255 are rejected.
pub fn parse_dotted_quad(text: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut fields = 0;

    for field in text.split('.') {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u8 = field.parse().ok()?;
        total = (total << 8) | u32::from(octet);
        fields += 1;
        if fields > 4 {
            return None;
        }
    }

    if fields == 4 {
        Some(total)
    } else {
        None
    }
}

/// Format a numeric key as dotted-quad text.
pub fn format_dotted_quad(key: u32) -> String {
    Ipv4Addr::from(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_quad() {
        assert_eq!(parse_dotted_quad("0.0.0.0"), Some(0));
        assert_eq!(parse_dotted_quad("1.2.3.4"), Some(0x01020304));
        assert_eq!(parse_dotted_quad("255.255.255.255"), Some(u32::MAX));
        assert_eq!(parse_dotted_quad("010.001.000.001"), Some(0x0a010001));
    }

    #[test]
    fn test_parse_dotted_quad_rejects_malformed() {
        assert_eq!(parse_dotted_quad(""), None);
        assert_eq!(parse_dotted_quad("1.2.3"), None);
        assert_eq!(parse_dotted_quad("1.2.3.4.5"), None);
        assert_eq!(parse_dotted_quad("1.2.3.256"), None);
        assert_eq!(parse_dotted_quad("1..3.4"), None);
        assert_eq!(parse_dotted_quad("a.b.c.d"), None);
        assert_eq!(parse_dotted_quad("1.2.3.-4"), None);
        assert_eq!(parse_dotted_quad("1.2.3.+4"), None);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(
            AddressKey::parse("203.167.129.4"),
            Some(AddressKey::V4(0xcba78104))
        );
        assert_eq!(
            AddressKey::parse("2001:4478:abcd::1"),
            Some(AddressKey::V6("2001:4478:ABCD::1".to_string()))
        );
        assert_eq!(AddressKey::parse("localhost"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AddressKey::V4(0x7f000001).to_string(), "127.0.0.1");
        assert_eq!(format_dotted_quad(0xcba78104), "203.167.129.4");
    }
}
