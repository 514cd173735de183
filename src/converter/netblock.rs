//! Netblock text format.
//!
//! ```text
//! # comment
//! [family=ipv4]
//! 203.167.128.0 203.167.255.255 0
//! 203.97.0.0/17 0
//! 3412164608 3412197375 7
//! [family=ipv6]
//! 2001:4478: 12
//! ```

use ipnet::Ipv4Net;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::address::{format_dotted_quad, parse_dotted_quad};
use crate::error::{Error, Result};
use crate::table::{PrefixEntry, PrefixTable, RangeEntry, RangeTable};
use crate::IspId;

/// Address family of a netblock section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    /// Parse a family name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ipv4" | "v4" | "inet" => Some(Family::Ipv4),
            "ipv6" | "v6" | "inet6" => Some(Family::Ipv6),
            _ => None,
        }
    }

    /// Get the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entries read from a netblock file, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netblocks {
    /// IPv4 ranges in file order
    pub ranges: Vec<RangeEntry>,
    /// IPv6 prefixes in file order
    pub prefixes: Vec<PrefixEntry>,
}

impl Netblocks {
    /// Validate and build the lookup tables.
    ///
    /// Ranges must already be in ascending order.
    pub fn into_tables(self) -> Result<(RangeTable, PrefixTable)> {
        Ok((
            RangeTable::new(self.ranges)?,
            PrefixTable::new(self.prefixes)?,
        ))
    }
}

/// Netblock text format parser.
pub struct NetblockParser;

impl NetblockParser {
    /// Parse netblocks from a reader.
    ///
    /// Unlike rule lists, netblock files are hand-maintained static data, so
    /// any malformed line is an error naming its line number.
    pub fn parse<R: Read>(reader: R) -> Result<Netblocks> {
        let mut blocks = Netblocks::default();
        let mut family: Option<Family> = None;

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_no = index + 1;
            let line = line?;

            // Remove comments
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => &line,
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                family = Some(parse_section(&line[1..line.len() - 1], line_no)?);
                continue;
            }

            match family {
                Some(Family::Ipv4) => blocks.ranges.push(parse_range(line, line_no)?),
                Some(Family::Ipv6) => blocks.prefixes.push(parse_prefix(line, line_no)?),
                None => {
                    return Err(parse_error(
                        line_no,
                        "entry outside a [family=...] section".to_string(),
                    ))
                }
            }
        }

        Ok(blocks)
    }

    /// Parse netblocks from a string.
    pub fn parse_str(text: &str) -> Result<Netblocks> {
        Self::parse(text.as_bytes())
    }
}

fn parse_error(line: usize, message: String) -> Error {
    Error::Parse { line, message }
}

fn parse_section(content: &str, line_no: usize) -> Result<Family> {
    for part in content.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("family") {
            return Family::parse(value)
                .ok_or_else(|| parse_error(line_no, format!("unknown family {:?}", value.trim())));
        }
    }
    Err(parse_error(line_no, format!("section [{}] has no family", content)))
}

fn parse_id(token: Option<&str>, line_no: usize) -> Result<IspId> {
    let token = token.ok_or_else(|| parse_error(line_no, "missing id".to_string()))?;
    token
        .parse::<IspId>()
        .map_err(|_| parse_error(line_no, format!("invalid id {:?}", token)))
}

fn parse_bound(token: &str, line_no: usize) -> Result<u32> {
    let parsed = if token.contains('.') {
        parse_dotted_quad(token)
    } else {
        token.parse::<u32>().ok()
    };
    parsed.ok_or_else(|| parse_error(line_no, format!("invalid IPv4 address {:?}", token)))
}

fn parse_range(line: &str, line_no: usize) -> Result<RangeEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [cidr, id] if cidr.contains('/') => {
            let net: Ipv4Net = cidr
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid CIDR {:?}", cidr)))?;
            Ok(RangeEntry::from_cidr(net, parse_id(Some(*id), line_no)?))
        }
        [low, high, id] => Ok(RangeEntry::new(
            parse_bound(low, line_no)?,
            parse_bound(high, line_no)?,
            parse_id(Some(*id), line_no)?,
        )),
        _ => Err(parse_error(
            line_no,
            format!("expected \"low high id\" or \"cidr id\", got {:?}", line),
        )),
    }
}

fn parse_prefix(line: &str, line_no: usize) -> Result<PrefixEntry> {
    let mut tokens = line.split_whitespace();
    let prefix = tokens
        .next()
        .ok_or_else(|| parse_error(line_no, "missing prefix".to_string()))?;
    if !prefix.contains(':') {
        return Err(parse_error(line_no, format!("invalid IPv6 prefix {:?}", prefix)));
    }
    let id = parse_id(tokens.next(), line_no)?;
    if tokens.next().is_some() {
        return Err(parse_error(line_no, format!("trailing text in {:?}", line)));
    }
    Ok(PrefixEntry::new(prefix, id))
}

/// Netblock text format writer.
pub struct NetblockWriter<W: Write> {
    out: W,
    family: Option<Family>,
}

impl<W: Write> NetblockWriter<W> {
    /// Create a writer.
    pub fn new(out: W) -> Self {
        Self { out, family: None }
    }

    /// Write a comment line.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "# {}", text)
    }

    fn section(&mut self, family: Family) -> io::Result<()> {
        if self.family != Some(family) {
            if self.family.is_some() {
                writeln!(self.out)?;
            }
            writeln!(self.out, "[family={}]", family)?;
            self.family = Some(family);
        }
        Ok(())
    }

    /// Write an IPv4 range, with an optional trailing comment.
    pub fn range(&mut self, entry: &RangeEntry, note: Option<&str>) -> io::Result<()> {
        self.section(Family::Ipv4)?;
        write!(
            self.out,
            "{} {} {}",
            format_dotted_quad(entry.low),
            format_dotted_quad(entry.high),
            entry.id
        )?;
        match note {
            Some(note) => writeln!(self.out, "  # {}", note),
            None => writeln!(self.out),
        }
    }

    /// Write an IPv6 prefix.
    pub fn prefix(&mut self, entry: &PrefixEntry) -> io::Result<()> {
        self.section(Family::Ipv6)?;
        writeln!(self.out, "{} {}", entry.prefix, entry.id)
    }

    /// Write both tables.
    pub fn tables(&mut self, ranges: &RangeTable, prefixes: &PrefixTable) -> io::Result<()> {
        for entry in ranges.entries() {
            self.range(entry, None)?;
        }
        for entry in prefixes.entries() {
            self.prefix(entry)?;
        }
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = r#"
# Sample
[family=ipv4]
119.224.0.0 119.224.255.255 3   # Slingshot
203.97.0.0/17 0
3412164608 3412197375 7

[family=ipv6]
2001:4478: 12
"#;

    #[test]
    fn test_parse() {
        let blocks = NetblockParser::parse_str(TEXT).unwrap();
        assert_eq!(blocks.ranges.len(), 3);
        assert_eq!(blocks.ranges[0].id, IspId(3));
        assert_eq!(blocks.ranges[1].low, parse_dotted_quad("203.97.0.0").unwrap());
        assert_eq!(blocks.ranges[1].high, parse_dotted_quad("203.97.127.255").unwrap());
        assert_eq!(blocks.ranges[2].low, parse_dotted_quad("203.97.128.0").unwrap());
        assert_eq!(blocks.prefixes, vec![PrefixEntry::new("2001:4478:", 12)]);

        let (ranges, prefixes) = blocks.into_tables().unwrap();
        assert_eq!(ranges.lookup(parse_dotted_quad("203.97.200.1").unwrap()), Some(IspId(7)));
        assert_eq!(prefixes.len(), 1);
    }

    #[test]
    fn test_parse_errors_name_line() {
        let err = NetblockParser::parse_str("[family=ipv4]\n1.2.3.4 1.2.3.300 5\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = NetblockParser::parse_str("1.2.3.0 1.2.3.255 5\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = NetblockParser::parse_str("[family=ipx]\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = NetblockParser::parse_str("[family=ipv6]\n2001:4478: twelve\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_into_tables_rejects_overlap() {
        let blocks = NetblockParser::parse_str(
            "[family=ipv4]\n10.0.0.0/8 1\n10.1.0.0 10.1.255.255 2\n",
        )
        .unwrap();
        assert!(matches!(blocks.into_tables(), Err(Error::Table(_))));
    }

    #[test]
    fn test_writer_output_parses_back() {
        let blocks = NetblockParser::parse_str(TEXT).unwrap();
        let (ranges, prefixes) = blocks.clone().into_tables().unwrap();

        let mut writer = NetblockWriter::new(Vec::new());
        writer.comment("Generated").unwrap();
        writer.tables(&ranges, &prefixes).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert!(text.starts_with("# Generated\n[family=ipv4]\n119.224.0.0 119.224.255.255 3\n"));
        assert!(text.contains("\n\n[family=ipv6]\n2001:4478: 12\n"));
        assert_eq!(NetblockParser::parse_str(&text).unwrap(), blocks);
    }
}
