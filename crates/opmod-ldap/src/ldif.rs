//! LDIF content records (RFC 2849)
//!
//! Supports line folding, comments, `version:` headers, base64 (`::`) values
//! and empty values. URL values (`:<`) and change records are rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::attrs::Attributes;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("LDIF line {line}: {message}")]
pub struct LdifError {
    pub line: usize,
    pub message: String,
}

impl LdifError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// One entry: its DN and attributes in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdifRecord {
    pub dn: String,
    pub attrs: Attributes,
}

struct Line {
    number: usize,
    text: String,
}

/// Parse LDIF content into entry records.
pub fn parse_ldif(input: &str) -> Result<Vec<LdifRecord>, LdifError> {
    let mut records = Vec::new();

    for block in split_records(unfold(input)) {
        if let Some(record) = parse_record(&block)? {
            records.push(record);
        }
    }

    Ok(records)
}

/// Whether the content has at least one `dn:` line, i.e. is LDIF rather than
/// a bare list of DNs.
pub fn contains_dn_line(input: &str) -> bool {
    input.lines().any(|line| {
        line.get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("dn:"))
    })
}

/// Join folded lines and drop comments. Blank lines are kept as separators.
fn unfold(input: &str) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        if raw.trim().is_empty() {
            lines.push(Line {
                number: idx + 1,
                text: String::new(),
            });
            continue;
        }

        if let Some(continuation) = raw.strip_prefix(' ') {
            if let Some(last) = lines.last_mut().filter(|l| !l.text.is_empty()) {
                last.text.push_str(continuation);
                continue;
            }
        }

        lines.push(Line {
            number: idx + 1,
            text: raw.to_string(),
        });
    }

    lines.retain(|l| !l.text.starts_with('#'));
    lines
}

fn split_records(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in lines {
        if line.text.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_record(block: &[Line]) -> Result<Option<LdifRecord>, LdifError> {
    let mut lines = block.iter().peekable();

    while let Some(line) = lines.peek() {
        let (key, _) = parse_line(line)?;
        if key.eq_ignore_ascii_case("version") {
            lines.next();
        } else {
            break;
        }
    }

    let Some(first) = lines.next() else {
        return Ok(None);
    };

    let (key, value) = parse_line(first)?;
    if !key.eq_ignore_ascii_case("dn") {
        return Err(LdifError::new(
            first.number,
            format!("expected `dn:` but found `{}:`", key),
        ));
    }
    let dn = String::from_utf8(value)
        .map_err(|_| LdifError::new(first.number, "dn is not valid UTF-8"))?;
    let dn = dn.trim().to_string();
    if dn.is_empty() {
        return Err(LdifError::new(first.number, "empty dn"));
    }

    let mut attrs = Attributes::new();
    for line in lines {
        let (key, value) = parse_line(line)?;
        if key.eq_ignore_ascii_case("changetype") {
            return Err(LdifError::new(
                line.number,
                "change records are not supported, describe the desired entry instead",
            ));
        }
        if key.eq_ignore_ascii_case("dn") {
            return Err(LdifError::new(
                line.number,
                "unexpected `dn:`, records must be separated by a blank line",
            ));
        }
        attrs.push_value(&key, value);
    }

    Ok(Some(LdifRecord { dn, attrs }))
}

fn parse_line(line: &Line) -> Result<(String, Vec<u8>), LdifError> {
    let (key, rest) = line
        .text
        .split_once(':')
        .ok_or_else(|| LdifError::new(line.number, "expected `attribute: value`"))?;

    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ';' | '.'))
    {
        return Err(LdifError::new(
            line.number,
            format!("invalid attribute description `{}`", key),
        ));
    }

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        STANDARD.decode(encoded.trim()).map_err(|e| {
            LdifError::new(line.number, format!("invalid base64 value of `{}`: {}", key, e))
        })?
    } else if rest.starts_with('<') {
        return Err(LdifError::new(
            line.number,
            format!("URL value of `{}` is not supported", key),
        ));
    } else {
        rest.trim_start().as_bytes().to_vec()
    };

    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "\
version: 1

# organisation root
dn: dc=encom,dc=com
objectClass: top
objectClass: domain
dc: encom

dn: cn=flynn,ou=People,dc=encom,dc=com
objectClass: person
cn: flynn
description: a very long description that
  continues on the next line
userPassword:: c2VjcmV0
sn:
";

    #[test]
    fn test_parse_records() {
        let records = parse_ldif(BASE).unwrap();
        assert_eq!(records.len(), 2);

        let root = &records[0];
        assert_eq!(root.dn, "dc=encom,dc=com");
        assert_eq!(root.attrs.get("objectclass").unwrap().values.len(), 2);

        let flynn = &records[1];
        assert_eq!(
            flynn.attrs.get("description").unwrap().values[0],
            b"a very long description that continues on the next line".to_vec()
        );
        assert_eq!(flynn.attrs.get("userPassword").unwrap().values[0], b"secret".to_vec());
        assert_eq!(flynn.attrs.get("sn").unwrap().values[0], Vec::<u8>::new());
    }

    #[test]
    fn test_crlf_and_folded_comment() {
        let records = parse_ldif("# a comment\r\n  folded into it\r\ndn: dc=x\r\ndc: x\r\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attrs.len(), 1);
    }

    #[test]
    fn test_base64_dn() {
        // "dc=encom" in base64
        let records = parse_ldif("dn:: ZGM9ZW5jb20=\ndc: encom\n").unwrap();
        assert_eq!(records[0].dn, "dc=encom");
    }

    #[test]
    fn test_missing_dn() {
        let err = parse_ldif("objectClass: top\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("expected `dn:`"));
    }

    #[test]
    fn test_change_records_rejected() {
        let err = parse_ldif("dn: cn=x\nchangetype: modify\nreplace: cn\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_url_values_rejected() {
        let err = parse_ldif("dn: cn=x\njpegPhoto:< file:///tmp/a.jpg\n").unwrap_err();
        assert!(err.message.contains("URL value"));
    }

    #[test]
    fn test_missing_separator_rejected() {
        assert!(parse_ldif("dn: cn=a\ncn: a\ndn: cn=b\n").is_err());
    }

    #[test]
    fn test_only_version_header() {
        assert!(parse_ldif("version: 1\n").unwrap().is_empty());
        assert!(parse_ldif("").unwrap().is_empty());
    }

    #[test]
    fn test_contains_dn_line() {
        assert!(contains_dn_line("DN: cn=a\n"));
        assert!(!contains_dn_line("cn=clue,ou=People,dc=encom,dc=com\n"));
    }
}
