//! Replica set member addresses
//!
//! Members are compared as normalized `host:port` strings: lower-cased host,
//! explicit port, IPv6 literals in brackets.

use crate::error::{ReplsetError, Result};

pub const DEFAULT_PORT: u16 = 27017;

/// Normalize `host`, `host:port`, `[v6]` or `[v6]:port`.
pub fn normalize_host(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let invalid = || ReplsetError::InvalidHost(raw.to_string());

    let (host, port) = if let Some(rest) = raw.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match after {
            "" => None,
            _ => Some(after.strip_prefix(':').ok_or_else(invalid)?),
        };
        (host, port)
    } else if raw.matches(':').count() > 1 {
        // bare IPv6 literal, no port
        (raw, None)
    } else {
        match raw.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (raw, None),
        }
    };

    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let port = match port {
        None => DEFAULT_PORT,
        Some(p) => p.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(invalid)?,
    };

    let host = host.to_ascii_lowercase();
    if host.contains(':') {
        Ok(format!("[{}]:{}", host, port))
    } else {
        Ok(format!("{}:{}", host, port))
    }
}

/// Normalize a member list, dropping duplicates but keeping declared order.
pub fn parse_hosts<S: AsRef<str>>(items: &[S]) -> Result<Vec<String>> {
    let mut hosts: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let host = normalize_host(item.as_ref())?;
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }

    if hosts.is_empty() {
        return Err(ReplsetError::InvalidArgument(
            "hosts must name at least one member".into(),
        ));
    }
    Ok(hosts)
}

/// Normalize an address reported by the server, keeping it as-is when it
/// does not parse.
pub fn normalize_reported(raw: &str) -> String {
    normalize_host(raw).unwrap_or_else(|_| raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("mongo0").unwrap(), "mongo0:27017");
        assert_eq!(normalize_host("Mongo1:27011").unwrap(), "mongo1:27011");
        assert_eq!(normalize_host(" 10.0.0.5:27018 ").unwrap(), "10.0.0.5:27018");
        assert_eq!(normalize_host("[::1]").unwrap(), "[::1]:27017");
        assert_eq!(normalize_host("[FE80::1]:27019").unwrap(), "[fe80::1]:27019");
        assert_eq!(normalize_host("fe80::1").unwrap(), "[fe80::1]:27017");
    }

    #[test]
    fn test_invalid_hosts() {
        for raw in ["", ":27017", "mongo0:port", "mongo0:0", "mongo0:70000", "[::1", "[::1]x"] {
            assert!(normalize_host(raw).is_err(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_parse_hosts_dedups() {
        let hosts = parse_hosts(&["mongo0", "mongo1:27011", "MONGO0:27017"]).unwrap();
        assert_eq!(hosts, vec!["mongo0:27017", "mongo1:27011"]);
    }

    #[test]
    fn test_parse_hosts_requires_one() {
        assert!(parse_hosts::<&str>(&[]).is_err());
    }
}
