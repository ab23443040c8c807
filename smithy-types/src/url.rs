/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! An immutable URL value type: `scheme://[userinfo@]host[:port][/path][?query][#fragment]`.

use crate::percent_encode::{Encodable, PercentEncoding};
use crate::query::QueryParameters;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// The host component of a [`Url`]: a sum type over the three shapes a host can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    /// A DNS domain name, e.g. `example.amazonaws.com`.
    Domain(String),
    /// A literal IPv4 address.
    Ipv4(Ipv4Addr),
    /// A literal IPv6 address, with an optional zone identifier (e.g. `fe80::1%eth0`).
    Ipv6 {
        /// The address itself.
        addr: Ipv6Addr,
        /// RFC 6874 zone identifier, if present.
        zone: Option<String>,
    },
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Domain(d) => write!(f, "{d}"),
            Host::Ipv4(addr) => write!(f, "{addr}"),
            Host::Ipv6 { addr, zone: None } => write!(f, "[{addr}]"),
            Host::Ipv6 {
                addr,
                zone: Some(zone),
            } => write!(f, "[{addr}%25{zone}]"),
        }
    }
}

impl FromStr for Host {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (addr_part, zone) = match inner.split_once("%25").or_else(|| inner.split_once('%')) {
                Some((addr, zone)) => (addr, Some(zone.to_string())),
                None => (inner, None),
            };
            if let Ok(addr) = addr_part.parse::<Ipv6Addr>() {
                return Ok(Host::Ipv6 { addr, zone });
            }
            return Ok(Host::Domain(s.to_string()));
        }
        if let Ok(addr) = s.parse::<Ipv4Addr>() {
            return Ok(Host::Ipv4(addr));
        }
        Ok(Host::Domain(s.to_string()))
    }
}

/// An immutable URL value.
///
/// Every textual component that requires percent-encoding is stored as an [`Encodable`]
/// pair so that `encode(decode(x)) == x` is an invariant of construction rather than
/// something callers must maintain by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    scheme: String,
    userinfo: Option<Encodable>,
    host: Host,
    port: Option<u16>,
    path: Encodable,
    query: QueryParameters,
    fragment: Option<Encodable>,
}

impl Url {
    /// Parses a URL of the form `scheme://[userinfo@]host[:port][/path][?query][#fragment]`.
    pub fn parse(s: &str) -> Result<Self, UrlParseError> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| UrlParseError::new("missing scheme"))?;
        if scheme.is_empty() {
            return Err(UrlParseError::new("empty scheme"));
        }

        let (authority, mut rest) = match rest.find(['/', '?', '#']) {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let (userinfo, host_port) = match authority.split_once('@') {
            Some((ui, hp)) => (Some(Encodable::from_encoded(ui, PercentEncoding::UserInfo)), hp),
            None => (None, authority),
        };

        let (host_str, port) = split_host_port(host_port)?;
        let host = host_str
            .parse::<Host>()
            .map_err(|_| UrlParseError::new("invalid host"))?;

        let fragment = if let Some(idx) = rest.find('#') {
            let (before, frag) = rest.split_at(idx);
            rest = before;
            Some(Encodable::from_encoded(&frag[1..], PercentEncoding::Fragment))
        } else {
            None
        };

        let (path_str, query) = match rest.find('?') {
            Some(idx) => {
                let (p, q) = rest.split_at(idx);
                (p, QueryParameters::parse(&q[1..], PercentEncoding::Query))
            }
            None => (rest, QueryParameters::new()),
        };
        let path = if path_str.is_empty() {
            Encodable::from_encoded("/", PercentEncoding::Path)
        } else {
            Encodable::from_encoded(path_str, PercentEncoding::Path)
        };

        Ok(Url {
            scheme: scheme.to_string(),
            userinfo,
            host,
            port,
            path,
            query,
            fragment,
        })
    }

    /// The URL scheme, e.g. `"https"`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host component.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// The explicit port, if one was present in the URL (no scheme-default inference).
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The decoded path, always starting with `/`.
    pub fn path(&self) -> &str {
        self.path.decoded()
    }

    /// The path exactly as it should appear on the wire.
    pub fn encoded_path(&self) -> &str {
        self.path.encoded()
    }

    /// The query parameters.
    pub fn query(&self) -> &QueryParameters {
        &self.query
    }

    /// Mutable access to the query parameters, for signers/middleware that append
    /// SigV4 parameters to a pre-signed URL.
    pub fn query_mut(&mut self) -> &mut QueryParameters {
        &mut self.query
    }

    /// The decoded fragment, if present.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_ref().map(|e| e.decoded())
    }

    /// Sets the path from a decoded string.
    pub fn set_path(&mut self, decoded_path: impl Into<String>) {
        self.path = Encodable::from_decoded(decoded_path, PercentEncoding::Path);
    }

    /// Returns the `host[:port]` authority, suitable for a `Host` header.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.to_string(),
        }
    }
}

fn split_host_port(host_port: &str) -> Result<(&str, Option<u16>), UrlParseError> {
    if let Some(bracket_end) = host_port.find(']') {
        let (host, rest) = host_port.split_at(bracket_end + 1);
        return match rest.strip_prefix(':') {
            Some(port) => Ok((
                host,
                Some(port.parse().map_err(|_| UrlParseError::new("invalid port"))?),
            )),
            None if rest.is_empty() => Ok((host, None)),
            None => Err(UrlParseError::new("trailing characters after host")),
        };
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            Ok((host, Some(port.parse().map_err(|_| UrlParseError::new("invalid port"))?)))
        }
        _ => Ok((host_port, None)),
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(ui) = &self.userinfo {
            write!(f, "{}@", ui.encoded())?;
        }
        write!(f, "{}", self.authority())?;
        write!(f, "{}", self.path.encoded())?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query.to_query_string(PercentEncoding::Query))?;
        }
        if let Some(frag) = &self.fragment {
            write!(f, "#{}", frag.encoded())?;
        }
        Ok(())
    }
}

/// Error returned by [`Url::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParseError(String);

impl UrlParseError {
    fn new(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

impl fmt::Display for UrlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid URL: {}", self.0)
    }
}

impl std::error::Error for UrlParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_https_url() {
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host().to_string(), "example.amazonaws.com");
        assert_eq!(url.path(), "/");
        assert_eq!(url.port(), None);
    }

    #[test]
    fn parses_port_and_query() {
        let url = Url::parse("http://localhost:8080/a/b?x=1&y=2").unwrap();
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query().get("x"), Some("1"));
        assert_eq!(url.query().get("y"), Some("2"));
    }

    #[test]
    fn parses_ipv6_with_zone() {
        let url = Url::parse("https://[fe80::1%25eth0]:443/").unwrap();
        match url.host() {
            Host::Ipv6 { zone, .. } => assert_eq!(zone.as_deref(), Some("eth0")),
            other => panic!("expected Ipv6, got {other:?}"),
        }
    }

    #[test]
    fn display_round_trips() {
        let raw = "https://example.amazonaws.com/test.txt?a=1";
        let url = Url::parse(raw).unwrap();
        assert_eq!(url.to_string(), raw);
    }

    #[test]
    fn path_defaults_to_slash_when_absent() {
        let url = Url::parse("https://example.amazonaws.com").unwrap();
        assert_eq!(url.path(), "/");
    }
}
