//! Turning raw URL strings into connectable `host:port` targets.

use crate::error::{Error, Result};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort(String);

impl HostPort {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hostname(&self) -> &str {
        if let Some(rest) = self.0.strip_prefix('[') {
            return rest.split(']').next().unwrap_or(rest);
        }
        self.0.split(':').next().unwrap_or(&self.0)
    }

    pub fn file_stem(&self) -> String {
        self.hostname().replace(':', "_")
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HostPort {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn resolve_host(raw: &str, default_port: u16) -> Result<HostPort> {
    let parsed = Url::parse(raw)?;

    let host = match parsed.host_str() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(Error::UrlParse(format!("no host in URL '{}'", raw))),
    };

    let authority = match parsed.port().or_else(|| written_default_port(raw, &parsed)) {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(with_default_port(&authority, default_port))
}

/// Appends `:port` unless `host` already looks like it carries one.
///
/// This is a heuristic, not an IPv6-aware parser: a host without any `:` gets
/// the port, as does one ending in `]` (a bare bracketed IPv6 literal). Any
/// other host containing `:` is assumed to end in an explicit port.
pub fn with_default_port(host: &str, port: u16) -> HostPort {
    if !host.contains(':') || host.ends_with(']') {
        HostPort(format!("{}:{}", host, port))
    } else {
        HostPort(host.to_string())
    }
}

// `Url` drops a port equal to the scheme default (`http://a:80`), but a port
// the user wrote down must survive so it is not replaced by the default port.
fn written_default_port(raw: &str, parsed: &Url) -> Option<u16> {
    let default = parsed.port_or_known_default()?;
    let (_, after_scheme) = raw.split_once("://")?;
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    let (_, port) = authority.rsplit_once(':')?;

    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match port.parse::<u16>() {
        Ok(p) if p == default => Some(p),
        _ => None,
    }
}
