//! Address normalization.
//!
//! # Responsibilities
//! - Reduce a raw address string to a comparable canonical form
//! - Pick the originating client out of a multi-hop forwarding list
//! - Unify IPv4 addresses seen through a dual-stack socket
//!
//! # Design Decisions
//! - Ports are never stripped here (callers decide)
//! - Output is lowercase so IPv6 hex digits compare equal
//! - Stripping repeats until nothing changes, so normalization is idempotent

use std::fmt;

use serde::Serialize;

/// Prefix of an IPv4-mapped IPv6 address (`::ffff:10.0.0.5`).
const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// An address in canonical form.
///
/// May be empty, which means "no address". The empty value never matches an
/// allowlist entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the canonical IPv4 and IPv6 loopback forms.
    pub fn is_loopback(&self) -> bool {
        self.0 == "127.0.0.1" || self.0 == "::1"
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize an optional raw address.
///
/// `None` and `""` both yield the empty address. For a comma-separated list
/// (as found in `X-Forwarded-For`) only the first element is kept.
pub fn normalize(raw: Option<&str>) -> NormalizedAddress {
    match raw {
        Some(raw) => normalize_str(raw),
        None => NormalizedAddress::default(),
    }
}

/// Normalize a raw address string.
pub fn normalize_str(raw: &str) -> NormalizedAddress {
    let first = raw.split(',').next().unwrap_or_default();
    let lowered = first.to_ascii_lowercase();

    let mut current = lowered.as_str();
    loop {
        let next = strip_brackets(strip_mapped_prefix(current.trim()));
        if next == current {
            break;
        }
        current = next;
    }

    NormalizedAddress(current.to_string())
}

fn strip_mapped_prefix(addr: &str) -> &str {
    addr.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(addr)
}

// Each side is stripped on its own; `[::1` and `::1]` both become `::1`.
fn strip_brackets(addr: &str) -> &str {
    let addr = addr.strip_prefix('[').unwrap_or(addr);
    addr.strip_suffix(']').unwrap_or(addr)
}
