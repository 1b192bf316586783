//! Allowlist assembly.
//!
//! # Responsibilities
//! - Normalize explicitly configured addresses
//! - Collect addresses declared under a key in env files
//! - Merge both into one immutable set
//!
//! # Design Decisions
//! - Missing and unreadable env files contribute nothing; assembly never fails
//! - Env file entries lose a trailing `:port`; explicit entries are kept as given
//! - The set is built once and exposes no mutation afterwards

use std::collections::hash_set::{self, HashSet};
use std::path::Path;

use crate::allowlist::env_file::read_env_file;
use crate::allowlist::normalize::{normalize_str, NormalizedAddress};
use crate::config::AllowlistOptions;

/// Immutable set of allowed addresses.
#[derive(Debug, Clone, Default)]
pub struct AllowSet {
    entries: HashSet<NormalizedAddress>,
}

impl AllowSet {
    /// Build the set, resolving env files against the working directory.
    pub fn assemble(options: &AllowlistOptions) -> Self {
        let base = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Cannot determine working directory, using relative paths");
            ".".into()
        });
        Self::assemble_in(options, &base)
    }

    /// Build the set, resolving relative env file paths against `base`.
    pub fn assemble_in(options: &AllowlistOptions, base: &Path) -> Self {
        let mut entries = HashSet::new();

        for raw in options.allowlist.iter().filter(|raw| !raw.is_empty()) {
            let addr = normalize_str(raw);
            if addr.is_empty() {
                continue;
            }
            tracing::debug!(address = %addr, "Added address from allowlist");
            entries.insert(addr);
        }

        for file in options.env_files().iter() {
            let path = base.join(file);
            for addr in addresses_from_env_file(&path, &options.env_var) {
                tracing::debug!(address = %addr, file = %file, "Added address from env file");
                entries.insert(addr);
            }
        }

        let set = Self { entries };
        tracing::info!(
            entries = set.len(),
            addresses = ?set.sorted(),
            "Allowlist assembled"
        );
        set
    }

    pub fn contains(&self, addr: &NormalizedAddress) -> bool {
        !addr.is_empty() && self.entries.contains(addr)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, NormalizedAddress> {
        self.entries.iter()
    }

    /// Entries in lexical order, for logs and display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.entries.iter().map(NormalizedAddress::as_str).collect();
        out.sort_unstable();
        out
    }
}

impl<'a> IntoIterator for &'a AllowSet {
    type Item = &'a NormalizedAddress;
    type IntoIter = hash_set::Iter<'a, NormalizedAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Addresses declared under `key` in the env file at `path`.
fn addresses_from_env_file(path: &Path, key: &str) -> Vec<NormalizedAddress> {
    let vars = match read_env_file(path) {
        Ok(Some(vars)) => vars,
        Ok(None) => {
            tracing::debug!(path = %path.display(), "Env file not found, skipping");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse env file, skipping");
            return Vec::new();
        }
    };

    let Some(raw) = vars.get(key) else {
        return Vec::new();
    };

    let addrs: Vec<NormalizedAddress> = parse_declared_entries(raw).collect();
    tracing::info!(
        path = %path.display(),
        key,
        addresses = ?addrs.iter().map(NormalizedAddress::as_str).collect::<Vec<_>>(),
        "Loaded addresses from env file"
    );
    addrs
}

/// Split a declared value such as `192.168.1.10:5173, 192.168.1.11`.
fn parse_declared_entries(raw: &str) -> impl Iterator<Item = NormalizedAddress> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let host = part.split(':').next().unwrap_or_default();
            normalize_str(host)
        })
        .filter(|addr| !addr.is_empty())
}
