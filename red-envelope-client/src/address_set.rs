//! Recipient list parsing.
//!
//! The gating flag is deliberately lenient: a list passes as soon as one entry is a valid
//! address, and the whole deduplicated list (invalid entries included) is what gets
//! submitted. The contract call then fails at encoding time for the invalid entries.

use std::collections::HashSet;

use alloy_primitives::Address;

/// Deduplicated recipient entries in first-occurrence order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet {
    entries: Vec<String>,
    has_valid_address: bool,
}

impl AddressSet {
    /// Parse a newline-separated list of candidate addresses.
    ///
    /// Entries are taken verbatim: no trimming, so a trailing newline yields an empty entry.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut has_valid_address = false;
        for candidate in raw.split('\n') {
            has_valid_address |= is_address(candidate);
            if seen.insert(candidate) {
                entries.push(candidate.to_string());
            }
        }

        Self {
            entries,
            has_valid_address,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// True if at least one entry passes [`is_address`].
    pub fn has_valid_address(&self) -> bool {
        self.has_valid_address
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that fail [`is_address`].
    pub fn invalid_entries(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .filter(|e| !is_address(e))
    }

    /// Parse every entry into an [`Address`], failing on the first invalid one.
    pub fn to_addresses(&self) -> Result<Vec<Address>, &str> {
        self.entries
            .iter()
            .map(|e| parse_address(e).ok_or(e.as_str()))
            .collect()
    }
}

/// Structural address check: `0x` followed by 40 hex digits.
///
/// Single-case digits are accepted as-is; mixed case must be a valid EIP-55 checksum.
pub fn is_address(candidate: &str) -> bool {
    parse_address(candidate).is_some()
}

fn parse_address(candidate: &str) -> Option<Address> {
    let digits = candidate.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let single_case = !digits.bytes().any(|b| b.is_ascii_uppercase())
        || !digits.bytes().any(|b| b.is_ascii_lowercase());
    if single_case {
        candidate.parse().ok()
    } else {
        Address::parse_checksummed(candidate, None).ok()
    }
}
