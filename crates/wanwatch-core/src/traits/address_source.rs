// # Address Source Trait
//
// Defines the interface for fetching the current address state of the
// monitored interface, together with the domain types produced by a fetch.
//
// ## Implementations
//
// - OPNsense diagnostics API: `wanwatch-source-opnsense` crate
// - Future: other appliance APIs, local interface enumeration
//
// An address source issues exactly one remote query per call. It holds no
// state between calls, never retries, and never touches the state store;
// the engine owns all of that.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;

use crate::error::FetchError;

/// One address entry as reported by the appliance
///
/// Ephemeral: produced fresh each cycle from the raw API response, consumed
/// when building an [`AddressSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Address literal (IPv4 or IPv6), possibly empty in raw API output
    pub addr: String,
    /// Whether the appliance tagged this entry as link-local
    pub link_local: bool,
}

/// An order-independent set of routable address strings
///
/// Backed by an ordered set, so equality is sorted-content equality and
/// insertion order can never produce a false "changed" signal. Duplicates
/// collapse on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet(BTreeSet<String>);

impl AddressSet {
    /// Create an empty address set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw records, dropping entries with an empty address
    /// or the link-local tag
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AddressRecord>,
    {
        records
            .into_iter()
            .filter(|record| !record.addr.is_empty() && !record.link_local)
            .map(|record| record.addr)
            .collect()
    }

    /// Parse the newline-delimited durable representation
    ///
    /// Blank lines are skipped, so a trailing newline round-trips cleanly.
    pub fn from_lines(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Render the newline-delimited durable representation, one address per
    /// line with a trailing newline
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for addr in &self.0 {
            out.push_str(addr);
            out.push('\n');
        }
        out
    }

    /// Number of addresses in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains no addresses
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains the given address
    pub fn contains(&self, addr: &str) -> bool {
        self.0.contains(addr)
    }

    /// Iterate over the addresses in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AddressSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for AddressSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for addr in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(addr)?;
            first = false;
        }
        Ok(())
    }
}

/// Administrative/operational status of the monitored interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceStatus {
    Up,
    Down,
}

impl InterfaceStatus {
    /// Derive the status from the API's up flag
    pub fn from_flag(up: bool) -> Self {
        if up { Self::Up } else { Self::Down }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

/// The result of one fetch: interface status plus its routable addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    /// Whether the interface reports as up
    pub status: InterfaceStatus,
    /// Routable (non-link-local) addresses currently bound
    pub addresses: AddressSet,
}

/// Trait for address source implementations
///
/// A source performs one bounded remote query per call and reports failures
/// as [`FetchError`] kinds rather than panicking; the engine decides what a
/// failed cycle means.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the current status and address set of the named interface
    ///
    /// # Returns
    ///
    /// - `Ok(InterfaceSnapshot)`: status flag and filtered address set
    /// - `Err(FetchError)`: transport failure, remote rejection, or a
    ///   response that could not be interpreted
    async fn fetch(&self, interface: &str) -> Result<InterfaceSnapshot, FetchError>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_order_insensitive() {
        let a: AddressSet = ["203.0.113.5", "2001:db8::1"].into_iter().collect();
        let b: AddressSet = ["2001:db8::1", "203.0.113.5"].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicates_collapse() {
        let set: AddressSet = ["198.51.100.9", "198.51.100.9"].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_records_filters_link_local_and_empty() {
        let records = vec![
            AddressRecord {
                addr: "203.0.113.5".to_string(),
                link_local: false,
            },
            AddressRecord {
                addr: "fe80::1%em0".to_string(),
                link_local: true,
            },
            AddressRecord {
                addr: String::new(),
                link_local: false,
            },
        ];

        let set = AddressSet::from_records(records);
        assert_eq!(set.len(), 1);
        assert!(set.contains("203.0.113.5"));
    }

    #[test]
    fn lines_round_trip() {
        let set: AddressSet = ["203.0.113.5", "2001:db8::1"].into_iter().collect();
        let rendered = set.to_lines();
        assert_eq!(AddressSet::from_lines(&rendered), set);
    }

    #[test]
    fn from_lines_skips_blank_lines() {
        let set = AddressSet::from_lines("203.0.113.5\n\n  \n2001:db8::1\n");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_file_is_empty_set() {
        assert!(AddressSet::from_lines("").is_empty());
    }

    #[test]
    fn status_from_flag() {
        assert!(InterfaceStatus::from_flag(true).is_up());
        assert!(!InterfaceStatus::from_flag(false).is_up());
    }
}
