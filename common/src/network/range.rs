//! # IPv4 Range Model
//!
//! Continuous, inclusive ranges of IPv4 addresses and the collection type that
//! the target expander builds before anything is materialised.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

use crate::error::InputError;

/// A continuous range of IPv4 addresses, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Builds a range, rejecting an end that lies before the start.
    pub fn checked(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Result<Self, InputError> {
        if u32::from(end_addr) < u32::from(start_addr) {
            return Err(InputError::InvalidRange {
                start: start_addr,
                end: end_addr,
            });
        }
        Ok(Self::new(start_addr, end_addr))
    }

    /// Number of addresses in the range, computed from the integer distance
    /// between the endpoints.
    pub fn len(&self) -> u64 {
        let start = u32::from(self.start_addr) as u64;
        let end = u32::from(self.end_addr) as u64;
        if end < start { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }
}

/// The whole network block of `ip/prefix`, network and broadcast included.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, InputError> {
    let network = Ipv4Network::new(ip, prefix).map_err(|_| InputError::InvalidPrefix { prefix })?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// The probe-able hosts of `ip/prefix`.
///
/// Network and broadcast addresses are dropped for prefixes up to /30. A /31 is
/// a point-to-point pair and a /32 a single host, so both are kept whole.
pub fn cidr_hosts(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, InputError> {
    let block = cidr_range(ip, prefix)?;
    if prefix >= 31 {
        return Ok(block);
    }
    let first = u32::from(block.start_addr) + 1;
    let last = u32::from(block.end_addr) - 1;
    Ok(Ipv4Range::new(Ipv4Addr::from(first), Ipv4Addr::from(last)))
}

/// One entry of an [`IpCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionItem {
    Single(IpAddr),
    Range(Ipv4Range),
}

/// Addresses gathered from one or more targets, kept compact until iterated.
///
/// Items keep their insertion order; iteration yields each address once, at
/// its first occurrence.
#[derive(Debug, Clone, Default)]
pub struct IpCollection {
    items: Vec<CollectionItem>,
}

impl IpCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_single(&mut self, addr: IpAddr) {
        self.items.push(CollectionItem::Single(addr));
    }

    pub fn add_range(&mut self, range: Ipv4Range) {
        if !range.is_empty() {
            self.items.push(CollectionItem::Range(range));
        }
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    /// Number of distinct addresses this collection yields.
    ///
    /// Ranges are merged as integer intervals, so the count costs nothing per
    /// address.
    pub fn len(&self) -> u64 {
        let merged = self.merged_ranges();
        let in_ranges: u64 = merged.iter().map(|&(start, end)| end - start + 1).sum();

        let mut singles: HashSet<IpAddr> = HashSet::new();
        for item in &self.items {
            if let CollectionItem::Single(addr) = item {
                let covered = match addr {
                    IpAddr::V4(v4) => interval_contains(&merged, u32::from(*v4) as u64),
                    IpAddr::V6(_) => false,
                };
                if !covered {
                    singles.insert(*addr);
                }
            }
        }
        in_ranges + singles.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted, non-overlapping, non-adjacent `[start, end]` intervals.
    fn merged_ranges(&self) -> Vec<(u64, u64)> {
        let mut intervals: Vec<(u64, u64)> = self
            .items
            .iter()
            .filter_map(|item| match item {
                CollectionItem::Range(range) => Some((
                    u32::from(range.start_addr) as u64,
                    u32::from(range.end_addr) as u64,
                )),
                CollectionItem::Single(_) => None,
            })
            .collect();
        intervals.sort_unstable();

        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(intervals.len());
        for (start, end) in intervals {
            match merged.last_mut() {
                Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }
}

fn interval_contains(merged: &[(u64, u64)], value: u64) -> bool {
    let idx = merged.partition_point(|&(start, _)| start <= value);
    idx > 0 && merged[idx - 1].1 >= value
}

impl IntoIterator for IpCollection {
    type Item = IpAddr;
    type IntoIter = std::vec::IntoIter<IpAddr>;

    /// Insertion order; duplicates dropped, first occurrence kept.
    fn into_iter(self) -> Self::IntoIter {
        let mut seen: HashSet<IpAddr> = HashSet::new();
        let addrs: Vec<IpAddr> = self
            .items
            .into_iter()
            .flat_map(|item| -> Box<dyn Iterator<Item = IpAddr>> {
                match item {
                    CollectionItem::Single(addr) => Box::new(std::iter::once(addr)),
                    CollectionItem::Range(range) => {
                        let (start, end) = (u32::from(range.start_addr), u32::from(range.end_addr));
                        Box::new((start..=end).map(|n| IpAddr::V4(Ipv4Addr::from(n))))
                    }
                }
            })
            .filter(|addr| seen.insert(*addr))
            .collect();
        addrs.into_iter()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_ipv4range_iter() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 3));

        let mut iter = range.iter();
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_checked_range_rejects_reversed_endpoints() {
        let start = Ipv4Addr::new(10, 0, 0, 5);
        let end = Ipv4Addr::new(10, 0, 0, 1);
        assert_eq!(
            Ipv4Range::checked(start, end),
            Err(InputError::InvalidRange { start, end })
        );
    }

    #[test]
    fn test_checked_range_single_address() {
        let ip = Ipv4Addr::new(10, 0, 0, 9);
        let range = Ipv4Range::checked(ip, ip).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![ip]);
    }

    #[test]
    fn test_range_len_spans_octets() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 250), Ipv4Addr::new(10, 0, 1, 4));
        assert_eq!(range.len(), 11);
        assert_eq!(range.iter().count(), 11);
    }

    #[test]
    fn test_cidr_range() {
        let range = cidr_range(Ipv4Addr::new(192, 168, 1, 100), 24).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 1, 255));
    }

    #[test]
    fn test_cidr_range_invalid_prefix() {
        let result = cidr_range(Ipv4Addr::new(192, 168, 1, 1), 33);
        assert_eq!(result, Err(InputError::InvalidPrefix { prefix: 33 }));
        assert_eq!(result.unwrap_err().to_string(), "invalid prefix: 33 > 32");
    }

    #[test]
    fn test_cidr_hosts_excludes_network_and_broadcast() {
        for prefix in [16u8, 24, 28, 30] {
            let hosts = cidr_hosts(Ipv4Addr::new(10, 1, 2, 3), prefix).unwrap();
            assert_eq!(hosts.len(), (1u64 << (32 - prefix)) - 2, "prefix /{prefix}");
        }
        let hosts = cidr_hosts(Ipv4Addr::new(192, 168, 1, 0), 30).unwrap();
        assert_eq!(hosts.start_addr, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts.end_addr, Ipv4Addr::new(192, 168, 1, 2));
    }

    #[test]
    fn test_cidr_hosts_degenerate_prefixes() {
        let pair = cidr_hosts(Ipv4Addr::new(10, 0, 0, 7), 31).unwrap();
        assert_eq!(pair.iter().collect::<Vec<_>>(), vec![
            Ipv4Addr::new(10, 0, 0, 6),
            Ipv4Addr::new(10, 0, 0, 7)
        ]);

        let single = cidr_hosts(Ipv4Addr::new(10, 0, 0, 7), 32).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.start_addr, Ipv4Addr::new(10, 0, 0, 7));
    }

    #[test]
    fn test_collection_dedups_and_counts() {
        let mut collection = IpCollection::new();
        collection.add_range(Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 3)));
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)));

        assert_eq!(collection.len(), 4);
        let addrs: Vec<IpAddr> = collection.into_iter().collect();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs[3], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)));
    }

    #[test]
    fn test_collection_keeps_insertion_order() {
        let mut collection = IpCollection::new();
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)));
        collection.add_range(Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)));

        let addrs: Vec<IpAddr> = collection.into_iter().collect();
        assert_eq!(addrs, vec![
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        ]);
    }

    #[test]
    fn test_collection_len_merges_overlapping_and_adjacent_ranges() {
        let mut collection = IpCollection::new();
        collection.add_range(Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 255)));
        collection.add_range(Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 100), Ipv4Addr::new(10, 0, 1, 9)));
        collection.add_range(Ipv4Range::new(Ipv4Addr::new(10, 0, 1, 10), Ipv4Addr::new(10, 0, 1, 19)));
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 50)));
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 9, 9)));
        collection.add_single(IpAddr::V4(Ipv4Addr::new(10, 0, 9, 9)));
        collection.add_single("::1".parse().unwrap());

        assert_eq!(collection.len(), 256 + 20 + 2);
        assert_eq!(collection.clone().into_iter().count() as u64, collection.len());
    }
}
