//! Record generation.
//!
//! Turns a base name and an index range into the lazy sequence of records
//! a run provisions. Host records additionally carry an IPv4 address
//! derived from their index.

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::config::{ExecutionContext, Mode};

/// Number of indices the `10.10.x.y` host address space can hold.
pub const HOST_INDEX_LIMIT: u32 = 256 * 256;

/// Half-open interval `[start, stop)` of record indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobRange {
    pub start: u32,
    pub stop: u32,
}

impl JobRange {
    /// Creates a range, returning `None` if `start > stop`.
    #[must_use]
    pub const fn new(start: u32, stop: u32) -> Option<Self> {
        if start > stop {
            None
        } else {
            Some(Self { start, stop })
        }
    }

    /// Number of indices in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stop.saturating_sub(self.start) as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.stop
    }

    /// Splits the range into contiguous chunks of at most `chunk_size`
    /// indices, in ascending order. The last chunk may be shorter.
    ///
    /// A `chunk_size` of zero yields no chunks.
    pub fn chunks(self, chunk_size: u32) -> impl Iterator<Item = JobRange> {
        let mut next = self.start;
        std::iter::from_fn(move || {
            if chunk_size == 0 || next >= self.stop {
                return None;
            }
            let start = next;
            let stop = start.saturating_add(chunk_size).min(self.stop);
            next = stop;
            Some(JobRange { start, stop })
        })
    }
}

impl fmt::Display for JobRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// One logical record to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Record name, `<base_name><index>`.
    pub name: String,

    /// DNS A-record address (host mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
}

impl Record {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: None,
        }
    }

    #[must_use]
    pub fn host(name: impl Into<String>, ip: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ip: Some(ip),
        }
    }
}

/// Generates `<base><i>` for every index of the range, ascending.
pub fn names(base: &str, range: JobRange) -> impl Iterator<Item = String> + '_ {
    (range.start..range.stop).map(move |i| format!("{base}{i}"))
}

/// Address of the host with the given index: `10.10.<i / 256>.<i % 256>`.
///
/// Returns `None` once the index no longer fits in the two low octets.
#[must_use]
pub fn host_ip(index: u32) -> Option<Ipv4Addr> {
    if index >= HOST_INDEX_LIMIT {
        return None;
    }
    let [_, _, high, low] = index.to_be_bytes();
    Some(Ipv4Addr::new(10, 10, high, low))
}

/// Generates host addresses for the range, paired positionally with [`names`].
///
/// Stops early at the first index outside the address space.
pub fn host_ips(range: JobRange) -> impl Iterator<Item = Ipv4Addr> {
    (range.start..range.stop).map_while(host_ip)
}

/// Generates the records of `range` for the run described by `context`.
pub fn records(context: &ExecutionContext, range: JobRange) -> Vec<Record> {
    let names = names(&context.base_name, range);
    match context.mode {
        Mode::HostCreate => names
            .zip(host_ips(range))
            .map(|(name, ip)| Record::host(name, ip))
            .collect(),
        _ => names.map(Record::named).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(mode: Mode) -> ExecutionContext {
        ExecutionContext {
            mode,
            base_name: "node".to_owned(),
            domain: Some("example.test".to_owned()),
            password: None,
        }
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(JobRange::new(5, 4).is_none());
        assert!(JobRange::new(4, 4).is_some_and(|r| r.is_empty()));
    }

    #[test]
    fn test_chunks_cover_range_exactly() {
        let range = JobRange::new(0, 5).unwrap();
        let chunks: Vec<_> = range.chunks(2).collect();
        assert_eq!(
            chunks,
            vec![
                JobRange { start: 0, stop: 2 },
                JobRange { start: 2, stop: 4 },
                JobRange { start: 4, stop: 5 },
            ]
        );
    }

    #[test]
    fn test_chunks_are_contiguous_and_bounded() {
        for (start, stop, size) in [(0, 0, 3), (3, 17, 4), (10, 11, 100), (7, 40, 1), (0, 99, 33)] {
            let range = JobRange::new(start, stop).unwrap();
            let chunks: Vec<_> = range.chunks(size).collect();

            let mut cursor = start;
            for chunk in &chunks {
                assert_eq!(chunk.start, cursor);
                assert!(chunk.len() <= size as usize);
                assert!(!chunk.is_empty());
                cursor = chunk.stop;
            }
            assert_eq!(cursor, stop);
            assert_eq!(chunks.iter().map(JobRange::len).sum::<usize>(), range.len());
        }
    }

    #[test]
    fn test_hand_built_inverted_range_is_empty() {
        let range = JobRange { start: 9, stop: 3 };
        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
        assert_eq!(range.chunks(2).count(), 0);
        assert_eq!(names("u", range).count(), 0);
    }

    #[test]
    fn test_chunks_zero_size_yields_nothing() {
        let range = JobRange::new(0, 10).unwrap();
        assert_eq!(range.chunks(0).count(), 0);
    }

    #[test]
    fn test_names_in_order() {
        let range = JobRange::new(0, 3).unwrap();
        let generated: Vec<_> = names("user", range).collect();
        assert_eq!(generated, vec!["user0", "user1", "user2"]);
    }

    #[test]
    fn test_host_ips_in_order() {
        let range = JobRange::new(0, 3).unwrap();
        let ips: Vec<String> = host_ips(range).map(|ip| ip.to_string()).collect();
        assert_eq!(ips, vec!["10.10.0.0", "10.10.0.1", "10.10.0.2"]);
    }

    #[test]
    fn test_host_ip_octets() {
        assert_eq!(host_ip(256), Some(Ipv4Addr::new(10, 10, 1, 0)));
        assert_eq!(host_ip(65535), Some(Ipv4Addr::new(10, 10, 255, 255)));
        assert_eq!(host_ip(HOST_INDEX_LIMIT), None);
    }

    #[test]
    fn test_records_pair_hosts_with_ips() {
        let range = JobRange::new(255, 257).unwrap();
        let records = records(&context(Mode::HostCreate), range);
        assert_eq!(
            records,
            vec![
                Record::host("node255", Ipv4Addr::new(10, 10, 0, 255)),
                Record::host("node256", Ipv4Addr::new(10, 10, 1, 0)),
            ]
        );
    }

    #[test]
    fn test_records_without_ips_for_users() {
        let range = JobRange::new(1, 3).unwrap();
        let records = records(&context(Mode::UserCreate), range);
        assert_eq!(records, vec![Record::named("node1"), Record::named("node2")]);
    }
}
