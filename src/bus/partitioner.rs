//! Domain-affine partition selection
//!
//! Every request for a given domain must land on the same partition of the
//! outgoing topic so that one downstream fetcher sees all of a domain's
//! requests in one stream.

/// Maps partition keys to partitions with a CRC32 checksum
///
/// The mapping only depends on the key bytes and the partition count, so it is
/// stable across calls and process restarts as long as the topic keeps its
/// partition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionKeyer {
    partitions: u32,
}

impl PartitionKeyer {
    /// Creates a keyer for a topic with `partitions` partitions
    ///
    /// A count of zero is treated as a single partition.
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partition_count(&self) -> u32 {
        self.partitions
    }

    /// Canonical byte form of a domain name used as the message key
    pub fn encode_key(domain: &str) -> Vec<u8> {
        domain.as_bytes().to_vec()
    }

    /// Returns the partition for a raw key
    pub fn partition_for(&self, key: &[u8]) -> i32 {
        (crc32fast::hash(key) % self.partitions) as i32
    }

    /// Returns the partition for a domain name
    pub fn partition_for_domain(&self, domain: &str) -> i32 {
        self.partition_for(domain.as_bytes())
    }
}
