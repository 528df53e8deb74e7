use crate::cluster::MemberId;
use crate::error::Result;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats<K> {
    pub key: K,
    pub value_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats<K> {
    pub partition: u32,
    pub key_count: usize,
    pub value_count: usize,
    pub locked_keys: usize,
    pub keys: Vec<KeyStats<K>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounts {
    pub puts: u64,
    pub gets: u64,
    pub removes: u64,
    pub others: u64,
}

/// Snapshot of one map's data held by the local member's partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMultiMapStats<K> {
    pub map_name: String,
    pub member: MemberId,
    pub partitions: Vec<PartitionStats<K>>,
    pub operations: OperationCounts,
}

impl<K> LocalMultiMapStats<K> {
    pub fn total_keys(&self) -> usize {
        self.partitions.iter().map(|p| p.key_count).sum()
    }

    pub fn total_values(&self) -> usize {
        self.partitions.iter().map(|p| p.value_count).sum()
    }

    pub fn try_map_keys<K2>(
        self,
        mut f: impl FnMut(&K) -> Result<K2>,
    ) -> Result<LocalMultiMapStats<K2>> {
        let mut partitions = Vec::with_capacity(self.partitions.len());
        for partition in self.partitions {
            let mut keys = Vec::with_capacity(partition.keys.len());
            for key_stats in partition.keys {
                keys.push(KeyStats {
                    key: f(&key_stats.key)?,
                    value_count: key_stats.value_count,
                });
            }
            partitions.push(PartitionStats {
                partition: partition.partition,
                key_count: partition.key_count,
                value_count: partition.value_count,
                locked_keys: partition.locked_keys,
                keys,
            });
        }
        Ok(LocalMultiMapStats {
            map_name: self.map_name,
            member: self.member,
            partitions,
            operations: self.operations,
        })
    }
}

/// Per-map counters of operations applied on this member.
#[derive(Debug, Default)]
pub struct OperationCounters {
    puts: AtomicU64,
    gets: AtomicU64,
    removes: AtomicU64,
    others: AtomicU64,
}

impl OperationCounters {
    /// Counts one applied operation, by `Operation::name`.
    pub fn record(&self, operation: &str) {
        let counter = match operation {
            "put" => &self.puts,
            "get" => &self.gets,
            "remove" | "remove_all" => &self.removes,
            _ => &self.others,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OperationCounts {
        OperationCounts {
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            others: self.others.load(Ordering::Relaxed),
        }
    }
}
