use crate::cluster::{ClusterTopology, MemberId};
use crate::serialization::Datum;

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// Maps keys to partitions and partitions to members.
///
/// `partition_of` must be a pure function of the key bytes and the partition
/// count so that every call for a key targets the same partition.
pub trait PartitionResolver: Send + Sync {
    fn partition_count(&self) -> u32;

    fn partition_of(&self, key: &Datum) -> u32;

    fn owner_of(&self, partition: u32) -> Option<MemberId>;

    fn local_member(&self) -> MemberId;

    /// Every member of the cluster, the local one included.
    fn members(&self) -> Vec<MemberId>;

    fn is_local(&self, partition: u32) -> bool {
        self.owner_of(partition)
            .map(|owner| owner == self.local_member())
            .unwrap_or(false)
    }

    fn owned_partitions(&self) -> Vec<u32> {
        (0..self.partition_count())
            .filter(|&partition| self.is_local(partition))
            .collect()
    }
}

pub struct PartitionManager {
    num_partitions: u32,
    topology: ClusterTopology,
}

impl PartitionManager {
    pub fn new(topology: ClusterTopology, num_partitions: u32) -> Self {
        Self {
            num_partitions: num_partitions.max(1),
            topology,
        }
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }
}

impl PartitionResolver for PartitionManager {
    fn partition_count(&self) -> u32 {
        self.num_partitions
    }

    fn partition_of(&self, key: &Datum) -> u32 {
        let mut hasher = DefaultHasher::new();
        hasher.write(key.as_bytes());
        let hash = hasher.finish();
        (hash % self.num_partitions as u64) as u32
    }

    fn owner_of(&self, partition: u32) -> Option<MemberId> {
        let members = self.topology.members();
        if members.is_empty() || partition >= self.num_partitions {
            return None;
        }
        let idx = (partition as usize) % members.len();
        Some(members[idx].id.clone())
    }

    fn local_member(&self) -> MemberId {
        self.topology.local_id().clone()
    }

    fn members(&self) -> Vec<MemberId> {
        self.topology
            .members()
            .iter()
            .map(|member| member.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Member;
    use std::collections::HashMap;

    fn manager(members: &[&str], local: &str, partitions: u32) -> PartitionManager {
        let members = members
            .iter()
            .enumerate()
            .map(|(i, id)| Member::new(*id, format!("127.0.0.1:{}", 7000 + i).parse().unwrap()))
            .collect();
        PartitionManager::new(ClusterTopology::new(MemberId::from(local), members), partitions)
    }

    #[test]
    fn test_partition_is_deterministic() {
        let manager = manager(&["a"], "a", 256);
        let key = Datum(b"book_100".to_vec());

        let p1 = manager.partition_of(&key);
        let p2 = manager.partition_of(&key);

        assert_eq!(p1, p2, "The same key should yield the same partition");
        assert!(p1 < 256);
    }

    #[test]
    fn test_partition_distribution() {
        let manager = manager(&["a"], "a", 256);

        let mut partition_counts = HashMap::new();
        for i in 0..10000 {
            let key = Datum(format!("book_{}", i).into_bytes());
            *partition_counts.entry(manager.partition_of(&key)).or_insert(0) += 1;
        }

        // ~39 keys per partition expected; at least 100 distinct buckets in use
        assert!(
            partition_counts.len() > 100,
            "Should have more than 100 distinct partitions used, got: {}",
            partition_counts.len()
        );
    }

    #[test]
    fn test_single_member_owns_everything() {
        let manager = manager(&["a"], "a", 16);

        assert_eq!(manager.owned_partitions().len(), 16);
        assert_eq!(manager.owner_of(3), Some(MemberId::from("a")));
    }

    #[test]
    fn test_owners_round_robin_over_sorted_members() {
        let manager = manager(&["c", "a", "b"], "b", 6);

        assert_eq!(manager.owner_of(0), Some(MemberId::from("a")));
        assert_eq!(manager.owner_of(1), Some(MemberId::from("b")));
        assert_eq!(manager.owner_of(2), Some(MemberId::from("c")));
        assert_eq!(manager.owner_of(4), Some(MemberId::from("b")));
        assert_eq!(manager.owned_partitions(), vec![1, 4]);
    }

    #[test]
    fn test_out_of_range_partition_has_no_owner() {
        let manager = manager(&["a"], "a", 4);

        assert_eq!(manager.owner_of(4), None);
    }
}
