use super::container::CollectionContainer;
use super::lock::LockTable;
use crate::error::{MultiMapError, Result};
use crate::serialization::Datum;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

enum ContainerSlot {
    Live(CollectionContainer),
    /// Left behind by `destroy` so later operations fail instead of recreating the map.
    Destroyed,
}

/// All multimap state hosted by one partition.
///
/// Containers are created lazily on the first mutation for a map name. Access
/// goes through closures that run while the slot's shard lock is held, which
/// serializes writers on the same container while leaving other partitions
/// (and other map names) untouched.
pub struct PartitionContainerRegistry {
    partition_id: u32,
    containers: DashMap<String, ContainerSlot>,
    locks: LockTable,
}

impl PartitionContainerRegistry {
    pub fn new(partition_id: u32) -> Self {
        Self {
            partition_id,
            containers: DashMap::new(),
            locks: LockTable::new(),
        }
    }

    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    pub fn locks(&self) -> &LockTable {
        &self.locks
    }

    /// Runs `f` against the map's container, creating it on first use.
    pub fn with_container<R>(
        &self,
        map_name: &str,
        f: impl FnOnce(&mut CollectionContainer) -> R,
    ) -> Result<R> {
        let mut slot = self
            .containers
            .entry(map_name.to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    "Creating container for '{}' in partition {}",
                    map_name,
                    self.partition_id
                );
                ContainerSlot::Live(CollectionContainer::new())
            });

        match slot.value_mut() {
            ContainerSlot::Live(container) => Ok(f(container)),
            ContainerSlot::Destroyed => Err(MultiMapError::MapNotFound(map_name.to_string())),
        }
    }

    /// Runs `f` against the map's container if it exists. Reads never create state.
    pub fn read_container<R>(
        &self,
        map_name: &str,
        f: impl FnOnce(&CollectionContainer) -> R,
    ) -> Result<Option<R>> {
        match self.containers.get(map_name) {
            Some(slot) => match slot.value() {
                ContainerSlot::Live(container) => Ok(Some(f(container))),
                ContainerSlot::Destroyed => Err(MultiMapError::MapNotFound(map_name.to_string())),
            },
            None => Ok(None),
        }
    }

    /// Tombstones the map in this partition and drops its locks.
    /// Returns true if live data was discarded.
    pub fn destroy(&self, map_name: &str) -> bool {
        let had_data = match self.containers.entry(map_name.to_string()) {
            Entry::Occupied(mut slot) => {
                let previous = std::mem::replace(slot.get_mut(), ContainerSlot::Destroyed);
                matches!(previous, ContainerSlot::Live(ref c) if !c.is_empty())
            }
            Entry::Vacant(slot) => {
                slot.insert(ContainerSlot::Destroyed);
                false
            }
        };
        self.locks.clear_map(map_name);
        had_data
    }

    pub fn is_destroyed(&self, map_name: &str) -> bool {
        self.containers
            .get(map_name)
            .map(|slot| matches!(slot.value(), ContainerSlot::Destroyed))
            .unwrap_or(false)
    }

    pub fn container_names(&self) -> Vec<String> {
        self.containers
            .iter()
            .filter(|entry| matches!(entry.value(), ContainerSlot::Live(_)))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Every live map's entries in this partition, for handing the partition to a new owner.
    pub fn dump(&self) -> Vec<(String, Vec<(Datum, Datum)>)> {
        self.containers
            .iter()
            .filter_map(|entry| match entry.value() {
                ContainerSlot::Live(container) => {
                    Some((entry.key().clone(), container.entry_set()))
                }
                ContainerSlot::Destroyed => None,
            })
            .collect()
    }

    /// Drops the whole partition's state after it migrated away.
    pub fn clear(&self) {
        self.containers.clear();
        self.locks.clear();
    }
}
