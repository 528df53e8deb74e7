//! Partition-local Storage
//!
//! ## Core Concepts
//! - **`CollectionContainer`**: key → bag of values for one (map name, partition) pair.
//! - **`PartitionContainerRegistry`**: map name → container for one partition, plus the
//!   partition's `LockTable`. Created at node start for every partition; containers
//!   inside it appear lazily.
//! - **`LockTable`**: per-(map name, key) lease locks hosted by the partition that owns the key.
//!
//! Nothing here knows about routing; callers must already be executing on the owning member.

pub mod container;
pub mod lock;
pub mod registry;

pub use container::CollectionContainer;
pub use lock::{LockOutcome, LockOwner, LockTable};
pub use registry::PartitionContainerRegistry;
