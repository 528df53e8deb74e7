//! Partition Resolver
//!
//! Keys are hashed into a fixed number of partitions and each partition is
//! owned by exactly one member. Every routing decision in the access layer
//! starts here.

pub mod resolver;

pub use resolver::{PartitionManager, PartitionResolver};
