//! Cluster Module
//!
//! Member identity and the static member table the partition resolver reads.
//! Discovery, failure detection and rebalancing are handled by the runtime that
//! embeds this crate; here the table is fixed for the lifetime of a node.

pub mod topology;
pub mod types;

pub use topology::ClusterTopology;
pub use types::{Member, MemberId};

#[cfg(test)]
mod tests;
