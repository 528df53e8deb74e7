//! MultiMap Module
//!
//! The distributed multimap itself: a named map from keys to bags of values,
//! spread over the cluster's partitions.
//!
//! ## Core Concepts
//! - **`MultiMapService`**: one per member. Routes single-key operations to the owning
//!   partition, fans whole-map reads out to every partition, and hosts the lock, listener
//!   and statistics state of the partitions it owns.
//! - **`MultiMapProxy<K, V>`**: a typed handle bound to one map name. It encodes keys and
//!   values into `Datum`s on the way in and decodes results on the way out.
//! - **`Operation` / `OpResponse`**: the partition-scoped request and response values shared
//!   by in-process execution and the transport.
//!
//! ## Consistency
//! Every partition is read independently. A whole-map result merges per-partition snapshots
//! taken at slightly different times; there is no cluster-wide snapshot.

pub mod handlers;
pub mod listener;
pub mod operation;
pub mod protocol;
pub mod proxy;
pub mod service;
pub mod stats;

pub use listener::{EntryEvent, EntryEventType, EntryListener};
pub use operation::{OpResponse, Operation};
pub use proxy::MultiMapProxy;
pub use service::MultiMapService;
pub use stats::LocalMultiMapStats;
