//! Distributed MultiMap Library
//!
//! A partitioned multimap (key → bag of values) spread across the members of a
//! cluster. The library holds everything; the `multimap-node` binary (`main.rs`)
//! wires it to HTTP.
//!
//! ## Architecture Modules
//! - **`serialization`**: `Datum`, the byte form of keys and values, and the codecs that
//!   produce it.
//! - **`cluster`**: member identities and the static member table.
//! - **`partition`**: key → partition hashing and partition → owner assignment.
//! - **`collection`**: the per-partition containers, their registry, and per-key locks.
//! - **`multimap`**: the service that routes and fans out operations, and the typed proxy
//!   clients use.
//! - **`transport`**: delivery of operations and events to other members (HTTP or in-process).
//! - **`config`** and **`error`**: node configuration and the error taxonomy.

pub mod cluster;
pub mod collection;
pub mod config;
pub mod error;
pub mod multimap;
pub mod partition;
pub mod serialization;
pub mod transport;
