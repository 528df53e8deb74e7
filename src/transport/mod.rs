//! Transport Module
//!
//! Delivers partition operations to the member that owns the partition and
//! carries entry events between members.
//!
//! ## Implementations
//! - **`HttpTransport`**: JSON over HTTP (`reqwest` client, `axum` handlers in `handlers`),
//!   with exponential backoff for retry-safe requests.
//! - **`LoopbackTransport`**: in-process delivery between services of one process, used to
//!   run several members side by side and to simulate unreachable members.

pub mod handlers;
pub mod http;
pub mod loopback;
pub mod protocol;

pub use http::HttpTransport;
pub use loopback::LoopbackTransport;
pub use protocol::{InvokeRequest, InvokeResponse};

use crate::cluster::MemberId;
use crate::error::Result;
use crate::multimap::listener::EntryEvent;
use crate::multimap::operation::OpResponse;
use crate::serialization::Datum;

use async_trait::async_trait;

/// Synchronous request/response delivery from the caller's point of view.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, target: &MemberId, request: InvokeRequest) -> Result<OpResponse>;

    async fn publish(&self, target: &MemberId, event: EntryEvent<Datum, Datum>) -> Result<()>;
}
