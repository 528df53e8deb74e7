//! Inter-member Protocol
//!
//! Endpoints and DTOs used when a member forwards a partition operation to the
//! partition's owner, or publishes an entry event to its peers. Bodies are JSON.

use crate::error::{MultiMapError, Result};
use crate::multimap::operation::{OpResponse, Operation};

use serde::{Deserialize, Serialize};

/// Endpoint that executes an operation on a partition owned by the receiver.
pub const ENDPOINT_INVOKE: &str = "/internal/multimap/invoke";
/// Endpoint that delivers an entry event raised on another member.
pub const ENDPOINT_EVENT: &str = "/internal/multimap/event";

/// One operation addressed to one partition of one map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub map_name: String,
    pub partition: u32,
    /// Present on mutations; the owner answers a repeated id from its dedup cache.
    pub op_id: Option<String>,
    pub operation: Operation,
}

impl InvokeRequest {
    pub fn new(map_name: &str, partition: u32, operation: Operation) -> Self {
        let op_id = operation
            .is_mutating()
            .then(|| uuid::Uuid::new_v4().to_string());
        Self {
            map_name: map_name.to_string(),
            partition,
            op_id,
            operation,
        }
    }

    /// Reads are idempotent; mutations only when they can be deduplicated.
    pub fn is_retry_safe(&self) -> bool {
        !self.operation.is_mutating() || self.op_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub outcome: std::result::Result<OpResponse, MultiMapError>,
}

impl InvokeResponse {
    pub fn into_result(self) -> Result<OpResponse> {
        self.outcome
    }
}

impl From<Result<OpResponse>> for InvokeResponse {
    fn from(outcome: Result<OpResponse>) -> Self {
        Self { outcome }
    }
}
