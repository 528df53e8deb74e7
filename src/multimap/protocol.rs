//! Public MultiMap API
//!
//! Endpoints and DTOs of the JSON API a node exposes to clients. Keys and values
//! are plain strings; the node serves them through a `MultiMapProxy<String, String>`.

use super::stats::LocalMultiMapStats;

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Stores one value under a key.
pub const ENDPOINT_PUT: &str = "/multimap/:name/put";
/// Removes one value, or every value of the key when no value is given.
pub const ENDPOINT_REMOVE: &str = "/multimap/:name/remove";
pub const ENDPOINT_GET: &str = "/multimap/:name/get/:key";
pub const ENDPOINT_KEYS: &str = "/multimap/:name/keys";
pub const ENDPOINT_VALUES: &str = "/multimap/:name/values";
pub const ENDPOINT_ENTRIES: &str = "/multimap/:name/entries";
pub const ENDPOINT_STATS: &str = "/multimap/:name/stats";
/// `DELETE` destroys the map on every partition.
pub const ENDPOINT_MAP: &str = "/multimap/:name";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PutEntryRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveEntryRequest {
    pub key: String,
    /// `None` removes the whole key.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryJson {
    pub key: String,
    pub value: String,
}

/// Envelope of every public response: exactly one of `result` and `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            result: None,
            error: Some(error.to_string()),
        }
    }
}

pub type StatsResponse = ApiResponse<LocalMultiMapStats<String>>;
