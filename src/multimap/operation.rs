//! Partition-scoped operations and their responses.
//!
//! The same values are executed in-process when the local member owns the
//! partition and serialized into an `InvokeRequest` when it does not.

use crate::collection::{LockOutcome, LockOwner};
use crate::error::{MultiMapError, Result};
use crate::serialization::Datum;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Put { key: Datum, value: Datum },
    Get { key: Datum },
    Remove { key: Datum, value: Datum },
    RemoveAll { key: Datum },
    Contains { key: Option<Datum>, value: Option<Datum> },
    Count { key: Datum },
    KeySet,
    Values,
    EntrySet,
    TryLock {
        key: Datum,
        owner: LockOwner,
        lease_ms: Option<u64>,
    },
    Unlock { key: Datum, owner: LockOwner },
    Destroy,
}

impl Operation {
    /// Mutations carry a dedup id so a replay is answered from cache instead of re-applied.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::Put { .. }
                | Operation::Remove { .. }
                | Operation::RemoveAll { .. }
                | Operation::TryLock { .. }
                | Operation::Unlock { .. }
                | Operation::Destroy
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Put { .. } => "put",
            Operation::Get { .. } => "get",
            Operation::Remove { .. } => "remove",
            Operation::RemoveAll { .. } => "remove_all",
            Operation::Contains { .. } => "contains",
            Operation::Count { .. } => "count",
            Operation::KeySet => "key_set",
            Operation::Values => "values",
            Operation::EntrySet => "entry_set",
            Operation::TryLock { .. } => "try_lock",
            Operation::Unlock { .. } => "unlock",
            Operation::Destroy => "destroy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpResponse {
    Bool(bool),
    Count(usize),
    Collection(Vec<Datum>),
    Entries(Vec<(Datum, Datum)>),
    Lock(LockOutcome),
    Ack,
    /// The partition has no container for the map; fan-out skips it.
    Absent,
}

impl OpResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            OpResponse::Bool(_) => "bool",
            OpResponse::Count(_) => "count",
            OpResponse::Collection(_) => "collection",
            OpResponse::Entries(_) => "entries",
            OpResponse::Lock(_) => "lock",
            OpResponse::Ack => "ack",
            OpResponse::Absent => "absent",
        }
    }

    fn unexpected(self, expected: &str) -> MultiMapError {
        MultiMapError::UnexpectedResponse {
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            OpResponse::Bool(b) => Ok(b),
            OpResponse::Absent => Ok(false),
            other => Err(other.unexpected("bool")),
        }
    }

    pub fn into_count(self) -> Result<usize> {
        match self {
            OpResponse::Count(n) => Ok(n),
            OpResponse::Absent => Ok(0),
            other => Err(other.unexpected("count")),
        }
    }

    pub fn into_collection(self) -> Result<Vec<Datum>> {
        match self {
            OpResponse::Collection(items) => Ok(items),
            OpResponse::Absent => Ok(Vec::new()),
            other => Err(other.unexpected("collection")),
        }
    }

    pub fn into_entries(self) -> Result<Vec<(Datum, Datum)>> {
        match self {
            OpResponse::Entries(entries) => Ok(entries),
            OpResponse::Absent => Ok(Vec::new()),
            other => Err(other.unexpected("entries")),
        }
    }

    pub fn into_lock(self) -> Result<LockOutcome> {
        match self {
            OpResponse::Lock(outcome) => Ok(outcome),
            other => Err(other.unexpected("lock")),
        }
    }

    pub fn into_ack(self) -> Result<()> {
        match self {
            OpResponse::Ack | OpResponse::Absent => Ok(()),
            other => Err(other.unexpected("ack")),
        }
    }
}
