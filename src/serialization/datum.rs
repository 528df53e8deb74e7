use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized form of a user key or value.
///
/// Equality, ordering and hashing are byte-wise, so two typed values map to the
/// same partition and the same bag slot exactly when their encodings match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Datum(pub Vec<u8>);

impl Datum {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Datum {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Datum {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Datum(")?;
        for byte in self.0.iter().take(16) {
            write!(f, "{:02x}", byte)?;
        }
        if self.0.len() > 16 {
            write!(f, "..+{}", self.0.len() - 16)?;
        }
        write!(f, ")")
    }
}
