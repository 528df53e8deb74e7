use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A cluster member that can own partitions.
///
/// `http_addr` is where the member serves internal invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub http_addr: SocketAddr,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, http_addr: SocketAddr) -> Self {
        Self {
            id: id.into(),
            http_addr,
        }
    }
}

/// Parses `<id>@<addr>`, the form used on the command line.
impl FromStr for Member {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, addr) = s
            .split_once('@')
            .ok_or_else(|| format!("expected <id>@<addr>, got '{}'", s))?;
        if id.is_empty() {
            return Err(format!("empty member id in '{}'", s));
        }
        let http_addr = addr
            .parse()
            .map_err(|e| format!("bad address '{}': {}", addr, e))?;
        Ok(Self::new(id, http_addr))
    }
}
