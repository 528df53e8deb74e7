//! Node and service configuration.
//!
//! `ServiceConfig` is what the library needs; `NodeArgs` is the command line of
//! the `multimap-node` binary and turns into a topology plus a `ServiceConfig`.

use crate::cluster::{ClusterTopology, Member, MemberId};

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PARTITION_COUNT: u32 = 256;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub partition_count: u32,
    /// Per-attempt timeout for remote invocations.
    pub request_timeout: Duration,
    pub read_attempts: usize,
    /// Only honoured because every mutation carries a dedup id.
    pub write_attempts: usize,
    /// `None` keeps a lock until it is released.
    pub lock_lease: Option<Duration>,
    pub lock_poll_interval: Duration,
    pub dedup_capacity: usize,
    pub publish_events: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            partition_count: DEFAULT_PARTITION_COUNT,
            request_timeout: Duration::from_millis(500),
            read_attempts: 3,
            write_attempts: 3,
            lock_lease: Some(Duration::from_secs(60)),
            lock_poll_interval: Duration::from_millis(50),
            dedup_capacity: 10_000,
            publish_events: true,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "multimap-node", about = "Partitioned multimap cluster member")]
pub struct NodeArgs {
    /// Address this member serves HTTP on.
    #[arg(long)]
    pub bind: SocketAddr,

    /// Identity of this member; generated when omitted.
    #[arg(long)]
    pub member_id: Option<String>,

    /// Other cluster members as <id>@<addr>. Repeat for each member.
    #[arg(long = "member")]
    pub members: Vec<Member>,

    #[arg(long, default_value_t = DEFAULT_PARTITION_COUNT)]
    pub partitions: u32,

    #[arg(long, default_value_t = 500)]
    pub request_timeout_ms: u64,

    /// 0 disables lock leases.
    #[arg(long, default_value_t = 60_000)]
    pub lock_lease_ms: u64,

    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

impl NodeArgs {
    pub fn into_parts(self) -> anyhow::Result<(ClusterTopology, ServiceConfig, SocketAddr)> {
        if self.partitions == 0 {
            anyhow::bail!("--partitions must be at least 1");
        }

        let local_id = self
            .member_id
            .map(MemberId)
            .unwrap_or_else(MemberId::new);

        if self.members.iter().any(|member| member.id == local_id) {
            anyhow::bail!("--member must not repeat the local member id {}", local_id);
        }

        let mut members = self.members;
        members.push(Member {
            id: local_id.clone(),
            http_addr: self.bind,
        });

        let config = ServiceConfig {
            partition_count: self.partitions,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            lock_lease: (self.lock_lease_ms > 0).then(|| Duration::from_millis(self.lock_lease_ms)),
            ..ServiceConfig::default()
        };

        Ok((ClusterTopology::new(local_id, members), config, self.bind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_args_into_parts() {
        let args = NodeArgs::parse_from([
            "multimap-node",
            "--bind",
            "127.0.0.1:6001",
            "--member-id",
            "a",
            "--member",
            "b@127.0.0.1:6002",
            "--partitions",
            "64",
            "--lock-lease-ms",
            "0",
        ]);

        let (topology, config, bind) = args.into_parts().unwrap();

        assert_eq!(bind, "127.0.0.1:6001".parse().unwrap());
        assert_eq!(topology.local_id(), &MemberId::from("a"));
        assert_eq!(topology.members().len(), 2);
        assert_eq!(config.partition_count, 64);
        assert_eq!(config.lock_lease, None);
    }

    #[test]
    fn test_node_args_reject_duplicate_local_member() {
        let args = NodeArgs::parse_from([
            "multimap-node",
            "--bind",
            "127.0.0.1:6001",
            "--member-id",
            "a",
            "--member",
            "a@127.0.0.1:6002",
        ]);

        assert!(args.into_parts().is_err());
    }

    #[test]
    fn test_node_args_reject_zero_partitions() {
        let args = NodeArgs::parse_from([
            "multimap-node",
            "--bind",
            "127.0.0.1:6001",
            "--partitions",
            "0",
        ]);

        assert!(args.into_parts().is_err());
    }
}
