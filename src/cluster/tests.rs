//! Cluster Module Tests
//!
//! ## Test Scopes
//! - **Identity**: uniqueness, equality and hashing of `MemberId`.
//! - **Parsing**: the `<id>@<addr>` member form used by the node binary.
//! - **Topology**: deterministic ordering and local/remote lookups.

#[cfg(test)]
mod tests {
    use crate::cluster::topology::ClusterTopology;
    use crate::cluster::types::{Member, MemberId};
    use std::collections::HashSet;

    // ============================================================
    // MEMBER ID TESTS
    // ============================================================

    #[test]
    fn test_member_id_is_unique() {
        let id1 = MemberId::new();
        let id2 = MemberId::new();

        assert_ne!(id1, id2, "Each MemberId should be unique");
    }

    #[test]
    fn test_member_id_hash() {
        let mut set = HashSet::new();
        set.insert(MemberId::from("node-1"));
        set.insert(MemberId::from("node-1")); // duplicate
        set.insert(MemberId::from("node-2"));

        assert_eq!(set.len(), 2, "HashSet should have 2 unique MemberIds");
    }

    // ============================================================
    // MEMBER PARSING TESTS
    // ============================================================

    #[test]
    fn test_member_parse() {
        let member: Member = "node-a@127.0.0.1:6000".parse().unwrap();

        assert_eq!(member.id, MemberId::from("node-a"));
        assert_eq!(member.http_addr, "127.0.0.1:6000".parse().unwrap());
    }

    #[test]
    fn test_member_parse_rejects_malformed() {
        assert!("node-a".parse::<Member>().is_err());
        assert!("@127.0.0.1:6000".parse::<Member>().is_err());
        assert!("node-a@not-an-addr".parse::<Member>().is_err());
    }

    // ============================================================
    // TOPOLOGY TESTS
    // ============================================================

    #[test]
    fn test_topology_sorted_and_deduplicated() {
        let topology = ClusterTopology::new(
            MemberId::from("b"),
            vec![
                Member::new("c", "127.0.0.1:6003".parse().unwrap()),
                Member::new("a", "127.0.0.1:6001".parse().unwrap()),
                Member::new("b", "127.0.0.1:6002".parse().unwrap()),
                Member::new("a", "127.0.0.1:6001".parse().unwrap()),
            ],
        );

        let ids: Vec<&str> = topology.members().iter().map(|m| m.id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_topology_local_and_remote() {
        let topology = ClusterTopology::new(
            MemberId::from("a"),
            vec![
                Member::new("a", "127.0.0.1:6001".parse().unwrap()),
                Member::new("b", "127.0.0.1:6002".parse().unwrap()),
            ],
        );

        assert!(topology.is_local(&MemberId::from("a")));
        assert!(!topology.is_local(&MemberId::from("b")));

        let remote: Vec<&MemberId> = topology.remote_members().map(|m| &m.id).collect();
        assert_eq!(remote, vec![&MemberId::from("b")]);

        assert!(topology.get_member(&MemberId::from("b")).is_some());
        assert!(topology.get_member(&MemberId::from("z")).is_none());
    }
}
