use super::types::{Member, MemberId};

/// Fixed member table shared by every node of the cluster.
///
/// Liveness and membership changes belong to the surrounding runtime; this
/// table only answers "who exists" and "who am I".
#[derive(Debug, Clone)]
pub struct ClusterTopology {
    local: MemberId,
    members: Vec<Member>,
}

impl ClusterTopology {
    /// Builds the table, sorted by member id so every node derives the same order.
    pub fn new(local: MemberId, mut members: Vec<Member>) -> Self {
        members.sort_by(|a, b| a.id.cmp(&b.id));
        members.dedup_by(|a, b| a.id == b.id);
        Self { local, members }
    }

    /// A one-member cluster where the local node owns everything.
    pub fn single(local: Member) -> Self {
        let id = local.id.clone();
        Self::new(id, vec![local])
    }

    pub fn local_id(&self) -> &MemberId {
        &self.local
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn get_member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|member| &member.id == id)
    }

    pub fn remote_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|member| member.id != self.local)
    }

    pub fn is_local(&self, id: &MemberId) -> bool {
        &self.local == id
    }
}
