use super::Transport;
use super::protocol::{InvokeRequest, InvokeResponse};
use crate::cluster::MemberId;
use crate::error::{MultiMapError, Result};
use crate::multimap::listener::EntryEvent;
use crate::multimap::operation::OpResponse;
use crate::multimap::service::MultiMapService;
use crate::serialization::Datum;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Weak};

/// Routes requests between services living in the same process.
///
/// Requests and responses still pass through their JSON form so the wire DTOs
/// are exercised exactly as over HTTP.
#[derive(Default)]
pub struct LoopbackTransport {
    services: DashMap<MemberId, Weak<MultiMapService>>,
    unreachable: DashSet<MemberId>,
}

impl LoopbackTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, service: &Arc<MultiMapService>) {
        self.services
            .insert(service.member_id(), Arc::downgrade(service));
    }

    /// Unreachable members fail every request with a transport error.
    pub fn set_reachable(&self, member: &MemberId, reachable: bool) {
        if reachable {
            self.unreachable.remove(member);
        } else {
            self.unreachable.insert(member.clone());
        }
    }

    fn service(&self, target: &MemberId) -> Result<Arc<MultiMapService>> {
        if self.unreachable.contains(target) {
            return Err(MultiMapError::Transport(format!(
                "member {} unreachable",
                target
            )));
        }
        self.services
            .get(target)
            .and_then(|service| service.upgrade())
            .ok_or_else(|| MultiMapError::UnknownMember(target.to_string()))
    }
}

fn wire_round_trip<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    let bytes =
        serde_json::to_vec(value).map_err(|e| MultiMapError::Serialization(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| MultiMapError::Serialization(e.to_string()))
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn invoke(&self, target: &MemberId, request: InvokeRequest) -> Result<OpResponse> {
        let service = self.service(target)?;
        let request = wire_round_trip(&request)?;
        let response = InvokeResponse::from(service.execute_local(request));
        wire_round_trip(&response)?.into_result()
    }

    async fn publish(&self, target: &MemberId, event: EntryEvent<Datum, Datum>) -> Result<()> {
        let service = self.service(target)?;
        service.deliver_event(wire_round_trip(&event)?);
        Ok(())
    }
}
