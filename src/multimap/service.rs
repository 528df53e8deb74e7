//! MultiMap Service
//!
//! Process-wide facade over every partition hosted by this member.
//!
//! ## Responsibilities
//! - **Routing**: resolves a key's partition and runs the operation in-process when the
//!   local member owns it, or forwards it through the `Transport` otherwise.
//! - **Fan-out**: whole-map reads visit every partition in parallel and merge the parts.
//!   A partition without a container contributes nothing; a failing partition fails the call.
//! - **Execution**: `execute_local` is the single entry point that touches partition state,
//!   whether the request came from a local proxy or from another member.
//! - **Locks, listeners, statistics and destroy** for every map on this member.

use super::listener::{
    EntryEvent, EntryEventType, ListenerIdentity, ListenerRegistration, ListenerRegistry,
};
use super::operation::{OpResponse, Operation};
use super::proxy::MultiMapProxy;
use super::stats::{KeyStats, LocalMultiMapStats, OperationCounters, PartitionStats};
use crate::cluster::MemberId;
use crate::collection::{LockOutcome, LockOwner, PartitionContainerRegistry};
use crate::config::ServiceConfig;
use crate::error::{MultiMapError, Result};
use crate::partition::PartitionResolver;
use crate::serialization::{BincodeCodec, Datum, RawCodec};
use crate::transport::{InvokeRequest, Transport};

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct MultiMapService {
    config: ServiceConfig,
    resolver: Arc<dyn PartitionResolver>,
    transport: Arc<dyn Transport>,
    /// Indexed by partition id. Only the locally owned ones ever hold data.
    partitions: Vec<Arc<PartitionContainerRegistry>>,
    listeners: ListenerRegistry,
    /// `op_id -> outcome` of mutations already applied here.
    processed_ops: DashMap<String, Result<OpResponse>>,
    counters: DashMap<String, OperationCounters>,
    destroyed: DashSet<String>,
}

impl MultiMapService {
    pub fn new(
        config: ServiceConfig,
        resolver: Arc<dyn PartitionResolver>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let partitions = (0..resolver.partition_count())
            .map(|partition| Arc::new(PartitionContainerRegistry::new(partition)))
            .collect();

        tracing::info!(
            "MultiMap service on {} with {} partitions ({} owned locally)",
            resolver.local_member(),
            resolver.partition_count(),
            resolver.owned_partitions().len()
        );

        Arc::new(Self {
            config,
            resolver,
            transport,
            partitions,
            listeners: ListenerRegistry::new(),
            processed_ops: DashMap::new(),
            counters: DashMap::new(),
            destroyed: DashSet::new(),
        })
    }

    pub fn member_id(&self) -> MemberId {
        self.resolver.local_member()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn PartitionResolver> {
        &self.resolver
    }

    // --- Proxies ---

    /// Typed handle that encodes keys and values with bincode.
    pub fn multimap<K, V>(self: &Arc<Self>, name: &str) -> Result<MultiMapProxy<K, V>>
    where
        K: Serialize + DeserializeOwned + Eq + Hash + Send + Sync + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.ensure_not_destroyed(name)?;
        Ok(MultiMapProxy::new(
            name,
            self.clone(),
            Arc::new(BincodeCodec::<K>::new()),
            Arc::new(BincodeCodec::<V>::new()),
        ))
    }

    /// Handle that passes `Datum`s through untouched.
    pub fn raw_multimap(self: &Arc<Self>, name: &str) -> Result<MultiMapProxy<Datum, Datum>> {
        self.ensure_not_destroyed(name)?;
        Ok(MultiMapProxy::new(
            name,
            self.clone(),
            Arc::new(RawCodec),
            Arc::new(RawCodec),
        ))
    }

    fn ensure_not_destroyed(&self, name: &str) -> Result<()> {
        if self.destroyed.contains(name) {
            return Err(MultiMapError::MapNotFound(name.to_string()));
        }
        Ok(())
    }

    // --- Single-key operations ---

    pub async fn put(&self, name: &str, key: Datum, value: Datum) -> Result<bool> {
        self.invoke_on_key(name, &key.clone(), Operation::Put { key, value })
            .await?
            .into_bool()
    }

    pub async fn get(&self, name: &str, key: Datum) -> Result<Vec<Datum>> {
        self.invoke_on_key(name, &key.clone(), Operation::Get { key })
            .await?
            .into_collection()
    }

    pub async fn remove(&self, name: &str, key: Datum, value: Datum) -> Result<bool> {
        self.invoke_on_key(name, &key.clone(), Operation::Remove { key, value })
            .await?
            .into_bool()
    }

    pub async fn remove_all(&self, name: &str, key: Datum) -> Result<Vec<Datum>> {
        self.invoke_on_key(name, &key.clone(), Operation::RemoveAll { key })
            .await?
            .into_collection()
    }

    pub async fn count(&self, name: &str, key: Datum) -> Result<usize> {
        self.invoke_on_key(name, &key.clone(), Operation::Count { key })
            .await?
            .into_count()
    }

    /// With a key the check runs on the key's partition; value-only checks visit every partition.
    pub async fn contains(
        &self,
        name: &str,
        key: Option<Datum>,
        value: Option<Datum>,
    ) -> Result<bool> {
        match key {
            Some(key) => {
                self.invoke_on_key(
                    name,
                    &key.clone(),
                    Operation::Contains {
                        key: Some(key),
                        value,
                    },
                )
                .await?
                .into_bool()
            }
            None if value.is_some() => {
                let responses = self
                    .fan_out(name, self.all_partitions(), Operation::Contains { key: None, value })
                    .await?;
                for response in responses {
                    if response.into_bool()? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            None => Err(MultiMapError::InvalidArgument(
                "contains requires a key, a value, or both".to_string(),
            )),
        }
    }

    // --- Whole-map operations ---

    pub async fn key_set(&self, name: &str) -> Result<HashSet<Datum>> {
        self.collect_keys(name, self.all_partitions()).await
    }

    /// Keys held by partitions this member owns; never leaves the process.
    pub async fn local_key_set(&self, name: &str) -> Result<HashSet<Datum>> {
        self.collect_keys(name, self.resolver.owned_partitions())
            .await
    }

    pub async fn values(&self, name: &str) -> Result<Vec<Datum>> {
        let responses = self
            .fan_out(name, self.all_partitions(), Operation::Values)
            .await?;
        let mut values = Vec::new();
        for response in responses {
            values.extend(response.into_collection()?);
        }
        Ok(values)
    }

    pub async fn entry_set(&self, name: &str) -> Result<HashSet<(Datum, Datum)>> {
        let responses = self
            .fan_out(name, self.all_partitions(), Operation::EntrySet)
            .await?;
        let mut entries = HashSet::new();
        for response in responses {
            entries.extend(response.into_entries()?);
        }
        Ok(entries)
    }

    async fn collect_keys(&self, name: &str, partitions: Vec<u32>) -> Result<HashSet<Datum>> {
        let responses = self.fan_out(name, partitions, Operation::KeySet).await?;
        let mut keys = HashSet::new();
        for response in responses {
            keys.extend(response.into_collection()?);
        }
        Ok(keys)
    }

    fn all_partitions(&self) -> Vec<u32> {
        (0..self.resolver.partition_count()).collect()
    }

    // --- Locks ---

    /// Waits until the caller holds the key's lock.
    pub async fn lock(&self, name: &str, key: Datum, owner: &LockOwner) -> Result<()> {
        match self.acquire(name, key, owner, None).await? {
            LockOutcome::Acquired => Ok(()),
            LockOutcome::HeldByCaller => Err(MultiMapError::AlreadyLocked(name.to_string())),
            LockOutcome::HeldByOther => Err(MultiMapError::Remote(format!(
                "lock wait on '{}' ended without acquiring",
                name
            ))),
        }
    }

    /// Single attempt when `timeout` is `None`, otherwise waits up to `timeout`.
    pub async fn try_lock(
        &self,
        name: &str,
        key: Datum,
        owner: &LockOwner,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout.unwrap_or_default();
        let outcome = self.acquire(name, key, owner, Some(deadline)).await?;
        Ok(outcome == LockOutcome::Acquired)
    }

    pub async fn unlock(&self, name: &str, key: Datum, owner: &LockOwner) -> Result<()> {
        let operation = Operation::Unlock {
            key: key.clone(),
            owner: owner.clone(),
        };
        self.invoke_on_key(name, &key, operation).await?.into_ack()
    }

    async fn acquire(
        &self,
        name: &str,
        key: Datum,
        owner: &LockOwner,
        deadline: Option<Instant>,
    ) -> Result<LockOutcome> {
        let partition = self.resolver.partition_of(&key);
        let lease_ms = self.config.lock_lease.map(|lease| lease.as_millis() as u64);
        let local = self.local_registry(partition);

        loop {
            // Registered before the attempt so a release in between still wakes us
            let notified = local.map(|registry| registry.locks().notified());

            let operation = Operation::TryLock {
                key: key.clone(),
                owner: owner.clone(),
                lease_ms,
            };
            let outcome = self
                .invoke_on_partition(name, partition, operation)
                .await?
                .into_lock()?;
            if outcome != LockOutcome::HeldByOther {
                return Ok(outcome);
            }

            let mut wait = self.config.lock_poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(LockOutcome::HeldByOther);
                }
                wait = wait.min(deadline - now);
            }

            tracing::trace!("Lock on '{}' partition {} busy, waiting", name, partition);
            match notified {
                Some(notified) => {
                    let _ = tokio::time::timeout(wait, notified).await;
                }
                None => tokio::time::sleep(wait).await,
            }
        }
    }

    // --- Listeners ---

    pub fn add_entry_listener(&self, name: &str, registration: ListenerRegistration) -> Result<()> {
        self.ensure_not_destroyed(name)?;
        tracing::debug!(
            "Registered entry listener on '{}' (key filter: {}, local only: {})",
            name,
            registration.key.is_some(),
            registration.local_only
        );
        self.listeners.add(name, registration);
        Ok(())
    }

    pub fn remove_entry_listener(
        &self,
        name: &str,
        identity: ListenerIdentity,
        key: Option<&Datum>,
    ) -> bool {
        self.listeners.remove(name, identity, key)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.count(name)
    }

    /// Entry point for events raised on another member.
    pub fn deliver_event(&self, event: EntryEvent<Datum, Datum>) {
        self.listeners.dispatch(&event, false);
    }

    fn emit(&self, name: &str, key: &Datum, values: Vec<Datum>, event_type: EntryEventType) {
        for value in values {
            let event = EntryEvent {
                map_name: name.to_string(),
                key: key.clone(),
                value: Some(value),
                event_type,
                member: self.member_id(),
            };
            self.listeners.dispatch(&event, true);
            if self.config.publish_events {
                self.publish(event);
            }
        }
    }

    fn publish(&self, event: EntryEvent<Datum, Datum>) {
        let local = self.member_id();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available, event for '{}' not published", event.map_name);
            return;
        };

        for member in self.resolver.members() {
            if member == local {
                continue;
            }
            let transport = self.transport.clone();
            let event = event.clone();
            runtime.spawn(async move {
                if let Err(e) = transport.publish(&member, event).await {
                    tracing::warn!("Failed to publish entry event to {}: {}", member, e);
                }
            });
        }
    }

    // --- Destroy & statistics ---

    /// Tombstones the map on every partition. Later operations on it fail with `MapNotFound`.
    /// Safe to repeat: a failed destroy leaves the name usable and can be retried.
    pub async fn destroy(&self, name: &str) -> Result<()> {
        self.fan_out(name, self.all_partitions(), Operation::Destroy)
            .await?;

        self.destroyed.insert(name.to_string());
        self.listeners.clear_map(name);
        self.counters.remove(name);
        tracing::info!("Destroyed multimap '{}'", name);
        Ok(())
    }

    /// Snapshot of the map's data in partitions owned by this member.
    pub fn local_stats(&self, name: &str) -> Result<LocalMultiMapStats<Datum>> {
        self.ensure_not_destroyed(name)?;

        let mut partitions = Vec::new();
        for partition in self.resolver.owned_partitions() {
            let Some(registry) = self.partitions.get(partition as usize) else {
                continue;
            };
            let snapshot = registry.read_container(name, |container| {
                (container.key_count(), container.value_count(), container.key_counts())
            })?;
            let locked_keys = registry.locks().locked_keys(name);
            let (key_count, value_count, mut key_counts) = snapshot.unwrap_or_default();
            if key_count == 0 && locked_keys == 0 {
                continue;
            }
            key_counts.sort();
            partitions.push(PartitionStats {
                partition,
                key_count,
                value_count,
                locked_keys,
                keys: key_counts
                    .into_iter()
                    .map(|(key, value_count)| KeyStats { key, value_count })
                    .collect(),
            });
        }

        let operations = self
            .counters
            .get(name)
            .map(|counters| counters.snapshot())
            .unwrap_or_default();

        Ok(LocalMultiMapStats {
            map_name: name.to_string(),
            member: self.member_id(),
            partitions,
            operations,
        })
    }

    /// Partition state for the migration facility.
    pub fn partition_registry(&self, partition: u32) -> Option<&Arc<PartitionContainerRegistry>> {
        self.partitions.get(partition as usize)
    }

    // --- Routing ---

    async fn invoke_on_key(&self, name: &str, key: &Datum, operation: Operation) -> Result<OpResponse> {
        let partition = self.resolver.partition_of(key);
        self.invoke_on_partition(name, partition, operation).await
    }

    async fn invoke_on_partition(
        &self,
        name: &str,
        partition: u32,
        operation: Operation,
    ) -> Result<OpResponse> {
        let owner = self
            .resolver
            .owner_of(partition)
            .ok_or(MultiMapError::NoPartitionOwner(partition))?;
        let request = InvokeRequest::new(name, partition, operation);

        if owner == self.member_id() {
            self.execute_local(request)
        } else {
            tracing::debug!(
                "Forwarding {} on '{}' partition {} to {}",
                request.operation.name(),
                name,
                partition,
                owner
            );
            self.transport.invoke(&owner, request).await
        }
    }

    /// Sends `operation` to every listed partition at once and waits for all of them.
    /// `Absent` responses are dropped; any error fails the whole call.
    async fn fan_out(
        &self,
        name: &str,
        partitions: Vec<u32>,
        operation: Operation,
    ) -> Result<Vec<OpResponse>> {
        let calls = partitions
            .iter()
            .map(|&partition| self.invoke_on_partition(name, partition, operation.clone()));
        let results = futures::future::join_all(calls).await;

        let mut responses = Vec::with_capacity(results.len());
        for (partition, result) in partitions.into_iter().zip(results) {
            match result {
                Ok(OpResponse::Absent) => continue,
                Ok(response) => responses.push(response),
                Err(e) => {
                    tracing::error!(
                        "{} on '{}' failed at partition {}: {}",
                        operation.name(),
                        name,
                        partition,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(responses)
    }

    fn local_registry(&self, partition: u32) -> Option<&Arc<PartitionContainerRegistry>> {
        if self.resolver.is_local(partition) {
            self.partitions.get(partition as usize)
        } else {
            None
        }
    }

    // --- Execution on the owning member ---

    /// Applies a request to a locally owned partition, answering replays from the dedup cache.
    pub fn execute_local(&self, request: InvokeRequest) -> Result<OpResponse> {
        let InvokeRequest {
            map_name,
            partition,
            op_id,
            operation,
        } = request;

        let registry = self
            .local_registry(partition)
            .ok_or(MultiMapError::NoPartitionOwner(partition))?;

        if let Some(op_id) = &op_id
            && let Some(cached) = self.processed_ops.get(op_id)
        {
            tracing::debug!("Replayed {} {} answered from cache", operation.name(), op_id);
            return cached.value().clone();
        }

        let kind = operation.name();
        let outcome = self.apply(&map_name, registry, operation);

        // A busy lock poll changes nothing; it is neither counted nor remembered
        if matches!(outcome, Ok(OpResponse::Lock(LockOutcome::HeldByOther))) {
            return outcome;
        }

        if outcome.is_ok() && kind != "destroy" {
            self.counters
                .entry(map_name.clone())
                .or_default()
                .record(kind);
        }

        if let Some(op_id) = op_id {
            if self.processed_ops.len() >= self.config.dedup_capacity {
                self.processed_ops.clear();
            }
            self.processed_ops.insert(op_id, outcome.clone());
        }
        outcome
    }

    fn apply(
        &self,
        name: &str,
        registry: &PartitionContainerRegistry,
        operation: Operation,
    ) -> Result<OpResponse> {
        match operation {
            Operation::Put { key, value } => {
                let added =
                    registry.with_container(name, |c| c.put(key.clone(), value.clone()))?;
                if added {
                    tracing::debug!(
                        "Stored value for '{}' in partition {}",
                        name,
                        registry.partition_id()
                    );
                    self.emit(name, &key, vec![value], EntryEventType::Added);
                }
                Ok(OpResponse::Bool(added))
            }
            Operation::Get { key } => Ok(registry
                .read_container(name, |c| c.get(&key))?
                .map(OpResponse::Collection)
                .unwrap_or(OpResponse::Absent)),
            Operation::Remove { key, value } => {
                let removed = registry
                    .read_container(name, |_| ())?
                    .is_some()
                    && registry.with_container(name, |c| c.remove(&key, &value))?;
                if removed {
                    self.emit(name, &key, vec![value], EntryEventType::Removed);
                }
                Ok(OpResponse::Bool(removed))
            }
            Operation::RemoveAll { key } => {
                let removed = match registry.read_container(name, |_| ())? {
                    Some(()) => registry.with_container(name, |c| c.remove_all(&key))?,
                    None => Vec::new(),
                };
                self.emit(name, &key, removed.clone(), EntryEventType::Removed);
                Ok(OpResponse::Collection(removed))
            }
            Operation::Contains { key, value } => {
                if key.is_none() && value.is_none() {
                    return Err(MultiMapError::InvalidArgument(
                        "contains requires a key, a value, or both".to_string(),
                    ));
                }
                match registry.read_container(name, |c| c.contains(key.as_ref(), value.as_ref()))? {
                    Some(found) => Ok(OpResponse::Bool(found?)),
                    None => Ok(OpResponse::Absent),
                }
            }
            Operation::Count { key } => Ok(OpResponse::Count(
                registry.read_container(name, |c| c.count(&key))?.unwrap_or(0),
            )),
            Operation::KeySet => Ok(registry
                .read_container(name, |c| c.key_set())?
                .map(OpResponse::Collection)
                .unwrap_or(OpResponse::Absent)),
            Operation::Values => Ok(registry
                .read_container(name, |c| c.values())?
                .map(OpResponse::Collection)
                .unwrap_or(OpResponse::Absent)),
            Operation::EntrySet => Ok(registry
                .read_container(name, |c| c.entry_set())?
                .map(OpResponse::Entries)
                .unwrap_or(OpResponse::Absent)),
            Operation::TryLock {
                key,
                owner,
                lease_ms,
            } => {
                if registry.is_destroyed(name) {
                    return Err(MultiMapError::MapNotFound(name.to_string()));
                }
                let lease = lease_ms.map(Duration::from_millis);
                Ok(OpResponse::Lock(
                    registry.locks().try_acquire(name, key, &owner, lease),
                ))
            }
            Operation::Unlock { key, owner } => {
                if registry.is_destroyed(name) {
                    return Err(MultiMapError::MapNotFound(name.to_string()));
                }
                registry.locks().release(name, &key, &owner)?;
                Ok(OpResponse::Ack)
            }
            Operation::Destroy => {
                if registry.destroy(name) {
                    tracing::debug!(
                        "Dropped data of '{}' in partition {}",
                        name,
                        registry.partition_id()
                    );
                }
                Ok(OpResponse::Ack)
            }
        }
    }
}
