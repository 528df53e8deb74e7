use super::listener::{EntryEvent, EntryListener, ListenerIdentity, ListenerRegistration};
use super::service::MultiMapService;
use super::stats::LocalMultiMapStats;
use crate::collection::LockOwner;
use crate::error::Result;
use crate::serialization::{Codec, Datum};

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Typed handle to one named multimap.
///
/// Keys and values are converted to `Datum`s by the handle's codecs, so the same
/// service can back bincode-typed handles and raw `Datum` handles at once.
/// Clones share the lock identity of the handle they came from.
pub struct MultiMapProxy<K, V> {
    name: String,
    service: Arc<MultiMapService>,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
    lock_owner: LockOwner,
}

impl<K, V> Clone for MultiMapProxy<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            service: self.service.clone(),
            key_codec: self.key_codec.clone(),
            value_codec: self.value_codec.clone(),
            lock_owner: self.lock_owner.clone(),
        }
    }
}

impl<K, V> MultiMapProxy<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn new(
        name: &str,
        service: Arc<MultiMapService>,
        key_codec: Arc<dyn Codec<K>>,
        value_codec: Arc<dyn Codec<V>>,
    ) -> Self {
        let lock_owner = LockOwner::new(service.member_id());
        Self {
            name: name.to_string(),
            service,
            key_codec,
            value_codec,
            lock_owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns false if the (key, value) pair was already stored.
    pub async fn put(&self, key: &K, value: &V) -> Result<bool> {
        self.service
            .put(&self.name, self.key_codec.encode(key)?, self.value_codec.encode(value)?)
            .await
    }

    pub async fn get(&self, key: &K) -> Result<Vec<V>> {
        let values = self.service.get(&self.name, self.key_codec.encode(key)?).await?;
        self.decode_values(&values)
    }

    pub async fn remove(&self, key: &K, value: &V) -> Result<bool> {
        self.service
            .remove(&self.name, self.key_codec.encode(key)?, self.value_codec.encode(value)?)
            .await
    }

    /// Removes the key and returns the values it held.
    pub async fn remove_all(&self, key: &K) -> Result<Vec<V>> {
        let removed = self
            .service
            .remove_all(&self.name, self.key_codec.encode(key)?)
            .await?;
        self.decode_values(&removed)
    }

    pub async fn local_key_set(&self) -> Result<HashSet<K>> {
        let keys = self.service.local_key_set(&self.name).await?;
        self.decode_keys(&keys)
    }

    pub async fn key_set(&self) -> Result<HashSet<K>> {
        let keys = self.service.key_set(&self.name).await?;
        self.decode_keys(&keys)
    }

    /// Every stored value across all partitions, duplicates included.
    pub async fn values(&self) -> Result<Vec<V>> {
        let values = self.service.values(&self.name).await?;
        self.decode_values(&values)
    }

    /// Distinct (key, value) pairs across all partitions.
    pub async fn entry_set(&self) -> Result<Vec<(K, V)>> {
        let entries = self.service.entry_set(&self.name).await?;
        entries
            .iter()
            .map(|(key, value)| -> Result<(K, V)> {
                Ok((self.key_codec.decode(key)?, self.value_codec.decode(value)?))
            })
            .collect()
    }

    pub async fn contains_key(&self, key: &K) -> Result<bool> {
        self.service
            .contains(&self.name, Some(self.key_codec.encode(key)?), None)
            .await
    }

    pub async fn contains_value(&self, value: &V) -> Result<bool> {
        self.service
            .contains(&self.name, None, Some(self.value_codec.encode(value)?))
            .await
    }

    pub async fn contains_entry(&self, key: &K, value: &V) -> Result<bool> {
        self.service
            .contains(
                &self.name,
                Some(self.key_codec.encode(key)?),
                Some(self.value_codec.encode(value)?),
            )
            .await
    }

    pub async fn value_count(&self, key: &K) -> Result<usize> {
        self.service.count(&self.name, self.key_codec.encode(key)?).await
    }

    // --- Listeners ---

    pub fn add_entry_listener<L>(&self, listener: &Arc<L>, include_value: bool) -> Result<()>
    where
        L: EntryListener<K, V> + 'static,
    {
        self.register(listener, None, include_value, false)
    }

    pub fn add_entry_listener_for_key<L>(
        &self,
        listener: &Arc<L>,
        key: &K,
        include_value: bool,
    ) -> Result<()>
    where
        L: EntryListener<K, V> + 'static,
    {
        let key = self.key_codec.encode(key)?;
        self.register(listener, Some(key), include_value, false)
    }

    /// Only events applied by partitions this member owns are delivered. Values are not included.
    pub fn add_local_entry_listener<L>(&self, listener: &Arc<L>) -> Result<()>
    where
        L: EntryListener<K, V> + 'static,
    {
        self.register(listener, None, false, true)
    }

    /// Removes every registration of `listener` on this map.
    pub fn remove_entry_listener<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.service
            .remove_entry_listener(&self.name, ListenerIdentity::of(listener), None)
    }

    pub fn remove_entry_listener_for_key<L: ?Sized>(&self, listener: &Arc<L>, key: &K) -> Result<bool> {
        let key = self.key_codec.encode(key)?;
        Ok(self
            .service
            .remove_entry_listener(&self.name, ListenerIdentity::of(listener), Some(&key)))
    }

    fn register<L>(
        &self,
        listener: &Arc<L>,
        key: Option<Datum>,
        include_value: bool,
        local_only: bool,
    ) -> Result<()>
    where
        L: EntryListener<K, V> + 'static,
    {
        let adapter = DecodingListener {
            inner: listener.clone(),
            key_codec: self.key_codec.clone(),
            value_codec: self.value_codec.clone(),
        };
        self.service.add_entry_listener(
            &self.name,
            ListenerRegistration {
                identity: ListenerIdentity::of(listener),
                key,
                include_value,
                local_only,
                listener: Arc::new(adapter),
            },
        )
    }

    // --- Locks ---

    /// Waits until this handle holds the key's lock.
    pub async fn lock(&self, key: &K) -> Result<()> {
        self.service
            .lock(&self.name, self.key_codec.encode(key)?, &self.lock_owner)
            .await
    }

    /// Takes the lock only if it is free right now.
    pub async fn try_lock(&self, key: &K) -> Result<bool> {
        self.service
            .try_lock(&self.name, self.key_codec.encode(key)?, &self.lock_owner, None)
            .await
    }

    pub async fn try_lock_for(&self, key: &K, timeout: Duration) -> Result<bool> {
        self.service
            .try_lock(
                &self.name,
                self.key_codec.encode(key)?,
                &self.lock_owner,
                Some(timeout),
            )
            .await
    }

    pub async fn unlock(&self, key: &K) -> Result<()> {
        self.service
            .unlock(&self.name, self.key_codec.encode(key)?, &self.lock_owner)
            .await
    }

    // --- Lifecycle ---

    pub async fn destroy(&self) -> Result<()> {
        self.service.destroy(&self.name).await
    }

    pub fn local_stats(&self) -> Result<LocalMultiMapStats<K>> {
        self.service
            .local_stats(&self.name)?
            .try_map_keys(|key| self.key_codec.decode(key))
    }

    fn decode_values(&self, values: &[Datum]) -> Result<Vec<V>> {
        values.iter().map(|value| self.value_codec.decode(value)).collect()
    }

    fn decode_keys<'a>(&self, keys: impl IntoIterator<Item = &'a Datum>) -> Result<HashSet<K>> {
        keys.into_iter().map(|key| self.key_codec.decode(key)).collect()
    }
}

/// Presents `Datum` events to a typed listener.
struct DecodingListener<K, V, L: ?Sized> {
    inner: Arc<L>,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
}

impl<K, V, L> DecodingListener<K, V, L>
where
    L: EntryListener<K, V> + ?Sized,
{
    fn decode(&self, event: &EntryEvent<Datum, Datum>) -> Option<EntryEvent<K, V>> {
        let decoded = (|| -> Result<EntryEvent<K, V>> {
            Ok(EntryEvent {
                map_name: event.map_name.clone(),
                key: self.key_codec.decode(&event.key)?,
                value: match &event.value {
                    Some(value) => Some(self.value_codec.decode(value)?),
                    None => None,
                },
                event_type: event.event_type,
                member: event.member.clone(),
            })
        })();

        match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Dropping undecodable event for '{}': {}", event.map_name, e);
                None
            }
        }
    }
}

impl<K, V, L> EntryListener<Datum, Datum> for DecodingListener<K, V, L>
where
    K: Send + Sync,
    V: Send + Sync,
    L: EntryListener<K, V> + ?Sized,
{
    fn entry_added(&self, event: &EntryEvent<Datum, Datum>) {
        if let Some(event) = self.decode(event) {
            self.inner.entry_added(&event);
        }
    }

    fn entry_removed(&self, event: &EntryEvent<Datum, Datum>) {
        if let Some(event) = self.decode(event) {
            self.inner.entry_removed(&event);
        }
    }
}
