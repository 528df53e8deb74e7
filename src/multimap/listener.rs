//! Entry listener registry.
//!
//! The Service is the registry of record. Events are raised by the member that
//! applied a mutation; this module only decides which registrations see them.

use crate::cluster::MemberId;
use crate::serialization::Datum;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryEventType {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryEvent<K, V> {
    pub map_name: String,
    pub key: K,
    /// `None` when the registration did not ask for values.
    pub value: Option<V>,
    pub event_type: EntryEventType,
    /// Member that applied the mutation.
    pub member: MemberId,
}

pub trait EntryListener<K, V>: Send + Sync {
    fn entry_added(&self, _event: &EntryEvent<K, V>) {}

    fn entry_removed(&self, _event: &EntryEvent<K, V>) {}
}

/// Identity of a registered listener: the address its `Arc` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerIdentity(usize);

impl ListenerIdentity {
    pub fn of<T: ?Sized>(listener: &Arc<T>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

#[derive(Clone)]
pub struct ListenerRegistration {
    pub identity: ListenerIdentity,
    pub key: Option<Datum>,
    pub include_value: bool,
    pub local_only: bool,
    pub listener: Arc<dyn EntryListener<Datum, Datum>>,
}

impl ListenerRegistration {
    fn accepts(&self, event: &EntryEvent<Datum, Datum>, local_origin: bool) -> bool {
        if self.local_only && !local_origin {
            return false;
        }
        match &self.key {
            Some(key) => key == &event.key,
            None => true,
        }
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    registrations: DashMap<String, Vec<ListenerRegistration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, map_name: &str, registration: ListenerRegistration) {
        self.registrations
            .entry(map_name.to_string())
            .or_default()
            .push(registration);
    }

    /// Removes registrations of `identity`; with a key, only those filtered on that key.
    pub fn remove(&self, map_name: &str, identity: ListenerIdentity, key: Option<&Datum>) -> bool {
        let Some(mut registrations) = self.registrations.get_mut(map_name) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|registration| {
            let same_listener = registration.identity == identity;
            let same_key = match key {
                Some(key) => registration.key.as_ref() == Some(key),
                None => true,
            };
            !(same_listener && same_key)
        });
        before != registrations.len()
    }

    /// Delivers `event` to every matching registration and returns how many saw it.
    pub fn dispatch(&self, event: &EntryEvent<Datum, Datum>, local_origin: bool) -> usize {
        // Snapshot first so listeners may (un)register without deadlocking the map
        let targets: Vec<ListenerRegistration> = match self.registrations.get(&event.map_name) {
            Some(registrations) => registrations
                .iter()
                .filter(|registration| registration.accepts(event, local_origin))
                .cloned()
                .collect(),
            None => return 0,
        };

        for registration in targets.iter() {
            let delivered;
            let event = if registration.include_value {
                event
            } else {
                delivered = EntryEvent {
                    value: None,
                    ..event.clone()
                };
                &delivered
            };
            match event.event_type {
                EntryEventType::Added => registration.listener.entry_added(event),
                EntryEventType::Removed => registration.listener.entry_removed(event),
            }
        }

        targets.len()
    }

    pub fn clear_map(&self, map_name: &str) {
        self.registrations.remove(map_name);
    }

    pub fn count(&self, map_name: &str) -> usize {
        self.registrations
            .get(map_name)
            .map(|registrations| registrations.len())
            .unwrap_or(0)
    }
}
