/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Endpoint registry: indexes activated endpoints by key, service, interface and owner.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace, warn};

use super::registry_error::RegistryError;
use crate::endpoint::{
    ComponentId, EndpointDescriptor, EndpointKey, EndpointReference, QName,
};

/// Capacity of the endpoint event channel. Slow subscribers observe `Lagged` rather
/// than holding up registration.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Notification emitted whenever the set of live endpoints changes.
#[derive(Debug, Clone)]
pub enum EndpointEvent {
    /// A descriptor was published, either new or replacing one from the same component.
    Registered(Arc<EndpointDescriptor>),
    /// A descriptor was withdrawn.
    Unregistered(Arc<EndpointDescriptor>),
    /// An external endpoint was published.
    ExternalRegistered(Arc<EndpointDescriptor>),
    /// An external endpoint was withdrawn.
    ExternalUnregistered(Arc<EndpointDescriptor>),
}

/// Thread-safe index of activated endpoints.
///
/// The primary map is keyed by [`EndpointKey`] and owns the published descriptors.
/// Secondary indices map service and interface names to keys. All maps are sharded
/// [`DashMap`]s, so registration and lookups on unrelated keys never contend on a global
/// lock.
///
/// # Consistency
///
/// A registration updates the secondary indices while still holding the primary entry,
/// and lookups resolve keys through the primary map, so a lookup never observes a
/// descriptor whose indices are half written. Indices are always taken after the primary
/// map and never the other way round.
pub struct EndpointRegistry {
    /// Published descriptors keyed by `(service, endpoint)`.
    endpoints: DashMap<EndpointKey, Arc<EndpointDescriptor>>,
    /// Service name to keys of endpoints implementing it.
    by_service: DashMap<QName, HashSet<EndpointKey>>,
    /// Interface name to keys of endpoints declaring it.
    by_interface: DashMap<QName, HashSet<EndpointKey>>,
    /// Interfaces pinned to one specific endpoint.
    interface_connections: DashMap<QName, EndpointKey>,
    /// Virtual `(service, endpoint)` keys linked to concrete endpoints.
    endpoint_connections: DashMap<EndpointKey, EndpointKey>,
    /// Proxies through which external consumers reach internal services. Never routed to.
    external_endpoints: DashMap<EndpointKey, Arc<EndpointDescriptor>>,
    /// Change notifications.
    events: broadcast::Sender<EndpointEvent>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("endpoints", &self.endpoints.len())
            .field("services", &self.by_service.len())
            .field("interfaces", &self.by_interface.len())
            .field("interface_connections", &self.interface_connections.len())
            .field("endpoint_connections", &self.endpoint_connections.len())
            .field("external_endpoints", &self.external_endpoints.len())
            .finish()
    }
}

impl EndpointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            endpoints: DashMap::new(),
            by_service: DashMap::new(),
            by_interface: DashMap::new(),
            interface_connections: DashMap::new(),
            endpoint_connections: DashMap::new(),
            external_endpoints: DashMap::new(),
            events,
        }
    }

    /// Publishes a descriptor under its `(service, endpoint)` key.
    ///
    /// If the owning component already published this key, the new descriptor replaces
    /// the old one atomically and the interface index is adjusted to the new interface
    /// set.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateEndpoint`] if a different component holds the key.
    #[instrument(skip(self, descriptor), fields(key = %descriptor.key(), component = %descriptor.component_id()))]
    pub fn register(
        &self,
        descriptor: EndpointDescriptor,
    ) -> Result<Arc<EndpointDescriptor>, RegistryError> {
        let key = descriptor.key();
        let descriptor = Arc::new(descriptor);

        match self.endpoints.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let owner = occupied.get().component_id().clone();
                if &owner != descriptor.component_id() {
                    warn!(%owner, "Refusing registration of an endpoint held by another component");
                    return Err(RegistryError::DuplicateEndpoint {
                        key,
                        owner,
                        requested_by: descriptor.component_id().clone(),
                    });
                }
                let previous = occupied.insert(Arc::clone(&descriptor));
                for stale in previous.interface_names().difference(descriptor.interface_names()) {
                    self.unindex_interface(stale, &key);
                }
                self.index(&descriptor, &key);
                debug!("Republished endpoint");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&descriptor));
                self.index(&descriptor, &key);
                debug!("Registered endpoint");
            }
        }

        let _ = self.events.send(EndpointEvent::Registered(Arc::clone(&descriptor)));
        Ok(descriptor)
    }

    /// Withdraws the endpoint `(service_name, endpoint_name)` owned by `component_id`.
    ///
    /// Absent keys and keys owned by another component are left alone; neither is an
    /// error. Returns the removed descriptor, if any.
    #[instrument(skip(self))]
    pub fn unregister(
        &self,
        component_id: &ComponentId,
        service_name: &QName,
        endpoint_name: &str,
    ) -> Option<Arc<EndpointDescriptor>> {
        let key = EndpointKey::new(service_name.clone(), endpoint_name.to_string());
        let removed = match self.endpoints.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                if occupied.get().component_id() != component_id {
                    debug!(owner = %occupied.get().component_id(), "Ignoring unregister from non-owning component");
                    return None;
                }
                self.unindex(occupied.get(), &key);
                occupied.remove()
            }
            Entry::Vacant(_) => {
                trace!("Unregister of unknown endpoint is a no-op");
                return None;
            }
        };

        debug!("Unregistered endpoint");
        let _ = self.events.send(EndpointEvent::Unregistered(Arc::clone(&removed)));
        Some(removed)
    }

    /// Withdraws every endpoint owned by `component_id`, returning how many were removed.
    pub fn unregister_component(&self, component_id: &ComponentId) -> usize {
        self.endpoints_for_component(component_id)
            .iter()
            .filter_map(|descriptor| {
                self.unregister(
                    component_id,
                    descriptor.service_name(),
                    descriptor.endpoint_name(),
                )
            })
            .count()
    }

    /// Looks up one endpoint by key.
    #[must_use]
    pub fn get(&self, service_name: &QName, endpoint_name: &str) -> Option<Arc<EndpointDescriptor>> {
        let key = EndpointKey::new(service_name.clone(), endpoint_name.to_string());
        self.endpoints.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// All endpoints implementing `service_name`, in no particular order.
    ///
    /// Endpoint connections starting in `service_name` contribute the endpoints they link
    /// to, unless a live endpoint holds the connection's own key.
    #[must_use]
    pub fn lookup_by_service(&self, service_name: &QName) -> Vec<Arc<EndpointDescriptor>> {
        let mut keys = Self::keys_in(&self.by_service, service_name);
        let linked: Vec<EndpointKey> = self
            .endpoint_connections
            .iter()
            .filter(|link| &link.key().service_name == service_name)
            .filter(|link| !self.endpoints.contains_key(link.key()))
            .map(|link| link.value().clone())
            .collect();
        for key in linked {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.resolve_keys(keys)
    }

    /// All endpoints declaring `interface_name`, in no particular order.
    ///
    /// When the interface is pinned with [`connect_interface`](Self::connect_interface),
    /// only the pinned endpoint is returned, or nothing if it is not currently registered.
    #[must_use]
    pub fn lookup_by_interface(&self, interface_name: &QName) -> Vec<Arc<EndpointDescriptor>> {
        let pinned = self
            .interface_connections
            .get(interface_name)
            .map(|entry| entry.value().clone());
        if let Some(key) = pinned {
            return match self.endpoints.get(&key) {
                Some(entry) => vec![Arc::clone(entry.value())],
                None => {
                    warn!(interface = %interface_name, target = %key, "Interface connection points at an unregistered endpoint");
                    Vec::new()
                }
            };
        }
        let keys = Self::keys_in(&self.by_interface, interface_name);
        self.resolve_keys(keys)
    }

    /// All endpoints owned by `component_id`.
    #[must_use]
    pub fn endpoints_for_component(&self, component_id: &ComponentId) -> Vec<Arc<EndpointDescriptor>> {
        self.endpoints
            .iter()
            .filter(|entry| entry.value().component_id() == component_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Pins `interface_name` to the endpoint `(service_name, endpoint_name)`.
    ///
    /// Replaces any earlier connection for the same interface.
    pub fn connect_interface(&self, interface_name: QName, service_name: QName, endpoint_name: impl Into<String>) {
        let key = EndpointKey::new(service_name, endpoint_name.into());
        debug!(interface = %interface_name, target = %key, "Connecting interface");
        self.interface_connections.insert(interface_name, key);
    }

    /// Removes an interface connection. Returns `true` if one existed.
    pub fn disconnect_interface(&self, interface_name: &QName) -> bool {
        self.interface_connections.remove(interface_name).is_some()
    }

    /// Links the virtual endpoint `(from_service, from_endpoint)` to the concrete endpoint
    /// `(to_service, to_endpoint)`.
    ///
    /// Exchanges addressed to the virtual key, explicitly or through its service, are
    /// delivered to the concrete endpoint. The concrete endpoint need not be registered
    /// yet; the link is followed at lookup time.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateConnection`] if a connection already starts at the
    /// virtual key.
    pub fn connect_endpoint(
        &self,
        from_service: QName,
        from_endpoint: impl Into<String>,
        to_service: QName,
        to_endpoint: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let from = EndpointKey::new(from_service, from_endpoint.into());
        let to = EndpointKey::new(to_service, to_endpoint.into());
        match self.endpoint_connections.entry(from.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateConnection { key: from }),
            Entry::Vacant(vacant) => {
                debug!(%from, target = %to, "Connecting endpoint");
                vacant.insert(to);
                Ok(())
            }
        }
    }

    /// Removes the endpoint connection starting at `(service_name, endpoint_name)`.
    /// Returns `true` if one existed.
    pub fn disconnect_endpoint(&self, service_name: &QName, endpoint_name: &str) -> bool {
        let key = EndpointKey::new(service_name.clone(), endpoint_name.to_string());
        self.endpoint_connections.remove(&key).is_some()
    }

    /// Follows the endpoint connection starting at `key` to a live descriptor.
    ///
    /// `None` when no connection starts there or its target is not registered.
    #[must_use]
    pub fn connected_endpoint(&self, key: &EndpointKey) -> Option<Arc<EndpointDescriptor>> {
        let target = self
            .endpoint_connections
            .get(key)
            .map(|entry| entry.value().clone())?;
        let live = self.endpoints.get(&target).map(|entry| Arc::clone(entry.value()));
        if live.is_none() {
            warn!(from = %key, %target, "Endpoint connection points at an unregistered endpoint");
        }
        live
    }

    /// Publishes an external endpoint: a proxy external consumers use to reach an
    /// internal service under a different endpoint name.
    ///
    /// External endpoints are only listed by the `external_endpoints_*` lookups; the
    /// router never delivers to them.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateExternalEndpoint`] if the key is already taken.
    #[instrument(skip(self, descriptor), fields(key = %descriptor.key(), component = %descriptor.component_id()))]
    pub fn register_external(
        &self,
        descriptor: EndpointDescriptor,
    ) -> Result<Arc<EndpointDescriptor>, RegistryError> {
        let key = descriptor.key();
        let descriptor = Arc::new(descriptor);
        match self.external_endpoints.entry(key.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateExternalEndpoint { key }),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&descriptor));
            }
        }
        debug!("Registered external endpoint");
        let _ = self
            .events
            .send(EndpointEvent::ExternalRegistered(Arc::clone(&descriptor)));
        Ok(descriptor)
    }

    /// Withdraws an external endpoint, returning it if it was registered.
    pub fn unregister_external(
        &self,
        service_name: &QName,
        endpoint_name: &str,
    ) -> Option<Arc<EndpointDescriptor>> {
        let key = EndpointKey::new(service_name.clone(), endpoint_name.to_string());
        let (_, removed) = self.external_endpoints.remove(&key)?;
        debug!(%key, "Unregistered external endpoint");
        let _ = self
            .events
            .send(EndpointEvent::ExternalUnregistered(Arc::clone(&removed)));
        Some(removed)
    }

    /// External endpoints of `service_name`.
    #[must_use]
    pub fn external_endpoints_for_service(&self, service_name: &QName) -> Vec<Arc<EndpointDescriptor>> {
        self.external_endpoints
            .iter()
            .filter(|entry| entry.value().service_name() == service_name)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// External endpoints declaring `interface_name`.
    #[must_use]
    pub fn external_endpoints_for_interface(&self, interface_name: &QName) -> Vec<Arc<EndpointDescriptor>> {
        self.external_endpoints
            .iter()
            .filter(|entry| entry.value().implements(interface_name))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Turns an external endpoint reference back into a live descriptor.
    ///
    /// The reference's service name and element local part select the candidate, and its
    /// address must be accepted by the candidate's protocols. If the element name does not
    /// match, endpoints of the same service are searched for one whose protocol prefix plus
    /// endpoint name spells the address.
    ///
    /// `None` means "not resolvable locally"; it is not a failure.
    #[must_use]
    pub fn resolve(&self, reference: &EndpointReference) -> Option<Arc<EndpointDescriptor>> {
        let address = reference.address_or_id();
        if let Some(candidate) = self.get(reference.service_name(), reference.element_name().local_part()) {
            if candidate.accepts_address(address) {
                trace!(endpoint = %candidate.key(), "Resolved endpoint reference by element name");
                return Some(candidate);
            }
        }

        let resolved = self
            .lookup_by_service(reference.service_name())
            .into_iter()
            .find(|candidate| {
                candidate.protocols().iter().any(|protocol| {
                    address
                        .strip_prefix(protocol.as_str())
                        .is_some_and(|rest| rest == candidate.endpoint_name())
                })
            });
        if resolved.is_none() {
            trace!(service = %reference.service_name(), address, "Endpoint reference is not locally resolvable");
        }
        resolved
    }

    /// Builds the external reference for `descriptor`. Pure and deterministic.
    #[must_use]
    pub fn to_epr(&self, descriptor: &EndpointDescriptor) -> EndpointReference {
        EndpointReference::from(descriptor)
    }

    /// Subscribes to registration changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EndpointEvent> {
        self.events.subscribe()
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` when no endpoints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Withdraws every endpoint, external endpoint and connection.
    ///
    /// Used during container teardown, after in-flight exchanges have been drained.
    pub fn clear(&self) {
        let descriptors: Vec<_> = self
            .endpoints
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for descriptor in &descriptors {
            self.unregister(
                descriptor.component_id(),
                descriptor.service_name(),
                descriptor.endpoint_name(),
            );
        }
        self.interface_connections.clear();
        self.endpoint_connections.clear();
        self.external_endpoints.clear();
        debug!(removed = descriptors.len(), "Cleared endpoint registry");
    }

    fn keys_in(index: &DashMap<QName, HashSet<EndpointKey>>, name: &QName) -> Vec<EndpointKey> {
        index
            .get(name)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn resolve_keys(&self, keys: Vec<EndpointKey>) -> Vec<Arc<EndpointDescriptor>> {
        keys.into_iter()
            .filter_map(|key| self.endpoints.get(&key).map(|entry| Arc::clone(entry.value())))
            .collect()
    }

    fn index(&self, descriptor: &EndpointDescriptor, key: &EndpointKey) {
        self.by_service
            .entry(descriptor.service_name().clone())
            .or_default()
            .insert(key.clone());
        for interface_name in descriptor.interface_names() {
            self.by_interface
                .entry(interface_name.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    fn unindex(&self, descriptor: &EndpointDescriptor, key: &EndpointKey) {
        Self::remove_from(&self.by_service, descriptor.service_name(), key);
        for interface_name in descriptor.interface_names() {
            self.unindex_interface(interface_name, key);
        }
    }

    fn unindex_interface(&self, interface_name: &QName, key: &EndpointKey) {
        Self::remove_from(&self.by_interface, interface_name, key);
    }

    fn remove_from(index: &DashMap<QName, HashSet<EndpointKey>>, name: &QName, key: &EndpointKey) {
        index.remove_if_mut(name, |_, keys| {
            keys.remove(key);
            keys.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(component: &str) -> EndpointDescriptor {
        EndpointDescriptor::new(component, "urn:x:dummy#DummyComponent", "epr")
            .with_interface("{urn:x:dummy}DummyInterface")
            .with_protocol("dummy:")
    }

    #[test]
    fn replacing_drops_stale_interfaces() {
        let registry = EndpointRegistry::new();
        registry.register(dummy("c1")).unwrap();
        let replacement = EndpointDescriptor::new("c1", "urn:x:dummy#DummyComponent", "epr")
            .with_interface("{urn:x:dummy}Other");
        registry.register(replacement).unwrap();

        assert!(registry
            .lookup_by_interface(&QName::parse("{urn:x:dummy}DummyInterface"))
            .is_empty());
        assert_eq!(
            registry
                .lookup_by_interface(&QName::parse("{urn:x:dummy}Other"))
                .len(),
            1
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_index_entries_are_pruned() {
        let registry = EndpointRegistry::new();
        registry.register(dummy("c1")).unwrap();
        registry.unregister(
            &ComponentId::from("c1"),
            &QName::parse("urn:x:dummy#DummyComponent"),
            "epr",
        );
        assert!(registry.by_service.is_empty());
        assert!(registry.by_interface.is_empty());
    }

    #[test]
    fn non_owner_cannot_unregister() {
        let registry = EndpointRegistry::new();
        registry.register(dummy("c1")).unwrap();
        let removed = registry.unregister(
            &ComponentId::from("c2"),
            &QName::parse("urn:x:dummy#DummyComponent"),
            "epr",
        );
        assert!(removed.is_none());
        assert_eq!(registry.len(), 1);
    }
}
