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

use std::collections::BTreeSet;
use std::fmt;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::endpoint::QName;

/// Identifies one component instance inside the container.
///
/// Assigned by the deployment layer when the component starts and stable for the
/// component's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Wraps a component identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which side of an exchange a party plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Offers a service; receives requests.
    Provider,
    /// Invokes a service; originates requests.
    Consumer,
}

impl Role {
    /// The opposite role.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Provider => Self::Consumer,
            Self::Consumer => Self::Provider,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => f.write_str("PROVIDER"),
            Self::Consumer => f.write_str("CONSUMER"),
        }
    }
}

/// Registry key of an endpoint: its service name plus endpoint name.
///
/// At most one live component may hold a given key.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointKey {
    /// Service the endpoint belongs to.
    pub service_name: QName,
    /// Endpoint name, unique within the service.
    pub endpoint_name: String,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_name, self.endpoint_name)
    }
}

/// Identity of one addressable endpoint.
///
/// Descriptors are values: once handed to the
/// [`EndpointRegistry`](crate::endpoint::EndpointRegistry) they are shared behind an `Arc`
/// and never mutated. Republishing replaces the whole descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    component_id: ComponentId,
    service_name: QName,
    endpoint_name: String,
    interface_names: BTreeSet<QName>,
    role: Role,
    protocols: Vec<String>,
}

impl EndpointDescriptor {
    /// Describes a provider endpoint with no interfaces and no protocols.
    ///
    /// Use the `with_*` methods to fill in the rest before registering.
    #[must_use]
    pub fn new(
        component_id: impl Into<ComponentId>,
        service_name: impl Into<QName>,
        endpoint_name: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            service_name: service_name.into(),
            endpoint_name: endpoint_name.into(),
            interface_names: BTreeSet::new(),
            role: Role::Provider,
            protocols: Vec::new(),
        }
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn with_interface(mut self, interface_name: impl Into<QName>) -> Self {
        self.interface_names.insert(interface_name.into());
        self
    }

    /// Appends an accepted address prefix such as `"dummy:"`. Order is preserved; the
    /// first protocol is the one used when the endpoint is turned into an EPR.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// The owning component.
    #[must_use]
    pub const fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// The service this endpoint implements.
    #[must_use]
    pub const fn service_name(&self) -> &QName {
        &self.service_name
    }

    /// The endpoint name.
    #[must_use]
    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    /// Declared interfaces, possibly empty.
    #[must_use]
    pub const fn interface_names(&self) -> &BTreeSet<QName> {
        &self.interface_names
    }

    /// Whether the endpoint declares `interface_name`.
    #[must_use]
    pub fn implements(&self, interface_name: &QName) -> bool {
        self.interface_names.contains(interface_name)
    }

    /// The endpoint's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Accepted address prefixes, in declaration order.
    #[must_use]
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// The registry key.
    #[must_use]
    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(self.service_name.clone(), self.endpoint_name.clone())
    }

    /// Whether `other` names the same `(service, endpoint, component)` triple.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.service_name == other.service_name
            && self.endpoint_name == other.endpoint_name
            && self.component_id == other.component_id
    }

    /// Whether an external address designates this endpoint.
    ///
    /// With declared protocols, any address starting with one of them is accepted.
    /// Without protocols, the address must be the endpoint name or the full key.
    #[must_use]
    pub fn accepts_address(&self, address: &str) -> bool {
        if self.protocols.is_empty() {
            address == self.endpoint_name || address == self.key().to_string()
        } else {
            self.protocols
                .iter()
                .any(|protocol| address.starts_with(protocol.as_str()))
        }
    }
}
