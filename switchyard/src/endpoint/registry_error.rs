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

use std::fmt;

use crate::endpoint::{ComponentId, EndpointKey};

/// Errors raised by the [`EndpointRegistry`](super::EndpointRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another live component already holds this `(service, endpoint)` key.
    ///
    /// Republishing from the owning component always succeeds; only a second component
    /// claiming the same key is refused.
    DuplicateEndpoint {
        /// The contested key.
        key: EndpointKey,
        /// Component currently holding the key.
        owner: ComponentId,
        /// Component whose registration was refused.
        requested_by: ComponentId,
    },
    /// An endpoint connection already starts at this key.
    DuplicateConnection {
        /// The virtual key that is already connected.
        key: EndpointKey,
    },
    /// An external endpoint is already registered under this key.
    DuplicateExternalEndpoint {
        /// The contested key.
        key: EndpointKey,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEndpoint {
                key,
                owner,
                requested_by,
            } => write!(
                f,
                "Endpoint {key} is already registered by component {owner}; refused registration from {requested_by}"
            ),
            Self::DuplicateConnection { key } => {
                write!(f, "An endpoint connection for {key} is already registered")
            }
            Self::DuplicateExternalEndpoint { key } => {
                write!(f, "An external endpoint {key} is already registered")
            }
        }
    }
}

impl std::error::Error for RegistryError {}
