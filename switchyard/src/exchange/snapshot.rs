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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::{EndpointKey, QName, Role};
use crate::exchange::{ExchangePattern, ExchangeStatus, Fault, NormalizedMessage};

/// Version written into every exchange snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable view of an exchange, written to a [`Store`](crate::traits::Store) while a
/// persistent exchange is in flight.
///
/// Endpoint descriptors are recorded by key only; restoring re-resolves them against the
/// registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Exchange identifier.
    pub exchange_id: String,
    /// Exchange pattern.
    pub pattern: ExchangePattern,
    /// Status when the snapshot was taken.
    pub status: ExchangeStatus,
    /// Role currently holding the exchange.
    pub role: Role,
    /// Ownership hand-offs performed so far.
    pub hops: u8,
    /// Whether the sender blocks for the reply.
    pub synchronous: bool,
    /// Whether the router persists the exchange.
    pub persistent: bool,
    /// Consumer endpoint, if any.
    pub source: Option<EndpointKey>,
    /// Resolved provider endpoint, if any.
    pub target: Option<EndpointKey>,
    /// Requested service.
    pub service_name: Option<QName>,
    /// Requested interface.
    pub interface_name: Option<QName>,
    /// Operation being invoked.
    pub operation: Option<QName>,
    /// Request message.
    pub in_message: Option<NormalizedMessage>,
    /// Reply message.
    pub out_message: Option<NormalizedMessage>,
    /// Business fault.
    pub fault: Option<Fault>,
    /// Cause recorded when the exchange ended in error.
    pub error: Option<String>,
    /// Exchange-level properties.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}
