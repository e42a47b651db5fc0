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
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The container's payload envelope, independent of any wire format.
///
/// `content` is opaque to the core: transports put whatever they unmarshal there and
/// components agree on its shape. `properties` carry out-of-band metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    content: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Value>,
}

impl NormalizedMessage {
    /// Wraps a payload.
    #[must_use]
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property, replacing any previous value under `name`.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// The payload.
    #[must_use]
    pub const fn content(&self) -> &Value {
        &self.content
    }

    /// Looks up a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All properties.
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }
}

/// A business-level fault returned by a provider.
///
/// A fault is a normal outcome: the exchange still completes with `Done`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fault(NormalizedMessage);

impl Fault {
    /// Wraps a fault payload.
    #[must_use]
    pub fn new(content: impl Into<Value>) -> Self {
        Self(NormalizedMessage::new(content))
    }

    /// The underlying message.
    #[must_use]
    pub const fn message(&self) -> &NormalizedMessage {
        &self.0
    }
}

impl From<NormalizedMessage> for Fault {
    fn from(message: NormalizedMessage) -> Self {
        Self(message)
    }
}

impl Deref for Fault {
    type Target = NormalizedMessage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
