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

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::trace;

use crate::store::{IdGenerator, StoreError};
use crate::traits::{Store, StoreFeature};

/// Process-local store backed by a sharded map. Advertises no features.
pub struct MemoryStore {
    name: String,
    entries: DashMap<String, Value>,
    ids: IdGenerator,
}

impl MemoryStore {
    /// Empty store called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            ids: IdGenerator::local(),
        }
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn features(&self) -> &'static [StoreFeature] {
        &[]
    }

    fn next_id(&self) -> String {
        self.ids.next_id()
    }

    async fn store(&self, id: &str, data: Value) -> Result<(), StoreError> {
        trace!(store = %self.name, id, "Storing entry");
        self.entries.insert(id.to_string(), data);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Value, StoreError> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.entries.remove(id);
        Ok(())
    }
}
