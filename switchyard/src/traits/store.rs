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

use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::StoreError;

/// Name of the durability feature: entries survive a process restart.
pub const PERSISTENT: &str = "PERSISTENT";
/// Name of the cluster feature: entries written on one node are visible on the others.
pub const CLUSTERED: &str = "CLUSTERED";
/// Name of the transactional feature. Recognised, but no bundled backend advertises it.
pub const TRANSACTIONAL: &str = "TRANSACTIONAL";

/// A capability a [`Store`] backend may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFeature {
    /// Entries survive a process restart.
    Persistent,
    /// Entries written on one node are visible on the others.
    Clustered,
    /// Writes can take part in a transaction.
    Transactional,
}

impl StoreFeature {
    /// The feature's canonical name, as accepted by [`Store::has_feature`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Persistent => PERSISTENT,
            Self::Clustered => CLUSTERED,
            Self::Transactional => TRANSACTIONAL,
        }
    }

    /// Parses a canonical feature name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            PERSISTENT => Some(Self::Persistent),
            CLUSTERED => Some(Self::Clustered),
            TRANSACTIONAL => Some(Self::Transactional),
            _ => None,
        }
    }
}

/// Keyed persistence for opaque JSON payloads.
///
/// Implementations must be safe to share across tasks. A failed [`store`](Store::store)
/// must never leave a partially written entry visible to [`load`](Store::load).
#[async_trait]
pub trait Store: Debug + Send + Sync {
    /// Name this store was opened under.
    fn name(&self) -> &str;

    /// Features this backend guarantees.
    fn features(&self) -> &'static [StoreFeature];

    /// Produces a fresh identifier for [`store_new`](Store::store_new).
    fn next_id(&self) -> String;

    /// Whether the backend advertises the named feature. Unknown names return `false`.
    fn has_feature(&self, name: &str) -> bool {
        StoreFeature::from_name(name).is_some_and(|feature| self.features().contains(&feature))
    }

    /// Inserts or replaces the entry under `id`.
    async fn store(&self, id: &str, data: Value) -> Result<(), StoreError>;

    /// Stores `data` under a freshly generated identifier and returns it.
    async fn store_new(&self, data: Value) -> Result<String, StoreError> {
        let id = self.next_id();
        self.store(&id, data).await?;
        Ok(id)
    }

    /// Reads the entry under `id`, failing with [`StoreError::NotFound`] if absent.
    async fn load(&self, id: &str) -> Result<Value, StoreError>;

    /// Removes the entry under `id`. Removing a missing entry is not an error.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;
}

/// Typed helpers available on every [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    /// Serializes `value` and stores it under `id`.
    async fn store_typed<T>(&self, id: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let data = serde_json::to_value(value)?;
        self.store(id, data).await
    }

    /// Loads the entry under `id` and deserializes it.
    async fn load_typed<T>(&self, id: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        let data = self.load(id).await?;
        Ok(serde_json::from_value(data)?)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
