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
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::common::SwitchyardConfig;
use crate::store::{FileStore, MemoryStore, StoreError};
use crate::traits::Store;

/// Which backend a [`StoreFactory`] opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// [`MemoryStore`]; no features.
    #[default]
    Memory,
    /// [`FileStore::open`]; `PERSISTENT`.
    File,
    /// [`FileStore::clustered`]; `PERSISTENT` and `CLUSTERED`.
    Clustered,
}

/// Opens stores by name and hands out the same instance for repeated names.
///
/// File-backed stores live in a subdirectory of the factory's directory named after the
/// store.
pub struct StoreFactory {
    backend: StoreBackend,
    directory: PathBuf,
    node_id: String,
    stores: DashMap<String, Arc<dyn Store>>,
}

impl StoreFactory {
    /// Factory for `backend` stores kept under `directory`. `node_id` names this node
    /// for clustered stores.
    pub fn new(backend: StoreBackend, directory: impl Into<PathBuf>, node_id: impl Into<String>) -> Self {
        Self {
            backend,
            directory: directory.into(),
            node_id: node_id.into(),
            stores: DashMap::new(),
        }
    }

    /// Factory configured from the `[store]` section.
    pub fn from_config(config: &SwitchyardConfig) -> Self {
        Self::new(
            config.store.backend,
            config.store_directory(),
            config.store.node_id.clone(),
        )
    }

    /// Backend of every store this factory opens.
    #[must_use]
    pub const fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Returns the store called `name`, opening it on first use.
    #[instrument(skip(self), fields(backend = ?self.backend))]
    pub async fn open(&self, name: &str) -> Result<Arc<dyn Store>, StoreError> {
        if let Some(store) = self.stores.get(name) {
            return Ok(Arc::clone(store.value()));
        }
        let store: Arc<dyn Store> = match self.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new(name)),
            StoreBackend::File => Arc::new(FileStore::open(self.directory.join(name)).await?),
            StoreBackend::Clustered => Arc::new(
                FileStore::clustered(self.directory.join(name), self.node_id.clone()).await?,
            ),
        };
        debug!(store = name, "Opened store");
        // Another task may have opened the same name meanwhile; the first one wins.
        let entry = self.stores.entry(name.to_string()).or_insert(store);
        Ok(Arc::clone(entry.value()))
    }
}

impl fmt::Debug for StoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFactory")
            .field("backend", &self.backend)
            .field("directory", &self.directory)
            .field("stores", &self.stores.len())
            .finish_non_exhaustive()
    }
}
