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

//! Directory-backed store: one JSON record per entry, replaced atomically.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, trace, warn};

use crate::store::{IdGenerator, StoreError};
use crate::traits::{Store, StoreFeature};

/// Version written into every record.
const RECORD_VERSION: u32 = 1;
const RECORD_EXTENSION: &str = "json";

const PERSISTENT_FEATURES: &[StoreFeature] = &[StoreFeature::Persistent];
const CLUSTERED_FEATURES: &[StoreFeature] = &[StoreFeature::Persistent, StoreFeature::Clustered];

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    version: u32,
    id: String,
    data: Value,
}

/// Store that keeps each entry as a file in a directory.
///
/// Writes go to a temporary file that is flushed to disk and then renamed over the
/// target, so a reader sees either the previous record or the new one and a failed write
/// leaves nothing behind. On Unix the directory is synced after the rename as well.
///
/// A store opened with [`FileStore::clustered`] is meant to sit on a directory shared by
/// every node. Renames are atomic on the shared filesystem, so a completed write is
/// immediately visible to all nodes; such stores advertise `CLUSTERED` as well as
/// `PERSISTENT`.
#[derive(Debug)]
pub struct FileStore {
    name: String,
    directory: PathBuf,
    features: &'static [StoreFeature],
    ids: IdGenerator,
}

impl FileStore {
    /// Opens a persistent store in `directory`, creating it if needed.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(directory.into(), PERSISTENT_FEATURES, IdGenerator::local()).await
    }

    /// Opens a clustered store in a directory shared between nodes. Generated ids carry
    /// `node_id` as a prefix.
    pub async fn clustered(
        directory: impl Into<PathBuf>,
        node_id: impl Into<String>,
    ) -> Result<Self, StoreError> {
        Self::open_with(
            directory.into(),
            CLUSTERED_FEATURES,
            IdGenerator::for_node(node_id),
        )
        .await
    }

    #[instrument(skip(features, ids))]
    async fn open_with(
        directory: PathBuf,
        features: &'static [StoreFeature],
        ids: IdGenerator,
    ) -> Result<Self, StoreError> {
        fs::create_dir_all(&directory).await?;
        let name = directory
            .file_name()
            .map_or_else(|| "store".to_string(), |name| name.to_string_lossy().into_owned());
        debug!(store = %name, "Opened file store");
        Ok(Self {
            name,
            directory,
            features,
            ids,
        })
    }

    /// Directory holding the records.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{RECORD_EXTENSION}", encode_file_name(id)))
    }

}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn features(&self) -> &'static [StoreFeature] {
        self.features
    }

    fn next_id(&self) -> String {
        self.ids.next_id()
    }

    async fn store(&self, id: &str, data: Value) -> Result<(), StoreError> {
        let record = StoredRecord {
            version: RECORD_VERSION,
            id: id.to_string(),
            data,
        };
        let bytes = serde_json::to_vec(&record)?;
        let path = self.record_path(id);
        let suffix: u64 = rand::rng().random();
        let temp_path = self
            .directory
            .join(format!(".{}.{suffix:016x}.tmp", encode_file_name(id)));

        if let Err(source) = write_record(&path, &temp_path, &bytes).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temporary record");
                }
            }
            return Err(StoreError::Write {
                id: id.to_string(),
                source,
            });
        }
        trace!(store = %self.name, id, "Stored entry");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Value, StoreError> {
        let bytes = match fs::read(self.record_path(id)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Err(err) => return Err(err.into()),
        };
        let record: StoredRecord = serde_json::from_slice(&bytes)?;
        if record.version != RECORD_VERSION {
            return Err(StoreError::UnsupportedVersion {
                id: id.to_string(),
                version: record.version,
            });
        }
        Ok(record.data)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

async fn write_record(path: &Path, temp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, path).await?;
    sync_parent(path).await
}

/// Flushes the directory entry created by a rename.
#[cfg(unix)]
async fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::File::open(parent).await?.sync_all().await,
        None => Ok(()),
    }
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Maps an arbitrary id onto a portable file name. ASCII alphanumerics, `-` and `_` are
/// kept; every other byte is percent-encoded.
fn encode_file_name(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}
