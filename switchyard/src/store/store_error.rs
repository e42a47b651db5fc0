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
use std::io;

/// Errors raised by [`Store`](crate::traits::Store) backends.
#[derive(Debug)]
pub enum StoreError {
    /// Writing an entry failed. Nothing was made visible to readers.
    Write {
        /// Entry being written.
        id: String,
        /// Underlying cause.
        source: io::Error,
    },
    /// No entry exists under the identifier.
    NotFound {
        /// Identifier looked up.
        id: String,
    },
    /// An I/O failure outside of writing, such as opening the backing directory or
    /// reading an entry.
    Io(io::Error),
    /// A payload could not be encoded or decoded.
    Serialization(String),
    /// A stored record was written by an incompatible format version.
    UnsupportedVersion {
        /// Entry concerned.
        id: String,
        /// Version found on disk.
        version: u32,
    },
}

impl StoreError {
    /// Whether this error reports a missing entry.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { id, source } => write!(f, "Failed to write entry '{id}': {source}"),
            Self::NotFound { id } => write!(f, "No entry found for '{id}'"),
            Self::Io(err) => write!(f, "Store I/O error: {err}"),
            Self::Serialization(reason) => write!(f, "Store serialization error: {reason}"),
            Self::UnsupportedVersion { id, version } => {
                write!(f, "Entry '{id}' has unsupported record version {version}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
