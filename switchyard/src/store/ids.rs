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

use mti::prelude::*;

/// Generates store entry identifiers.
///
/// Identifiers are time-ordered UUIDv7 type ids (`entry_...`), so two nodes never collide
/// even without coordination. A node-scoped generator additionally prefixes the node id,
/// which keeps entries attributable to the node that created them in a shared store.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    node_id: Option<String>,
}

impl IdGenerator {
    /// Generator for stores local to one process.
    #[must_use]
    pub const fn local() -> Self {
        Self { node_id: None }
    }

    /// Generator whose ids are prefixed with `node_id`.
    #[must_use]
    pub fn for_node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
        }
    }

    /// Node prefix of generated ids, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    /// Returns a fresh identifier.
    #[must_use]
    pub fn next_id(&self) -> String {
        let id = "entry".create_type_id::<V7>();
        match &self.node_id {
            Some(node) => format!("{node}.{id}"),
            None => id.to_string(),
        }
    }
}
