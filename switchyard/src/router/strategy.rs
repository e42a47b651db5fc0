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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointDescriptor;

/// How the router picks one endpoint when several match an exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// The first candidate in key order.
    #[default]
    First,
    /// Candidates in key order, rotating on every selection.
    RoundRobin,
    /// A uniformly random candidate.
    Random,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "first",
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
        };
        f.write_str(name)
    }
}

/// Applies a [`RoutingStrategy`] to candidate lists.
#[derive(Debug)]
pub(crate) struct EndpointSelector {
    strategy: RoutingStrategy,
    cursor: AtomicUsize,
}

impl EndpointSelector {
    pub(crate) const fn new(strategy: RoutingStrategy) -> Self {
        Self {
            strategy,
            cursor: AtomicUsize::new(0),
        }
    }

    pub(crate) const fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// Picks one candidate. Registry lookups come back in arbitrary order, so candidates
    /// are sorted by key first.
    pub(crate) fn select(
        &self,
        mut candidates: Vec<Arc<EndpointDescriptor>>,
    ) -> Option<Arc<EndpointDescriptor>> {
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by_key(|endpoint| endpoint.key());
        let index = match self.strategy {
            RoutingStrategy::First => 0,
            RoutingStrategy::RoundRobin => {
                self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len()
            }
            RoutingStrategy::Random => rand::rng().random_range(0..candidates.len()),
        };
        Some(candidates.swap_remove(index))
    }
}
