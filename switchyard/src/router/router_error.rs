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
use std::time::Duration;

use crate::endpoint::ComponentId;
use crate::exchange::ExchangeError;
use crate::store::StoreError;

/// Errors reported by the [`Router`](crate::router::Router).
#[derive(Debug)]
pub enum RouterError {
    /// No live endpoint matches the exchange's address. The exchange has been failed.
    NoRoute {
        /// Exchange that could not be routed.
        exchange_id: String,
        /// Human-readable description of the address that was tried.
        address: String,
    },
    /// The provider's processor refused the exchange. The exchange has been failed.
    Rejected {
        /// Exchange that was refused.
        exchange_id: String,
        /// The processor's error, with its causes.
        reason: String,
    },
    /// A synchronous send or an `accept` ran out of time.
    Timeout {
        /// Exchange being waited on; `None` for `accept`.
        exchange_id: Option<String>,
        /// How long the caller waited.
        waited: Duration,
    },
    /// The target component has neither a processor nor a queue connected.
    ComponentNotConnected(ComponentId),
    /// The router is shutting down and takes no new work.
    ShuttingDown,
    /// The exchange refused a transition.
    Exchange(ExchangeError),
    /// Persisting the exchange failed.
    Store(StoreError),
}

impl RouterError {
    /// Whether this is a routing failure that ended the exchange in error.
    #[must_use]
    pub const fn is_no_route(&self) -> bool {
        matches!(self, Self::NoRoute { .. })
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoute {
                exchange_id,
                address,
            } => write!(f, "No route for exchange {exchange_id} addressed to {address}"),
            Self::Rejected {
                exchange_id,
                reason,
            } => write!(f, "Exchange {exchange_id} rejected by provider: {reason}"),
            Self::Timeout {
                exchange_id: Some(id),
                waited,
            } => write!(f, "Timed out after {waited:?} waiting for exchange {id}"),
            Self::Timeout {
                exchange_id: None,
                waited,
            } => write!(f, "Timed out after {waited:?} waiting for an exchange"),
            Self::ComponentNotConnected(component) => {
                write!(f, "Component '{component}' is not connected to the router")
            }
            Self::ShuttingDown => f.write_str("Router is shutting down"),
            Self::Exchange(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "Failed to persist exchange: {err}"),
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exchange(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExchangeError> for RouterError {
    fn from(err: ExchangeError) -> Self {
        Self::Exchange(err)
    }
}

impl From<StoreError> for RouterError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
