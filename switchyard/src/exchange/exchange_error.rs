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

use crate::exchange::ExchangeStatus;

/// Errors raised when an exchange is mutated or waited on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The exchange is already `Done` or `Error`; nothing about it may change.
    IllegalState {
        /// Exchange concerned.
        exchange_id: String,
        /// Its terminal status.
        status: ExchangeStatus,
        /// What was attempted.
        action: &'static str,
    },
    /// The exchange is active but the attempted step is not allowed by its pattern,
    /// its current owner, or the slots filled so far.
    IllegalTransition {
        /// Exchange concerned.
        exchange_id: String,
        /// Why the step was refused.
        reason: String,
    },
    /// A wait on the exchange expired before the awaited progress happened.
    Timeout {
        /// Exchange concerned.
        exchange_id: String,
    },
}

impl ExchangeError {
    /// Whether this is an illegal-state condition: a mutation of a terminal exchange or
    /// an illegal transition. Timeouts are not.
    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState { .. } | Self::IllegalTransition { .. })
    }

    /// The exchange the error refers to.
    #[must_use]
    pub fn exchange_id(&self) -> &str {
        match self {
            Self::IllegalState { exchange_id, .. }
            | Self::IllegalTransition { exchange_id, .. }
            | Self::Timeout { exchange_id } => exchange_id,
        }
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalState {
                exchange_id,
                status,
                action,
            } => write!(f, "Cannot {action} exchange {exchange_id}: status is {status}"),
            Self::IllegalTransition {
                exchange_id,
                reason,
            } => write!(f, "Illegal transition on exchange {exchange_id}: {reason}"),
            Self::Timeout { exchange_id } => {
                write!(f, "Timed out waiting on exchange {exchange_id}")
            }
        }
    }
}

impl std::error::Error for ExchangeError {}
