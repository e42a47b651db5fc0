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

use serde::{Deserialize, Serialize};

/// Message exchange pattern. Governs which message slots may be filled and whether
/// the provider hands the exchange back before completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangePattern {
    /// One-way request; no reply, no fault.
    InOnly,
    /// Request and reply; the provider answers with `out` or `fault`.
    InOut,
    /// One-way request that may be answered with a fault.
    RobustInOnly,
}

impl ExchangePattern {
    /// WSDL 2.0 message exchange pattern URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::InOnly => "http://www.w3.org/2004/08/wsdl/in-only",
            Self::InOut => "http://www.w3.org/2004/08/wsdl/in-out",
            Self::RobustInOnly => "http://www.w3.org/2004/08/wsdl/robust-in-only",
        }
    }

    /// Whether the `out` slot is legal.
    #[must_use]
    pub const fn allows_out(self) -> bool {
        matches!(self, Self::InOut)
    }

    /// Whether the `fault` slot is legal.
    #[must_use]
    pub const fn allows_fault(self) -> bool {
        matches!(self, Self::InOut | Self::RobustInOnly)
    }
}

impl fmt::Display for ExchangePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InOnly => f.write_str("IN_ONLY"),
            Self::InOut => f.write_str("IN_OUT"),
            Self::RobustInOnly => f.write_str("ROBUST_IN_ONLY"),
        }
    }
}

/// Lifecycle status of an exchange. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeStatus {
    /// In progress.
    Active,
    /// Completed normally, including completion with a business fault.
    Done,
    /// Exchange handling failed (no route, processor crash, cancellation).
    Error,
}

impl ExchangeStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Done => f.write_str("DONE"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}
