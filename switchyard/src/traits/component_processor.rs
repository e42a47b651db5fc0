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
use std::future::Future;

use async_trait::async_trait;

use crate::exchange::MessageExchange;

/// Push-delivery callback of a component.
///
/// The [`Router`](crate::router::Router) calls [`process`](ComponentProcessor::process)
/// with the exchange once ownership has passed to the provider. Before returning, the
/// processor must leave the exchange either terminal (`done`/`fail`) or with a reply set
/// for the router to hand back. An exchange left in any other state is failed by the
/// router. Returning `Err` rejects the exchange, which also ends it in error.
///
/// Long-running processors should watch the exchange, e.g. with
/// [`MessageExchange::wait_for_completion`], so a cancellation by the consumer is noticed.
#[async_trait]
pub trait ComponentProcessor: Send + Sync + 'static {
    /// Handles one delivered exchange.
    async fn process(&self, exchange: MessageExchange) -> anyhow::Result<()>;
}

/// [`ComponentProcessor`] backed by an async closure. Built with [`processor_fn`].
pub struct FnProcessor<F> {
    handler: F,
}

impl<F> fmt::Debug for FnProcessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ComponentProcessor for FnProcessor<F>
where
    F: Fn(MessageExchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn process(&self, exchange: MessageExchange) -> anyhow::Result<()> {
        (self.handler)(exchange).await
    }
}

/// Wraps an async closure as a [`ComponentProcessor`].
///
/// ```
/// use switchyard::prelude::*;
///
/// let echo = processor_fn(|exchange: MessageExchange| async move {
///     let request = exchange.in_message().unwrap_or_default();
///     exchange.set_out_message(request)?;
///     Ok::<_, anyhow::Error>(())
/// });
/// # let _ = echo;
/// ```
pub const fn processor_fn<F, Fut>(handler: F) -> FnProcessor<F>
where
    F: Fn(MessageExchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    FnProcessor { handler }
}
