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
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use static_assertions::assert_impl_all;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::common::SwitchyardConfig;
use crate::endpoint::{ComponentId, EndpointDescriptor, EndpointRegistry, Role};
use crate::exchange::{ExchangeSnapshot, ExchangeStatus, MessageExchange, SNAPSHOT_VERSION};
use crate::router::strategy::EndpointSelector;
use crate::router::{RouterError, RoutingStrategy};
use crate::store::StoreError;
use crate::traits::{ComponentProcessor, Store, StoreExt};

/// Cause recorded when a processor returns without completing or replying.
const UNFINISHED_CAUSE: &str = "processor returned without completing the exchange";
const DISCONNECTED_CAUSE: &str = "component disconnected";

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Queue feeding a pull-style component.
#[derive(Clone)]
struct PullQueue {
    sender: mpsc::Sender<MessageExchange>,
    receiver: Arc<AsyncMutex<mpsc::Receiver<MessageExchange>>>,
    /// Cancelled when the component is disconnected; wakes its pending `accept` calls.
    closed: CancellationToken,
}

/// How exchanges reach a connected component.
#[derive(Clone)]
enum Delivery {
    /// The router calls the processor.
    Push(Arc<dyn ComponentProcessor>),
    /// The component fetches exchanges with [`Router::accept`].
    Pull(PullQueue),
}

struct RouterInner {
    registry: Arc<EndpointRegistry>,
    components: DashMap<ComponentId, Delivery>,
    in_flight: DashMap<String, MessageExchange>,
    drained: Notify,
    selector: EndpointSelector,
    store: Option<Arc<dyn Store>>,
    persist_all: bool,
    sync_timeout: Duration,
    queue_capacity: usize,
    /// Cancelled when the router stops taking new sends.
    closing: CancellationToken,
    /// Cancelled once the router has stopped; wakes pending `accept` calls.
    stopped: CancellationToken,
}

/// Moves exchanges between components.
///
/// The router resolves an exchange's provider through the [`EndpointRegistry`], hands
/// ownership of the exchange to it and delivers it to the provider's component, either by
/// calling its [`ComponentProcessor`] (push) or by queueing it for
/// [`accept`](Router::accept) (pull). It never touches message content; it only moves
/// ownership and fails exchanges that cannot be routed.
///
/// # Resolution
///
/// 1. An explicit target endpoint is used as is, provided it is still registered to
///    the same component. A target that is not registered but starts an endpoint
///    connection is replaced by the connected endpoint.
/// 2. Otherwise endpoints of the requested service are considered, restricted to those
///    implementing the requested interface if one is given as well. Endpoint connections
///    starting in the service contribute their targets.
/// 3. Otherwise endpoints implementing the requested interface are considered, honoring
///    interface connections made in the registry.
///
/// Only provider endpoints whose component is connected to the router are candidates;
/// the configured [`RoutingStrategy`] picks among them. No candidate means
/// [`RouterError::NoRoute`] and the exchange ends in error.
///
/// `Router` is a cheap handle; clones share the same state.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

assert_impl_all!(Router: Send, Sync, Clone);
assert_impl_all!(MessageExchange: Send, Sync, Clone);

/// Builder returned by [`Router::builder`].
#[must_use]
pub struct RouterBuilder {
    registry: Arc<EndpointRegistry>,
    strategy: RoutingStrategy,
    store: Option<Arc<dyn Store>>,
    persist_all: bool,
    sync_timeout: Duration,
    queue_capacity: usize,
}

impl RouterBuilder {
    /// How one endpoint is chosen among several candidates.
    pub const fn strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Store used for persistent exchanges.
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist every exchange, not only those flagged persistent.
    pub const fn persist_all(mut self, persist_all: bool) -> Self {
        self.persist_all = persist_all;
        self
    }

    /// How long a synchronous send waits for its reply.
    pub const fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Capacity of each pull-style component queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Applies the routing, timeout and limit settings of `config`.
    pub fn with_config(self, config: &SwitchyardConfig) -> Self {
        self.strategy(config.routing.strategy)
            .persist_all(config.behavior.persist_exchanges)
            .sync_timeout(config.sync_send_timeout())
            .queue_capacity(config.limits.component_queue_capacity)
    }

    /// Builds the router. No component is connected yet.
    pub fn build(self) -> Router {
        Router {
            inner: Arc::new(RouterInner {
                registry: self.registry,
                components: DashMap::new(),
                in_flight: DashMap::new(),
                drained: Notify::new(),
                selector: EndpointSelector::new(self.strategy),
                store: self.store,
                persist_all: self.persist_all,
                sync_timeout: self.sync_timeout,
                queue_capacity: self.queue_capacity,
                closing: CancellationToken::new(),
                stopped: CancellationToken::new(),
            }),
        }
    }
}

impl Router {
    /// Router with default settings over `registry`.
    #[must_use]
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self::builder(registry).build()
    }

    /// Starts configuring a router over `registry`.
    pub fn builder(registry: Arc<EndpointRegistry>) -> RouterBuilder {
        RouterBuilder {
            registry,
            strategy: RoutingStrategy::default(),
            store: None,
            persist_all: false,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Registry used to resolve targets.
    #[must_use]
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.inner.registry
    }

    /// Strategy used to pick among matching endpoints.
    #[must_use]
    pub fn strategy(&self) -> RoutingStrategy {
        self.inner.selector.strategy()
    }

    /// Connects a push-style component. Replaces any earlier connection.
    pub fn connect_processor<P>(&self, component_id: impl Into<ComponentId>, processor: P)
    where
        P: ComponentProcessor,
    {
        let component_id = component_id.into();
        debug!(component = %component_id, "Connecting push component");
        self.replace_delivery(component_id, Delivery::Push(Arc::new(processor)));
    }

    /// Connects a pull-style component, which fetches its exchanges with
    /// [`accept`](Self::accept). Replaces any earlier connection.
    pub fn connect_queue(&self, component_id: impl Into<ComponentId>) {
        let component_id = component_id.into();
        debug!(component = %component_id, "Connecting pull component");
        let (sender, receiver) = mpsc::channel(self.inner.queue_capacity);
        let queue = PullQueue {
            sender,
            receiver: Arc::new(AsyncMutex::new(receiver)),
            closed: CancellationToken::new(),
        };
        self.replace_delivery(component_id, Delivery::Pull(queue));
    }

    fn replace_delivery(&self, component_id: ComponentId, delivery: Delivery) {
        if let Some(previous) = self.inner.components.insert(component_id, delivery) {
            Self::close_delivery(previous);
        }
    }

    /// Disconnects a component. Exchanges still queued for it end in error and pending
    /// [`accept`](Self::accept) calls return [`RouterError::ComponentNotConnected`].
    /// Returns `true` if the component was connected.
    pub fn disconnect(&self, component_id: &ComponentId) -> bool {
        match self.inner.components.remove(component_id) {
            Some((_, delivery)) => {
                debug!(component = %component_id, "Disconnecting component");
                Self::close_delivery(delivery);
                true
            }
            None => false,
        }
    }

    /// Disconnects every component.
    pub fn disconnect_all(&self) {
        let components: Vec<ComponentId> = self
            .inner
            .components
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for component_id in components {
            self.disconnect(&component_id);
        }
    }

    fn close_delivery(delivery: Delivery) {
        let Delivery::Pull(PullQueue {
            sender,
            receiver,
            closed,
        }) = delivery
        else {
            return;
        };
        closed.cancel();
        drop(sender);

        let drained = match receiver.try_lock() {
            Ok(mut queued) => {
                Self::fail_queued(&mut queued);
                true
            }
            Err(_) => false,
        };
        if drained {
            return;
        }
        // A pending `accept` holds the lock until it observes the cancellation.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut queued = receiver.lock().await;
                    Self::fail_queued(&mut queued);
                });
            }
            Err(_) => warn!("No runtime to drain the queue of a disconnected component"),
        }
    }

    /// Closes a pull queue and fails everything still waiting in it.
    fn fail_queued(receiver: &mut mpsc::Receiver<MessageExchange>) {
        receiver.close();
        while let Ok(exchange) = receiver.try_recv() {
            if exchange.fail(DISCONNECTED_CAUSE).is_ok() {
                trace!(exchange_id = %exchange.id(), "Failed queued exchange of disconnected component");
            }
        }
    }

    /// Whether `component_id` is connected.
    #[must_use]
    pub fn is_connected(&self, component_id: &ComponentId) -> bool {
        self.inner.components.contains_key(component_id)
    }

    /// Number of exchanges delivered but not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Sends an exchange to the other party.
    ///
    /// For an exchange the consumer has not sent yet, this resolves and delivers it to a
    /// provider. Synchronous exchanges return once the reply is back (or the exchange
    /// ended); asynchronous ones return once the provider owns the exchange. For an
    /// exchange held by the provider, this is [`respond`](Self::respond). A terminal
    /// exchange is not sent again; its status is returned.
    ///
    /// # Errors
    ///
    /// * [`RouterError::NoRoute`] when no live endpoint matches; the exchange is failed.
    /// * [`RouterError::Rejected`] when a push processor returns an error; the exchange
    ///   is failed.
    /// * [`RouterError::Timeout`] when a synchronous send gets no reply in time; the
    ///   exchange is failed.
    /// * [`RouterError::Exchange`] when the exchange is not ready to be sent.
    /// * [`RouterError::ShuttingDown`] once shutdown has begun.
    #[instrument(skip(self, exchange), fields(exchange_id = %exchange.id()))]
    pub async fn send(&self, exchange: &MessageExchange) -> Result<ExchangeStatus, RouterError> {
        let status = exchange.status();
        if status.is_terminal() {
            return Ok(status);
        }
        if exchange.role() == Role::Provider {
            return self.respond(exchange).await;
        }
        if self.inner.closing.is_cancelled() {
            return Err(RouterError::ShuttingDown);
        }

        let target = self.resolve_target(exchange)?;
        let delivery = self
            .inner
            .components
            .get(target.component_id())
            .map(|entry| entry.value().clone());
        let Some(delivery) = delivery else {
            let component_id = target.component_id().clone();
            Self::fail_quietly(exchange, &format!("component '{component_id}' is not connected"));
            return Err(RouterError::ComponentNotConnected(component_id));
        };

        exchange.dispatch_to(Arc::clone(&target))?;
        debug!(endpoint = %target.key(), component = %target.component_id(), "Delivering exchange");
        if self.should_persist(exchange) {
            if let Err(err) = self.persist(exchange).await {
                Self::fail_quietly(exchange, &format!("failed to persist exchange: {err}"));
                return Err(err.into());
            }
        }
        self.track(exchange);

        match delivery {
            Delivery::Push(processor) => self.push(exchange, processor).await,
            Delivery::Pull(queue) => {
                self.enqueue(exchange, queue, target.component_id()).await
            }
        }
    }

    /// Hands a provider's reply back to the consumer.
    ///
    /// Used by pull-style components once they have set `out` or `fault`; push processors
    /// can simply return. A terminal exchange is left alone and its status returned.
    #[instrument(skip(self, exchange), fields(exchange_id = %exchange.id()))]
    pub async fn respond(&self, exchange: &MessageExchange) -> Result<ExchangeStatus, RouterError> {
        let status = exchange.status();
        if status.is_terminal() {
            return Ok(status);
        }
        exchange.hand_back()?;
        trace!("Reply handed back to consumer");
        if self.should_persist(exchange) {
            self.persist(exchange).await?;
        }
        Ok(exchange.status())
    }

    /// Fetches the next exchange queued for a pull-style component.
    ///
    /// `None` waits without bound. Exchanges that were ended while queued are skipped.
    ///
    /// # Errors
    ///
    /// * [`RouterError::Timeout`] when nothing arrives in time.
    /// * [`RouterError::ShuttingDown`] once the router has stopped.
    /// * [`RouterError::ComponentNotConnected`] when the component has no queue.
    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        component_id: &ComponentId,
        timeout: Option<Duration>,
    ) -> Result<MessageExchange, RouterError> {
        let queue = self
            .inner
            .components
            .get(component_id)
            .and_then(|entry| match entry.value() {
                Delivery::Pull(queue) => Some((Arc::clone(&queue.receiver), queue.closed.clone())),
                Delivery::Push(_) => None,
            });
        let Some((receiver, closed)) = queue else {
            return Err(RouterError::ComponentNotConnected(component_id.clone()));
        };

        let next = async {
            let mut receiver = receiver.lock().await;
            while let Some(exchange) = receiver.recv().await {
                if exchange.status().is_terminal() {
                    trace!(exchange_id = %exchange.id(), "Skipping exchange ended while queued");
                    continue;
                }
                return Some(exchange);
            }
            None
        };
        let bounded = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, next).await.map_err(|_| {
                    RouterError::Timeout {
                        exchange_id: None,
                        waited: limit,
                    }
                }),
                None => Ok(next.await),
            }
        };

        tokio::select! {
            biased;
            () = self.inner.stopped.cancelled() => Err(RouterError::ShuttingDown),
            () = closed.cancelled() => Err(RouterError::ComponentNotConnected(component_id.clone())),
            received = bounded => received?
                .ok_or_else(|| RouterError::ComponentNotConnected(component_id.clone())),
        }
    }

    /// Loads a persisted exchange and rebuilds it against the current registry.
    pub async fn restore_exchange(&self, exchange_id: &str) -> Result<MessageExchange, RouterError> {
        let Some(store) = &self.inner.store else {
            return Err(StoreError::NotFound {
                id: exchange_id.to_string(),
            }
            .into());
        };
        let snapshot: ExchangeSnapshot = store.load_typed(exchange_id).await?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                id: exchange_id.to_string(),
                version: snapshot.version,
            }
            .into());
        }
        Ok(MessageExchange::restore(snapshot, &self.inner.registry))
    }

    fn resolve_target(&self, exchange: &MessageExchange) -> Result<Arc<EndpointDescriptor>, RouterError> {
        let registry = &self.inner.registry;
        let resolved = if let Some(target) = exchange.target() {
            match registry.get(target.service_name(), target.endpoint_name()) {
                Some(live) => Some(live).filter(|live| live.component_id() == target.component_id()),
                None => registry.connected_endpoint(&target.key()),
            }
            .filter(|live| self.is_routable(live))
        } else {
            let interface = exchange.interface_name();
            let mut candidates = match (exchange.service_name(), &interface) {
                (Some(service), Some(interface)) => {
                    let mut found = registry.lookup_by_service(&service);
                    found.retain(|endpoint| endpoint.implements(interface));
                    found
                }
                (Some(service), None) => registry.lookup_by_service(&service),
                (None, Some(interface)) => registry.lookup_by_interface(interface),
                (None, None) => Vec::new(),
            };
            candidates.retain(|endpoint| self.is_routable(endpoint));
            self.inner.selector.select(candidates)
        };

        resolved.ok_or_else(|| {
            let address = describe_address(exchange);
            warn!(%address, "No route for exchange");
            Self::fail_quietly(exchange, &format!("no route to {address}"));
            RouterError::NoRoute {
                exchange_id: exchange.id().to_string(),
                address,
            }
        })
    }

    fn is_routable(&self, endpoint: &EndpointDescriptor) -> bool {
        endpoint.role() == Role::Provider && self.inner.components.contains_key(endpoint.component_id())
    }

    async fn push(
        &self,
        exchange: &MessageExchange,
        processor: Arc<dyn ComponentProcessor>,
    ) -> Result<ExchangeStatus, RouterError> {
        if !exchange.is_synchronous() {
            let exchange = exchange.clone();
            tokio::spawn(async move {
                let outcome = processor.process(exchange.clone()).await;
                if let Err(err) = Self::after_processing(&exchange, outcome) {
                    warn!(exchange_id = %exchange.id(), error = %err, "Asynchronous delivery failed");
                }
            });
            return Ok(ExchangeStatus::Active);
        }

        // Either party ending the exchange releases the sender; the processor task is left
        // to finish on its own.
        let limit = self.inner.sync_timeout;
        let processing = {
            let exchange = exchange.clone();
            tokio::spawn(async move { processor.process(exchange).await })
        };
        tokio::select! {
            biased;
            joined = processing => {
                let outcome = joined.unwrap_or_else(|err| Err(anyhow::anyhow!("processor panicked: {err}")));
                Self::after_processing(exchange, outcome)?;
                Ok(exchange.status())
            }
            ended = exchange.wait_for_completion(None) => {
                trace!("Exchange ended while its processor was still running");
                Ok(ended?)
            }
            () = tokio::time::sleep(limit) => Err(Self::timed_out(exchange, limit)),
        }
    }

    async fn enqueue(
        &self,
        exchange: &MessageExchange,
        queue: PullQueue,
        component_id: &ComponentId,
    ) -> Result<ExchangeStatus, RouterError> {
        let queued = tokio::select! {
            biased;
            () = self.inner.stopped.cancelled() => Err(RouterError::ShuttingDown),
            () = queue.closed.cancelled() => Err(RouterError::ComponentNotConnected(component_id.clone())),
            sent = queue.sender.send(exchange.clone()) => {
                sent.map_err(|_| RouterError::ComponentNotConnected(component_id.clone()))
            }
        };
        if let Err(err) = queued {
            Self::fail_quietly(exchange, &err.to_string());
            return Err(err);
        }
        trace!("Exchange queued for pull delivery");

        if !exchange.is_synchronous() {
            return Ok(ExchangeStatus::Active);
        }
        let limit = self.inner.sync_timeout;
        match exchange.wait_for_reply(Some(limit)).await {
            Ok(status) => Ok(status),
            Err(_) => Err(Self::timed_out(exchange, limit)),
        }
    }

    /// Settles a push delivery once the processor has returned.
    fn after_processing(exchange: &MessageExchange, outcome: anyhow::Result<()>) -> Result<(), RouterError> {
        if let Err(err) = outcome {
            let reason = format!("{err:#}");
            if exchange.fail(reason.clone()).is_ok() {
                return Err(RouterError::Rejected {
                    exchange_id: exchange.id().to_string(),
                    reason,
                });
            }
            warn!(exchange_id = %exchange.id(), %reason, "Processor failed after ending the exchange");
            return Ok(());
        }
        if exchange.reply_ready() && exchange.hand_back().is_ok() {
            return Ok(());
        }
        if exchange.status().is_terminal() || exchange.role() == Role::Consumer {
            return Ok(());
        }
        if exchange.fail(UNFINISHED_CAUSE).is_ok() {
            warn!(exchange_id = %exchange.id(), "Processor left the exchange unfinished; failed it");
        }
        Ok(())
    }

    fn timed_out(exchange: &MessageExchange, waited: Duration) -> RouterError {
        Self::fail_quietly(exchange, &format!("no reply within {waited:?}"));
        RouterError::Timeout {
            exchange_id: Some(exchange.id().to_string()),
            waited,
        }
    }

    /// Fails the exchange unless it already ended.
    fn fail_quietly(exchange: &MessageExchange, cause: &str) {
        if let Err(err) = exchange.fail(cause) {
            trace!(exchange_id = %exchange.id(), error = %err, "Exchange already ended");
        }
    }

    fn should_persist(&self, exchange: &MessageExchange) -> bool {
        let wanted = self.inner.persist_all || exchange.is_persistent();
        if wanted && self.inner.store.is_none() {
            trace!(exchange_id = %exchange.id(), "No store configured; exchange not persisted");
        }
        wanted && self.inner.store.is_some()
    }

    async fn persist(&self, exchange: &MessageExchange) -> Result<(), StoreError> {
        let Some(store) = &self.inner.store else {
            return Ok(());
        };
        store.store_typed(exchange.id(), &exchange.snapshot()).await
    }

    /// Records a delivered exchange and forgets it once it ends.
    fn track(&self, exchange: &MessageExchange) {
        self.inner
            .in_flight
            .insert(exchange.id().to_string(), exchange.clone());
        let persisted = self.should_persist(exchange);
        let inner = Arc::clone(&self.inner);
        let exchange = exchange.clone();
        tokio::spawn(async move {
            let status = exchange.wait_for_completion(None).await;
            trace!(exchange_id = %exchange.id(), ?status, "Exchange settled");
            if persisted {
                if let Some(store) = &inner.store {
                    if let Err(err) = store.remove(exchange.id()).await {
                        warn!(exchange_id = %exchange.id(), error = %err, "Failed to remove persisted exchange");
                    }
                }
            }
            inner.in_flight.remove(exchange.id());
            if inner.in_flight.is_empty() {
                inner.drained.notify_waiters();
            }
        });
    }

    /// Stops accepting new sends. In-flight exchanges continue.
    pub fn begin_shutdown(&self) {
        self.inner.closing.cancel();
    }

    /// Whether [`begin_shutdown`](Self::begin_shutdown) has been called.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.inner.closing.is_cancelled()
    }

    /// Waits up to `limit` for every in-flight exchange to end. Returns `true` if none
    /// remain.
    pub async fn drain(&self, limit: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.inner.drained.notified();
                if self.inner.in_flight.is_empty() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }

    /// Fails every exchange still in flight. Returns how many were failed.
    pub fn fail_in_flight(&self, cause: &str) -> usize {
        let remaining: Vec<MessageExchange> = self
            .inner
            .in_flight
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        remaining
            .iter()
            .filter(|exchange| exchange.fail(cause).is_ok())
            .count()
    }

    /// Stops the router: refuses sends, wakes pending `accept` calls and disconnects every
    /// component.
    pub fn stop(&self) {
        self.inner.closing.cancel();
        self.inner.stopped.cancel();
        self.disconnect_all();
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("strategy", &self.inner.selector.strategy())
            .field("components", &self.inner.components.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("closing", &self.inner.closing.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn describe_address(exchange: &MessageExchange) -> String {
    if let Some(target) = exchange.target() {
        return format!("endpoint {}", target.key());
    }
    match (exchange.service_name(), exchange.interface_name()) {
        (Some(service), Some(interface)) => format!("service {service} with interface {interface}"),
        (Some(service), None) => format!("service {service}"),
        (None, Some(interface)) => format!("interface {interface}"),
        (None, None) => "no address".to_string(),
    }
}
