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

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mti::prelude::*;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::endpoint::{EndpointDescriptor, EndpointRegistry, QName, Role};
use crate::exchange::{
    ExchangeError, ExchangePattern, ExchangeSnapshot, ExchangeStatus, Fault, NormalizedMessage,
    SNAPSHOT_VERSION,
};

/// Lifecycle progress published to waiters whenever ownership or status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    status: ExchangeStatus,
    owner: Role,
    hops: u8,
}

/// Mutable part of an exchange. Always accessed under the exchange lock.
#[derive(Debug)]
struct ExchangeCore {
    status: ExchangeStatus,
    owner: Role,
    hops: u8,
    source: Option<Arc<EndpointDescriptor>>,
    target: Option<Arc<EndpointDescriptor>>,
    service_name: Option<QName>,
    interface_name: Option<QName>,
    operation: Option<QName>,
    in_message: Option<NormalizedMessage>,
    out_message: Option<NormalizedMessage>,
    fault: Option<Fault>,
    error: Option<String>,
    properties: BTreeMap<String, Value>,
}

impl ExchangeCore {
    const fn new() -> Self {
        Self {
            status: ExchangeStatus::Active,
            owner: Role::Consumer,
            hops: 0,
            source: None,
            target: None,
            service_name: None,
            interface_name: None,
            operation: None,
            in_message: None,
            out_message: None,
            fault: None,
            error: None,
            properties: BTreeMap::new(),
        }
    }

    const fn progress(&self) -> Progress {
        Progress {
            status: self.status,
            owner: self.owner,
            hops: self.hops,
        }
    }

    const fn has_reply(&self) -> bool {
        self.out_message.is_some() || self.fault.is_some()
    }
}

struct ExchangeInner {
    id: String,
    pattern: ExchangePattern,
    synchronous: bool,
    persistent: bool,
    core: Mutex<ExchangeCore>,
    progress: watch::Sender<Progress>,
}

/// One routed unit of work between a consumer and a provider.
///
/// `MessageExchange` is a cheap, cloneable handle; every clone refers to the same
/// exchange. All state changes go through a per-exchange lock, so when two parties race
/// to move the same exchange, exactly one transition wins and the other observes
/// [`ExchangeError::IllegalState`].
///
/// # Lifecycle
///
/// An exchange starts `Active` and owned by the consumer. Sending it hands ownership to
/// the provider; for patterns with a reply, the provider fills `out` or `fault` and the
/// router hands it back. Either side may end it with [`done`](Self::done) once the
/// pattern's slots are satisfied, or with [`fail`](Self::fail) at any point while it is
/// active. `Done` and `Error` are terminal.
///
/// # Examples
///
/// ```
/// use switchyard::prelude::*;
///
/// let exchange = MessageExchange::in_out()
///     .service("{urn:example}Echo")
///     .in_message(NormalizedMessage::new("ping"))
///     .build();
/// assert_eq!(exchange.status(), ExchangeStatus::Active);
/// assert_eq!(exchange.role(), Role::Consumer);
/// ```
#[derive(Clone)]
pub struct MessageExchange {
    inner: Arc<ExchangeInner>,
}

/// Builder returned by [`MessageExchange::builder`].
#[derive(Debug)]
#[must_use]
pub struct ExchangeBuilder {
    pattern: ExchangePattern,
    synchronous: bool,
    persistent: bool,
    core: ExchangeCore,
}

impl ExchangeBuilder {
    /// Addresses the exchange by service name.
    pub fn service(mut self, service_name: impl Into<QName>) -> Self {
        self.core.service_name = Some(service_name.into());
        self
    }

    /// Addresses the exchange by interface name.
    pub fn interface(mut self, interface_name: impl Into<QName>) -> Self {
        self.core.interface_name = Some(interface_name.into());
        self
    }

    /// Addresses the exchange to a specific endpoint.
    pub fn endpoint(mut self, endpoint: Arc<EndpointDescriptor>) -> Self {
        self.core.target = Some(endpoint);
        self
    }

    /// Records the consumer endpoint sending the exchange.
    pub fn source(mut self, endpoint: Arc<EndpointDescriptor>) -> Self {
        self.core.source = Some(endpoint);
        self
    }

    /// Sets the operation being invoked.
    pub fn operation(mut self, operation: impl Into<QName>) -> Self {
        self.core.operation = Some(operation.into());
        self
    }

    /// Sets the request message.
    pub fn in_message(mut self, message: NormalizedMessage) -> Self {
        self.core.in_message = Some(message);
        self
    }

    /// Whether [`Router::send`](crate::router::Router::send) should block for the reply.
    pub const fn synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Whether the router should persist the exchange while it is in flight.
    pub const fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Sets an exchange-level property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.core.properties.insert(name.into(), value.into());
        self
    }

    /// Creates the exchange with a fresh identifier.
    pub fn build(self) -> MessageExchange {
        let id = "exchange".create_type_id::<V7>().to_string();
        MessageExchange::from_parts(id, self.pattern, self.synchronous, self.persistent, self.core)
    }
}

impl MessageExchange {
    /// Starts building an exchange with the given pattern.
    pub fn builder(pattern: ExchangePattern) -> ExchangeBuilder {
        ExchangeBuilder {
            pattern,
            synchronous: false,
            persistent: false,
            core: ExchangeCore::new(),
        }
    }

    /// Starts building an `InOnly` exchange.
    pub fn in_only() -> ExchangeBuilder {
        Self::builder(ExchangePattern::InOnly)
    }

    /// Starts building an `InOut` exchange.
    pub fn in_out() -> ExchangeBuilder {
        Self::builder(ExchangePattern::InOut)
    }

    /// Starts building a `RobustInOnly` exchange.
    pub fn robust_in_only() -> ExchangeBuilder {
        Self::builder(ExchangePattern::RobustInOnly)
    }

    fn from_parts(
        id: String,
        pattern: ExchangePattern,
        synchronous: bool,
        persistent: bool,
        core: ExchangeCore,
    ) -> Self {
        let (progress, _) = watch::channel(core.progress());
        trace!(exchange_id = %id, %pattern, "Exchange created");
        Self {
            inner: Arc::new(ExchangeInner {
                id,
                pattern,
                synchronous,
                persistent,
                core: Mutex::new(core),
                progress,
            }),
        }
    }

    /// Unique identifier, assigned at creation.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Message exchange pattern, fixed at creation.
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> ExchangePattern {
        self.inner.pattern
    }

    /// Whether `send` blocks until the reply or completion.
    #[inline]
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.inner.synchronous
    }

    /// Whether the router keeps a snapshot in its store while the exchange is in flight.
    #[inline]
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.inner.persistent
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ExchangeStatus {
        self.inner.core.lock().status
    }

    /// Role currently holding the exchange.
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.core.lock().owner
    }

    /// The consumer endpoint, if the consumer named one.
    #[must_use]
    pub fn source(&self) -> Option<Arc<EndpointDescriptor>> {
        self.inner.core.lock().source.clone()
    }

    /// The provider endpoint, once addressed or resolved.
    #[must_use]
    pub fn target(&self) -> Option<Arc<EndpointDescriptor>> {
        self.inner.core.lock().target.clone()
    }

    /// Requested service, if addressed by service.
    #[must_use]
    pub fn service_name(&self) -> Option<QName> {
        self.inner.core.lock().service_name.clone()
    }

    /// Requested interface, if addressed by interface.
    #[must_use]
    pub fn interface_name(&self) -> Option<QName> {
        self.inner.core.lock().interface_name.clone()
    }

    /// Operation the exchange invokes, if set.
    #[must_use]
    pub fn operation(&self) -> Option<QName> {
        self.inner.core.lock().operation.clone()
    }

    /// The request message.
    #[must_use]
    pub fn in_message(&self) -> Option<NormalizedMessage> {
        self.inner.core.lock().in_message.clone()
    }

    /// The reply message, once the provider has set one.
    #[must_use]
    pub fn out_message(&self) -> Option<NormalizedMessage> {
        self.inner.core.lock().out_message.clone()
    }

    /// The fault, once the provider has set one.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        self.inner.core.lock().fault.clone()
    }

    /// Cause recorded by [`fail`](Self::fail), if the exchange ended in error.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.core.lock().error.clone()
    }

    /// Exchange property `name`, if set.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.inner.core.lock().properties.get(name).cloned()
    }

    /// Sets an exchange-level property. Refused once the exchange is terminal.
    pub fn set_property(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ExchangeError> {
        let (name, value) = (name.into(), value.into());
        self.mutate("set a property on", |core| {
            core.properties.insert(name, value);
            Ok(())
        })
    }

    /// Sets the request message. Only the consumer may do this, before the exchange is
    /// first sent.
    pub fn set_in_message(&self, message: NormalizedMessage) -> Result<(), ExchangeError> {
        self.mutate("set the in message of", |core| {
            if core.owner != Role::Consumer || core.hops > 0 {
                return Err("the in message can only be set by the consumer before sending".into());
            }
            core.in_message = Some(message);
            Ok(())
        })
    }

    /// Sets the reply. Only legal on `InOut` exchanges, by the provider, and only once.
    pub fn set_out_message(&self, message: NormalizedMessage) -> Result<(), ExchangeError> {
        let pattern = self.inner.pattern;
        self.mutate("set the out message of", |core| {
            if !pattern.allows_out() {
                return Err(format!("{pattern} exchanges carry no out message"));
            }
            Self::check_reply_slot(core)?;
            core.out_message = Some(message);
            Ok(())
        })
    }

    /// Sets a business fault. Only legal on patterns that allow faults, by the provider,
    /// and only when no reply has been set yet. A fault is a normal outcome; the exchange
    /// still completes with [`done`](Self::done).
    pub fn set_fault(&self, fault: impl Into<Fault>) -> Result<(), ExchangeError> {
        let pattern = self.inner.pattern;
        let fault = fault.into();
        self.mutate("set the fault of", |core| {
            if !pattern.allows_fault() {
                return Err(format!("{pattern} exchanges carry no fault"));
            }
            Self::check_reply_slot(core)?;
            core.fault = Some(fault);
            Ok(())
        })
    }

    fn check_reply_slot(core: &ExchangeCore) -> Result<(), String> {
        if core.owner != Role::Provider {
            return Err("only the provider may reply".into());
        }
        if core.has_reply() {
            return Err("a reply has already been set".into());
        }
        Ok(())
    }

    /// Completes the exchange normally.
    ///
    /// Requires the slots the pattern expects: `in` for `InOnly` and `RobustInOnly`,
    /// `out` or `fault` for `InOut`.
    pub fn done(&self) -> Result<(), ExchangeError> {
        let pattern = self.inner.pattern;
        self.mutate("complete", |core| {
            let satisfied = match pattern {
                ExchangePattern::InOnly | ExchangePattern::RobustInOnly => {
                    core.in_message.is_some()
                }
                ExchangePattern::InOut => core.has_reply(),
            };
            if !satisfied {
                return Err(format!(
                    "{pattern} exchange cannot complete before its expected messages are set"
                ));
            }
            core.status = ExchangeStatus::Done;
            Ok(())
        })?;
        debug!(exchange_id = %self.id(), "Exchange done");
        Ok(())
    }

    /// Ends the exchange in error, waking any party waiting on it.
    pub fn fail(&self, cause: impl Into<String>) -> Result<(), ExchangeError> {
        let cause = cause.into();
        self.mutate("fail", |core| {
            core.status = ExchangeStatus::Error;
            core.error = Some(cause.clone());
            Ok(())
        })?;
        debug!(exchange_id = %self.id(), %cause, "Exchange failed");
        Ok(())
    }

    /// Records the resolved provider and hands the exchange from consumer to provider.
    pub(crate) fn dispatch_to(&self, target: Arc<EndpointDescriptor>) -> Result<(), ExchangeError> {
        self.mutate("send", |core| {
            if core.owner != Role::Consumer || core.hops > 0 {
                return Err("the exchange has already been sent".into());
            }
            if core.in_message.is_none() {
                return Err("the in message must be set before sending".into());
            }
            core.target = Some(target);
            core.owner = Role::Provider;
            core.hops = 1;
            Ok(())
        })
    }

    /// Hands the reply from provider back to consumer.
    pub(crate) fn hand_back(&self) -> Result<(), ExchangeError> {
        self.mutate("reply to", |core| {
            if core.owner != Role::Provider || core.hops != 1 {
                return Err("only a delivered exchange can be handed back".into());
            }
            if !core.has_reply() {
                return Err("no reply has been set".into());
            }
            core.owner = Role::Consumer;
            core.hops = 2;
            Ok(())
        })
    }

    /// Whether the provider holds the exchange with a reply ready to hand back.
    pub(crate) fn reply_ready(&self) -> bool {
        let core = self.inner.core.lock();
        core.status == ExchangeStatus::Active
            && core.owner == Role::Provider
            && core.hops == 1
            && core.has_reply()
    }

    /// Applies a change under the exchange lock, publishing progress if it moved.
    fn mutate<R>(
        &self,
        action: &'static str,
        change: impl FnOnce(&mut ExchangeCore) -> Result<R, String>,
    ) -> Result<R, ExchangeError> {
        let mut core = self.inner.core.lock();
        if core.status.is_terminal() {
            return Err(ExchangeError::IllegalState {
                exchange_id: self.inner.id.clone(),
                status: core.status,
                action,
            });
        }
        let result = change(&mut core).map_err(|reason| ExchangeError::IllegalTransition {
            exchange_id: self.inner.id.clone(),
            reason,
        })?;
        let progress = core.progress();
        self.inner.progress.send_if_modified(|current| {
            if *current == progress {
                false
            } else {
                *current = progress;
                true
            }
        });
        Ok(result)
    }

    /// Waits until the reply has been handed back to the consumer or the exchange ends.
    ///
    /// `None` waits without bound. Returns the status observed when the wait ended.
    pub async fn wait_for_reply(
        &self,
        timeout: Option<Duration>,
    ) -> Result<ExchangeStatus, ExchangeError> {
        self.wait_until(timeout, |progress| {
            progress.status.is_terminal() || (progress.owner == Role::Consumer && progress.hops > 1)
        })
        .await
    }

    /// Waits until the exchange is `Done` or `Error`.
    pub async fn wait_for_completion(
        &self,
        timeout: Option<Duration>,
    ) -> Result<ExchangeStatus, ExchangeError> {
        self.wait_until(timeout, |progress| progress.status.is_terminal())
            .await
    }

    async fn wait_until(
        &self,
        timeout: Option<Duration>,
        reached: impl FnMut(&Progress) -> bool,
    ) -> Result<ExchangeStatus, ExchangeError> {
        let mut progress = self.inner.progress.subscribe();
        let wait = async move {
            progress
                .wait_for(reached)
                .await
                .map(|observed| observed.status)
        };
        let observed = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ExchangeError::Timeout {
                    exchange_id: self.inner.id.clone(),
                }
            })?,
            None => wait.await,
        };
        // The sender lives as long as `self`, so the channel cannot close mid-wait.
        Ok(observed.unwrap_or_else(|_| self.status()))
    }

    /// Captures the exchange as a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ExchangeSnapshot {
        let core = self.inner.core.lock();
        ExchangeSnapshot {
            version: SNAPSHOT_VERSION,
            exchange_id: self.inner.id.clone(),
            pattern: self.inner.pattern,
            status: core.status,
            role: core.owner,
            hops: core.hops,
            synchronous: self.inner.synchronous,
            persistent: self.inner.persistent,
            source: core.source.as_ref().map(|endpoint| endpoint.key()),
            target: core.target.as_ref().map(|endpoint| endpoint.key()),
            service_name: core.service_name.clone(),
            interface_name: core.interface_name.clone(),
            operation: core.operation.clone(),
            in_message: core.in_message.clone(),
            out_message: core.out_message.clone(),
            fault: core.fault.clone(),
            error: core.error.clone(),
            properties: core.properties.clone(),
        }
    }

    /// Rebuilds an exchange from a snapshot, re-resolving its endpoints in `registry`.
    ///
    /// Endpoints that are no longer registered come back as `None`.
    #[must_use]
    pub fn restore(snapshot: ExchangeSnapshot, registry: &EndpointRegistry) -> Self {
        let lookup = |key: Option<crate::endpoint::EndpointKey>| {
            key.and_then(|key| registry.get(&key.service_name, &key.endpoint_name))
        };
        let core = ExchangeCore {
            status: snapshot.status,
            owner: snapshot.role,
            hops: snapshot.hops,
            source: lookup(snapshot.source),
            target: lookup(snapshot.target),
            service_name: snapshot.service_name,
            interface_name: snapshot.interface_name,
            operation: snapshot.operation,
            in_message: snapshot.in_message,
            out_message: snapshot.out_message,
            fault: snapshot.fault,
            error: snapshot.error,
            properties: snapshot.properties,
        };
        Self::from_parts(
            snapshot.exchange_id,
            snapshot.pattern,
            snapshot.synchronous,
            snapshot.persistent,
            core,
        )
    }

    /// Whether both handles refer to the same exchange.
    #[must_use]
    pub fn same_exchange(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MessageExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("MessageExchange")
            .field("id", &self.inner.id)
            .field("pattern", &self.inner.pattern)
            .field("status", &core.status)
            .field("role", &core.owner)
            .finish_non_exhaustive()
    }
}
