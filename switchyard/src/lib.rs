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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Switchyard
//!
//! The addressing and delivery-state core of an integration container. Components
//! publish endpoints, exchange typed messages through a router, and the container tracks
//! every exchange from creation to completion, optionally persisting it while in flight.
//!
//! ## Key Concepts
//!
//! - **Endpoints (`EndpointDescriptor`)**: identity of one addressable endpoint, owned by
//!   a component and grouped by service and interface names.
//! - **Registry (`EndpointRegistry`)**: concurrent index of live endpoints; resolves
//!   lookups and external endpoint references (`EndpointReference`).
//! - **Exchanges (`MessageExchange`)**: one unit of work between a consumer and a
//!   provider, with `in`/`out`/`fault` slots and an `Active` → `Done`/`Error` lifecycle.
//! - **Router (`Router`)**: resolves a provider, moves ownership of exchanges between the
//!   parties and delivers them by push (`ComponentProcessor`) or pull (`accept`).
//! - **Stores (`Store`)**: pluggable keyed persistence advertising `PERSISTENT` and
//!   `CLUSTERED` features.
//! - **Runtime (`ContainerRuntime`)**: the running container, launched with
//!   `Switchyard::launch_async` and drained with `shutdown`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchyard::prelude::*;
//!
//! let mut runtime = Switchyard::launch_async().await?;
//! runtime.activate_endpoint(EndpointDescriptor::new("echo", "{urn:example}Echo", "main"))?;
//! runtime.connect_component("echo", processor_fn(|exchange: MessageExchange| async move {
//!     exchange.set_out_message(exchange.in_message().unwrap_or_default())?;
//!     Ok(())
//! }));
//!
//! let exchange = MessageExchange::in_out()
//!     .service("{urn:example}Echo")
//!     .in_message(NormalizedMessage::new("ping"))
//!     .synchronous(true)
//!     .build();
//! runtime.router().send(&exchange).await?;
//! exchange.done()?;
//! runtime.shutdown().await?;
//! ```

/// Container bootstrap: configuration, logging, launch and runtime.
pub mod common;

/// Endpoint descriptors, references and the registry.
pub mod endpoint;

/// Message exchanges and their lifecycle.
pub mod exchange;

/// Endpoint resolution and delivery.
pub mod router;

/// Store backends.
pub mod store;

/// Contracts consumed by the core.
pub mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait/latest/async_trait/attr.async_trait.html): needed to implement [`ComponentProcessor`](crate::traits::ComponentProcessor).
///
/// ## Core Types
/// *   [`crate::common::Switchyard`] and [`crate::common::ContainerRuntime`]: launching and running a container.
/// *   [`crate::endpoint::EndpointRegistry`], [`crate::endpoint::EndpointDescriptor`], [`crate::endpoint::EndpointReference`]: addressing.
/// *   [`crate::exchange::MessageExchange`] and its message types.
/// *   [`crate::router::Router`]: delivery.
/// *   [`crate::traits::Store`] and the bundled backends.
pub mod prelude {
    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use crate::common::{ContainerRuntime, Switchyard, SwitchyardConfig};
    pub use crate::endpoint::{
        ComponentId, EndpointDescriptor, EndpointEvent, EndpointKey, EndpointReference,
        EndpointRegistry, QName, RegistryError, Role,
    };
    pub use crate::exchange::{
        ExchangeError, ExchangePattern, ExchangeStatus, Fault, MessageExchange, NormalizedMessage,
    };
    pub use crate::router::{Router, RouterError, RoutingStrategy};
    pub use crate::store::{FileStore, MemoryStore, StoreBackend, StoreError, StoreFactory};
    pub use crate::traits::{
        processor_fn, ComponentProcessor, Store, StoreExt, StoreFeature, CLUSTERED, PERSISTENT,
        TRANSACTIONAL,
    };
}
