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

use std::sync::Arc;
use std::time::Duration;

use switchyard::exchange::ExchangeSnapshot;
use switchyard::prelude::*;
use switchyard_test::prelude::*;

use crate::setup::{echo, echo_endpoint, eventually, Recorder, ECHO_INTERFACE, ECHO_SERVICE};
mod setup;

fn registry_with(endpoints: Vec<EndpointDescriptor>) -> anyhow::Result<Arc<EndpointRegistry>> {
    let registry = Arc::new(EndpointRegistry::new());
    for endpoint in endpoints {
        registry.register(endpoint)?;
    }
    Ok(registry)
}

fn request(pattern: ExchangePattern) -> switchyard::exchange::ExchangeBuilder {
    MessageExchange::builder(pattern)
        .service(ECHO_SERVICE)
        .in_message(NormalizedMessage::new("ping"))
}

/// Tests that an unroutable exchange ends in error and the sender is told.
///
/// **Scenario:**
/// 1. Send an exchange addressed to a service nobody registered.
///
/// **Verification:**
/// - `send` fails with `NoRoute`.
/// - The exchange is `Error`, with the cause recorded, and nothing is in flight.
#[switchyard_test]
async fn test_no_route_fails_exchange() -> anyhow::Result<()> {
    let router = Router::new(registry_with(Vec::new())?);
    let exchange = MessageExchange::in_only()
        .service("{urn:switchyard:test}Nobody")
        .in_message(NormalizedMessage::new("hello"))
        .build();

    let err = router.send(&exchange).await.unwrap_err();
    assert!(err.is_no_route());
    assert_eq!(exchange.status(), ExchangeStatus::Error);
    assert!(exchange.error().is_some_and(|cause| cause.contains("no route")));
    assert_eq!(router.in_flight(), 0);
    Ok(())
}

/// Endpoints of components that are not connected are not routable.
#[switchyard_test]
async fn test_unconnected_component_has_no_route() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    let exchange = request(ExchangePattern::InOnly).build();
    assert!(router.send(&exchange).await.unwrap_err().is_no_route());

    // Consumer endpoints are never delivery targets either.
    let registry = registry_with(vec![echo_endpoint("consumer", "main").with_role(Role::Consumer)])?;
    let router = Router::new(registry);
    router.connect_processor("consumer", echo());
    let exchange = request(ExchangePattern::InOnly).build();
    assert!(router.send(&exchange).await.unwrap_err().is_no_route());
    Ok(())
}

/// Synchronous push delivery hands the reply back before `send` returns.
#[switchyard_test]
async fn test_sync_push_in_out() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor("provider", echo());

    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let status = router.send(&exchange).await?;

    assert_eq!(status, ExchangeStatus::Active);
    assert_eq!(exchange.role(), Role::Consumer);
    assert_eq!(exchange.target().map(|t| t.endpoint_name().to_string()).as_deref(), Some("main"));
    assert_eq!(exchange.out_message(), exchange.in_message());

    exchange.done()?;
    assert!(eventually(|| router.in_flight() == 0).await);
    Ok(())
}

/// Asynchronous push delivery returns at once; the provider finishes later.
#[switchyard_test]
async fn test_async_push_in_only() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor("provider", recorder.clone());

    let exchange = request(ExchangePattern::InOnly).build();
    assert_eq!(router.send(&exchange).await?, ExchangeStatus::Active);

    let status = exchange.wait_for_completion(Some(Duration::from_secs(1))).await?;
    assert_eq!(status, ExchangeStatus::Done);
    assert_eq!(recorder.count(), 1);
    assert!(router.drain(Duration::from_secs(1)).await);
    Ok(())
}

/// A processor error before it takes ownership is reported as a rejection.
#[switchyard_test]
async fn test_processor_rejection() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor(
        "provider",
        processor_fn(|_exchange: MessageExchange| async move {
            Err::<(), _>(anyhow::anyhow!("queue full"))
        }),
    );

    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let err = router.send(&exchange).await.unwrap_err();
    assert!(matches!(err, RouterError::Rejected { ref reason, .. } if reason.contains("queue full")));
    assert_eq!(exchange.status(), ExchangeStatus::Error);
    Ok(())
}

/// A processor that returns without finishing leaves the exchange failed.
#[switchyard_test]
async fn test_unfinished_processing_is_an_error() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor(
        "provider",
        processor_fn(|_exchange: MessageExchange| async move { Ok::<_, anyhow::Error>(()) }),
    );

    let exchange = request(ExchangePattern::InOnly).synchronous(true).build();
    assert_eq!(router.send(&exchange).await?, ExchangeStatus::Error);
    assert!(exchange.error().is_some());
    Ok(())
}

/// A synchronous send that gets no reply in time fails the exchange.
#[switchyard_test]
async fn test_sync_send_timeout() -> anyhow::Result<()> {
    let registry = registry_with(vec![echo_endpoint("provider", "main")])?;
    let router = Router::builder(registry)
        .sync_timeout(Duration::from_millis(50))
        .build();
    router.connect_processor(
        "provider",
        processor_fn(|_exchange: MessageExchange| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        }),
    );

    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let err = router.send(&exchange).await.unwrap_err();
    assert!(matches!(err, RouterError::Timeout { exchange_id: Some(_), .. }));
    assert_eq!(exchange.status(), ExchangeStatus::Error);
    Ok(())
}

/// Tests pull delivery from a component that fetches its own work.
///
/// **Scenario:**
/// 1. A pull-style provider is connected.
/// 2. A consumer sends a synchronous `InOut` exchange from another task.
/// 3. The provider accepts it, sets `out` and responds.
///
/// **Verification:**
/// - The provider receives the same exchange, owned by the provider role.
/// - The consumer's send returns with the reply and consumer ownership.
#[switchyard_test]
async fn test_pull_delivery() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("puller", "main")])?);
    router.connect_queue("puller");

    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let sender = {
        let router = router.clone();
        let exchange = exchange.clone();
        tokio::spawn(async move { router.send(&exchange).await })
    };

    let accepted = router
        .accept(&ComponentId::new("puller"), Some(Duration::from_secs(1)))
        .await?;
    assert!(accepted.same_exchange(&exchange));
    assert_eq!(accepted.role(), Role::Provider);
    accepted.set_out_message(NormalizedMessage::new("pong"))?;
    router.respond(&accepted).await?;

    let status = sender.await??;
    assert_eq!(status, ExchangeStatus::Active);
    assert_eq!(exchange.role(), Role::Consumer);
    assert_eq!(exchange.out_message(), Some(NormalizedMessage::new("pong")));
    Ok(())
}

/// `accept` honors its timeout and refuses components without a queue.
#[switchyard_test]
async fn test_accept_timeout() -> anyhow::Result<()> {
    let router = Router::new(registry_with(Vec::new())?);
    router.connect_queue("puller");
    router.connect_processor("pusher", echo());

    let err = router
        .accept(&ComponentId::new("puller"), Some(Duration::from_millis(30)))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::Timeout { exchange_id: None, .. }));

    let err = router
        .accept(&ComponentId::new("pusher"), Some(Duration::from_millis(30)))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::ComponentNotConnected(_)));
    Ok(())
}

/// Exchanges ended while queued are skipped by `accept`.
#[switchyard_test]
async fn test_accept_skips_cancelled_exchanges() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("puller", "main")])?);
    router.connect_queue("puller");

    let cancelled = request(ExchangePattern::InOnly).build();
    let live = request(ExchangePattern::InOnly).build();
    router.send(&cancelled).await?;
    router.send(&live).await?;
    cancelled.fail("no longer needed")?;

    let accepted = router
        .accept(&ComponentId::new("puller"), Some(Duration::from_secs(1)))
        .await?;
    assert!(accepted.same_exchange(&live));
    Ok(())
}

/// Round-robin selection spreads exchanges over matching providers.
#[switchyard_test]
async fn test_round_robin_selection() -> anyhow::Result<()> {
    let registry = registry_with(vec![echo_endpoint("first", "a"), echo_endpoint("second", "b")])?;
    let router = Router::builder(registry)
        .strategy(RoutingStrategy::RoundRobin)
        .build();
    let (first, second) = (Recorder::default(), Recorder::default());
    router.connect_processor("first", first.clone());
    router.connect_processor("second", second.clone());

    for _ in 0..4 {
        let exchange = request(ExchangePattern::InOnly).synchronous(true).build();
        assert_eq!(router.send(&exchange).await?, ExchangeStatus::Done);
    }
    assert_eq!(first.count(), 2);
    assert_eq!(second.count(), 2);
    Ok(())
}

/// Addressing by interface, by service and interface, and by explicit endpoint.
#[switchyard_test]
async fn test_addressing_modes() -> anyhow::Result<()> {
    let registry = registry_with(vec![
        echo_endpoint("with-interface", "a"),
        EndpointDescriptor::new("plain", ECHO_SERVICE, "b"),
    ])?;
    let router = Router::new(Arc::clone(&registry));
    let (with_interface, plain) = (Recorder::default(), Recorder::default());
    router.connect_processor("with-interface", with_interface.clone());
    router.connect_processor("plain", plain.clone());

    let by_interface = MessageExchange::in_only()
        .interface(ECHO_INTERFACE)
        .in_message(NormalizedMessage::new("1"))
        .synchronous(true)
        .build();
    router.send(&by_interface).await?;

    let by_both = request(ExchangePattern::InOnly)
        .interface(ECHO_INTERFACE)
        .synchronous(true)
        .build();
    router.send(&by_both).await?;
    assert_eq!(with_interface.count(), 2);

    let explicit = registry
        .get(&QName::parse(ECHO_SERVICE), "b")
        .expect("registered");
    let direct = MessageExchange::in_only()
        .endpoint(explicit)
        .in_message(NormalizedMessage::new("3"))
        .synchronous(true)
        .build();
    router.send(&direct).await?;
    assert_eq!(plain.count(), 1);
    Ok(())
}

/// Tests that persistent exchanges are stored while in flight and removed afterwards.
///
/// **Scenario:**
/// 1. A router with a memory store delivers a persistent exchange to a pull component.
/// 2. The stored snapshot is inspected and restored before the provider completes it.
///
/// **Verification:**
/// - The snapshot shows provider ownership while the exchange is queued.
/// - The restored exchange has the same id and target.
/// - Once done, the entry is gone from the store.
#[switchyard_test]
async fn test_persistent_exchange_lifecycle() -> anyhow::Result<()> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new("exchanges"));
    let registry = registry_with(vec![echo_endpoint("puller", "main")])?;
    let router = Router::builder(registry).store(Arc::clone(&store)).build();
    router.connect_queue("puller");

    let exchange = request(ExchangePattern::InOnly).persistent(true).build();
    router.send(&exchange).await?;

    let snapshot: ExchangeSnapshot = store.load_typed(exchange.id()).await?;
    assert_eq!(snapshot.role, Role::Provider);
    assert_eq!(snapshot.status, ExchangeStatus::Active);

    let restored = router.restore_exchange(exchange.id()).await?;
    assert_eq!(restored.id(), exchange.id());
    assert!(restored.target().is_some());

    let accepted = router
        .accept(&ComponentId::new("puller"), Some(Duration::from_secs(1)))
        .await?;
    accepted.done()?;

    assert!(router.drain(Duration::from_secs(1)).await);
    assert!(eventually(|| router.in_flight() == 0).await);
    let err = store.load(exchange.id()).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

/// Non-persistent exchanges leave the store untouched unless everything is persisted.
#[switchyard_test]
async fn test_transient_exchange_not_stored() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new("exchanges"));
    let registry = registry_with(vec![echo_endpoint("puller", "main")])?;
    let router = Router::builder(registry).store(store.clone()).build();
    router.connect_queue("puller");

    let exchange = request(ExchangePattern::InOnly).build();
    router.send(&exchange).await?;
    assert!(store.is_empty());
    exchange.fail("cleanup")?;
    Ok(())
}

/// Disconnecting a pull component fails what was still queued for it.
#[switchyard_test]
async fn test_disconnect_fails_queued_exchanges() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("puller", "main")])?);
    router.connect_queue("puller");

    let exchange = request(ExchangePattern::InOnly).build();
    router.send(&exchange).await?;
    assert!(router.disconnect(&ComponentId::new("puller")));
    assert!(!router.is_connected(&ComponentId::new("puller")));

    assert_eq!(exchange.status(), ExchangeStatus::Error);
    assert!(eventually(|| router.in_flight() == 0).await);
    Ok(())
}

/// Many concurrent synchronous senders all get their replies.
///
/// **Scenario:**
/// 1. Fire 32 synchronous in-out sends at one push provider at the same time.
///
/// **Verification:**
/// - Every send returns `Active` with the echoed reply.
/// - Once every consumer completes, nothing is left in flight.
#[switchyard_test]
async fn test_concurrent_sync_sends() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor("provider", echo());

    let exchanges: Vec<MessageExchange> = (0..32)
        .map(|n| {
            MessageExchange::in_out()
                .service(ECHO_SERVICE)
                .in_message(NormalizedMessage::new(format!("ping-{n}")))
                .synchronous(true)
                .build()
        })
        .collect();

    let results = futures::future::join_all(exchanges.iter().map(|e| router.send(e))).await;
    for (exchange, result) in exchanges.iter().zip(results) {
        assert_eq!(result?, ExchangeStatus::Active);
        assert_eq!(exchange.out_message(), exchange.in_message());
        exchange.done()?;
    }
    assert!(eventually(|| router.in_flight() == 0).await);
    Ok(())
}

/// Tests that ending a synchronous push exchange wakes its sender at once.
///
/// **Scenario:**
/// 1. A push provider takes five seconds before it would answer.
/// 2. A consumer sends a synchronous `InOut` exchange from another task.
/// 3. After 100 ms the consumer fails the exchange through another handle.
///
/// **Verification:**
/// - The blocked `send` returns well within a second with status `Error`.
#[switchyard_test]
async fn test_failing_wakes_sync_push_sender() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("provider", "main")])?);
    router.connect_processor(
        "provider",
        processor_fn(|_exchange: MessageExchange| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        }),
    );

    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let sender = {
        let router = router.clone();
        let exchange = exchange.clone();
        tokio::spawn(async move { router.send(&exchange).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    exchange.fail("consumer cancelled")?;

    let status = tokio::time::timeout(Duration::from_secs(1), sender).await???;
    assert_eq!(status, ExchangeStatus::Error);
    assert_eq!(exchange.error().as_deref(), Some("consumer cancelled"));
    Ok(())
}

/// Tests that disconnecting a pull component releases everyone waiting on it.
///
/// **Scenario:**
/// 1. A pull component is connected and one task blocks in `accept`.
/// 2. The component is disconnected.
/// 3. A second pull component gets a synchronous exchange queued, then is disconnected
///    while the consumer waits for the reply.
///
/// **Verification:**
/// - The pending `accept` returns `ComponentNotConnected` promptly.
/// - The waiting sender returns promptly and its exchange ends in `Error`.
#[switchyard_test]
async fn test_disconnect_releases_waiters() -> anyhow::Result<()> {
    let router = Router::new(registry_with(vec![echo_endpoint("queued", "main")])?);
    let idle = ComponentId::new("idle");
    router.connect_queue(idle.clone());

    let acceptor = {
        let router = router.clone();
        let idle = idle.clone();
        tokio::spawn(async move { router.accept(&idle, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(router.disconnect(&idle));
    let accepted = tokio::time::timeout(Duration::from_secs(1), acceptor).await??;
    assert!(matches!(accepted, Err(RouterError::ComponentNotConnected(_))));

    router.connect_queue("queued");
    let exchange = request(ExchangePattern::InOut).synchronous(true).build();
    let sender = {
        let router = router.clone();
        let exchange = exchange.clone();
        tokio::spawn(async move { router.send(&exchange).await })
    };
    assert!(eventually(|| router.in_flight() == 1).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(router.disconnect(&ComponentId::new("queued")));

    // Queued exchanges are failed; a send still racing the disconnect is refused.
    let outcome = tokio::time::timeout(Duration::from_secs(1), sender).await??;
    assert!(matches!(
        outcome,
        Ok(ExchangeStatus::Error) | Err(RouterError::ComponentNotConnected(_))
    ));
    assert_eq!(exchange.status(), ExchangeStatus::Error);
    assert!(eventually(|| router.in_flight() == 0).await);
    Ok(())
}

/// Tests that endpoint connections redirect both explicit and service addressing.
///
/// **Scenario:**
/// 1. Link the virtual endpoint `proxy` of service `{urn:switchyard:test}Virtual` to the
///    concrete echo endpoint `main`.
/// 2. Send one exchange addressed to the virtual service and one explicitly to the
///    virtual endpoint.
///
/// **Verification:**
/// - Both exchanges are delivered to `main` and complete.
#[switchyard_test]
async fn test_endpoint_connection_routing() -> anyhow::Result<()> {
    let registry = registry_with(vec![echo_endpoint("provider", "main")])?;
    let virtual_service = QName::parse("{urn:switchyard:test}Virtual");
    registry.connect_endpoint(virtual_service.clone(), "proxy", QName::parse(ECHO_SERVICE), "main")?;
    let router = Router::new(registry);
    let recorder = Recorder::default();
    router.connect_processor("provider", recorder.clone());

    let by_service = MessageExchange::in_only()
        .service(virtual_service.clone())
        .in_message(NormalizedMessage::new("ping"))
        .synchronous(true)
        .build();
    assert_eq!(router.send(&by_service).await?, ExchangeStatus::Done);

    let virtual_endpoint = Arc::new(EndpointDescriptor::new("consumer", virtual_service, "proxy"));
    let explicit = MessageExchange::in_only()
        .endpoint(virtual_endpoint)
        .in_message(NormalizedMessage::new("ping"))
        .synchronous(true)
        .build();
    assert_eq!(router.send(&explicit).await?, ExchangeStatus::Done);

    for exchange in [&by_service, &explicit] {
        assert_eq!(exchange.target().map(|t| t.endpoint_name().to_string()).as_deref(), Some("main"));
    }
    assert_eq!(recorder.count(), 2);
    Ok(())
}
