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

use switchyard::prelude::*;
use switchyard_test::prelude::*;

use crate::setup::{echo_endpoint, ECHO_INTERFACE, ECHO_SERVICE};
mod setup;

/// Tests the external reference produced for a protocol-tagged endpoint.
///
/// **Scenario:**
/// 1. Register endpoint `epr` of service `urn:x:dummy#DummyComponent` for component `c1`
///    with the single protocol `dummy:`.
/// 2. Build its EPR and push it through the JSON wire encoding.
///
/// **Verification:**
/// - The service name splits into namespace `urn:x:dummy` and local part `DummyComponent`.
/// - The element local part is the endpoint name.
/// - The protocol list is carried unchanged and the wire round trip is lossless.
#[switchyard_test]
async fn test_dummy_component_reference() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let descriptor = registry.register(
        EndpointDescriptor::new("c1", "urn:x:dummy#DummyComponent", "epr").with_protocol("dummy:"),
    )?;

    let epr = registry.to_epr(&descriptor);
    assert_eq!(epr.service_name().namespace(), "urn:x:dummy");
    assert_eq!(epr.service_name().local_part(), "DummyComponent");
    assert_eq!(epr.element_name().local_part(), "epr");
    assert_eq!(descriptor.protocols().len(), 1);
    assert_eq!(descriptor.protocols()[0], "dummy:");

    let decoded = EndpointReference::from_json(&epr.to_json()?)?;
    assert_eq!(decoded, epr);
    Ok(())
}

/// Resolving an endpoint's own reference finds the endpoint again, until it is withdrawn.
#[switchyard_test]
async fn test_resolve_own_reference() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let plain = registry.register(echo_endpoint("c1", "plain"))?;
    let tagged = registry.register(echo_endpoint("c2", "tagged").with_protocol("jms:"))?;

    for descriptor in [&plain, &tagged] {
        let resolved = registry
            .resolve(&registry.to_epr(descriptor))
            .expect("registered endpoint resolves");
        assert!(resolved.same_identity(descriptor));
    }

    registry.unregister(plain.component_id(), plain.service_name(), plain.endpoint_name());
    assert!(registry.resolve(&registry.to_epr(&plain)).is_none());
    Ok(())
}

/// Two components cannot share a key; the owning component may republish.
#[switchyard_test]
async fn test_registration_uniqueness() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    registry.register(EndpointDescriptor::new("c1", ECHO_SERVICE, "main"))?;

    let err = registry
        .register(EndpointDescriptor::new("c2", ECHO_SERVICE, "main"))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::DuplicateEndpoint { ref owner, .. } if owner.as_str() == "c1"
    ));

    // Same component republishes with an interface; the replacement is indexed.
    registry.register(EndpointDescriptor::new("c1", ECHO_SERVICE, "main").with_interface(ECHO_INTERFACE))?;
    assert_eq!(registry.len(), 1);
    let by_interface = registry.lookup_by_interface(&QName::parse(ECHO_INTERFACE));
    assert_eq!(by_interface.len(), 1);
    assert_eq!(by_interface[0].component_id().as_str(), "c1");

    // Dropping the interface again removes it from the index.
    registry.register(EndpointDescriptor::new("c1", ECHO_SERVICE, "main"))?;
    assert!(registry.lookup_by_interface(&QName::parse(ECHO_INTERFACE)).is_empty());
    Ok(())
}

/// Unregistering something absent, or owned by someone else, changes nothing.
#[switchyard_test]
async fn test_unregister_is_owner_only_and_idempotent() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let service = QName::parse(ECHO_SERVICE);
    registry.register(echo_endpoint("c1", "main"))?;

    assert!(registry.unregister(&ComponentId::new("c2"), &service, "main").is_none());
    assert_eq!(registry.len(), 1);
    assert!(registry.unregister(&ComponentId::new("c1"), &service, "missing").is_none());

    assert!(registry.unregister(&ComponentId::new("c1"), &service, "main").is_some());
    assert!(registry.unregister(&ComponentId::new("c1"), &service, "main").is_none());
    assert!(registry.is_empty());
    assert!(registry.lookup_by_service(&service).is_empty());
    Ok(())
}

/// Lookups by service and interface, plus pinned interface connections.
#[switchyard_test]
async fn test_lookups_and_interface_connections() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let service = QName::parse(ECHO_SERVICE);
    let interface = QName::parse(ECHO_INTERFACE);
    registry.register(echo_endpoint("c1", "a"))?;
    registry.register(echo_endpoint("c2", "b"))?;
    registry.register(EndpointDescriptor::new("c3", "{urn:other}Svc", "x"))?;

    assert_eq!(registry.lookup_by_service(&service).len(), 2);
    assert_eq!(registry.lookup_by_interface(&interface).len(), 2);
    assert_eq!(registry.endpoints_for_component(&ComponentId::new("c3")).len(), 1);

    registry.connect_interface(interface.clone(), service.clone(), "b");
    let pinned = registry.lookup_by_interface(&interface);
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0].endpoint_name(), "b");

    assert!(registry.disconnect_interface(&interface));
    assert_eq!(registry.lookup_by_interface(&interface).len(), 2);

    assert_eq!(registry.unregister_component(&ComponentId::new("c1")), 1);
    assert_eq!(registry.lookup_by_service(&service).len(), 1);
    Ok(())
}

/// Subscribers see registrations and withdrawals.
#[switchyard_test]
async fn test_endpoint_events() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let mut events = registry.subscribe();

    let descriptor = registry.register(echo_endpoint("c1", "main"))?;
    registry.unregister(descriptor.component_id(), descriptor.service_name(), "main");

    match events.recv().await? {
        EndpointEvent::Registered(published) => assert!(published.same_identity(&descriptor)),
        other => panic!("unexpected event {other:?}"),
    }
    match events.recv().await? {
        EndpointEvent::Unregistered(withdrawn) => assert!(withdrawn.same_identity(&descriptor)),
        other => panic!("unexpected event {other:?}"),
    }
    Ok(())
}

/// Tests that lookups never observe a half-registered endpoint under concurrency.
///
/// **Scenario:**
/// 1. Eight writer tasks each register and republish fifty endpoints of one service.
/// 2. Four reader tasks look the service up continuously while writers run.
///
/// **Verification:**
/// - Every descriptor a reader sees carries its interface and protocol.
/// - Afterwards all four hundred endpoints are registered and indexed.
#[switchyard_test]
async fn test_concurrent_registration_is_linearizable() -> anyhow::Result<()> {
    let registry = Arc::new(EndpointRegistry::new());
    let service = QName::parse(ECHO_SERVICE);

    let writers: Vec<_> = (0..8)
        .map(|writer| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for n in 0..50 {
                    let component = format!("writer-{writer}");
                    let endpoint = format!("ep-{writer}-{n}");
                    let descriptor = echo_endpoint(&component, &endpoint).with_protocol("test:");
                    registry.register(descriptor.clone()).expect("own key");
                    registry.register(descriptor).expect("republish by owner");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let service = service.clone();
            tokio::spawn(async move {
                let interface = QName::parse(ECHO_INTERFACE);
                for _ in 0..200 {
                    for descriptor in registry.lookup_by_service(&service) {
                        assert!(descriptor.implements(&interface));
                        assert_eq!(descriptor.protocols(), ["test:".to_string()]);
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.await?;
    }

    assert_eq!(registry.len(), 400);
    assert_eq!(registry.lookup_by_service(&service).len(), 400);
    assert_eq!(
        registry.lookup_by_interface(&QName::parse(ECHO_INTERFACE)).len(),
        400
    );
    Ok(())
}

/// Tests endpoint connections linking a virtual endpoint to a concrete one.
///
/// **Scenario:**
/// 1. Register the concrete endpoint `main` of the echo service.
/// 2. Link the virtual endpoint `proxy` of service `{urn:switchyard:test}Virtual` to it.
///
/// **Verification:**
/// - The virtual key follows through to the concrete descriptor.
/// - Looking up the virtual service yields the concrete endpoint.
/// - A second connection from the same virtual key is refused.
/// - Once disconnected, the virtual service is empty again.
#[switchyard_test]
async fn test_endpoint_connections() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let concrete = registry.register(echo_endpoint("c1", "main"))?;
    let virtual_service = QName::parse("{urn:switchyard:test}Virtual");
    let virtual_key = EndpointKey::new(virtual_service.clone(), "proxy".to_string());

    registry.connect_endpoint(virtual_service.clone(), "proxy", QName::parse(ECHO_SERVICE), "main")?;
    let linked = registry.connected_endpoint(&virtual_key).expect("linked endpoint");
    assert!(linked.same_identity(&concrete));
    let by_service = registry.lookup_by_service(&virtual_service);
    assert_eq!(by_service.len(), 1);
    assert!(by_service[0].same_identity(&concrete));

    let err = registry
        .connect_endpoint(virtual_service.clone(), "proxy", QName::parse(ECHO_SERVICE), "other")
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateConnection { ref key } if key == &virtual_key));

    // A link to an endpoint that is gone resolves to nothing.
    registry.unregister(concrete.component_id(), concrete.service_name(), "main");
    assert!(registry.connected_endpoint(&virtual_key).is_none());

    assert!(registry.disconnect_endpoint(&virtual_service, "proxy"));
    assert!(!registry.disconnect_endpoint(&virtual_service, "proxy"));
    assert!(registry.lookup_by_service(&virtual_service).is_empty());
    Ok(())
}

/// Tests external endpoints, which are listed but never mixed with internal ones.
///
/// **Scenario:**
/// 1. Register an internal echo endpoint and an external proxy for the same service.
/// 2. Register the same external key a second time, then withdraw it.
///
/// **Verification:**
/// - External lookups by service and interface return only the proxy.
/// - Internal lookups do not see the proxy.
/// - The duplicate is refused, and events are emitted for both changes.
#[switchyard_test]
async fn test_external_endpoints() -> anyhow::Result<()> {
    let registry = EndpointRegistry::new();
    let service = QName::parse(ECHO_SERVICE);
    let interface = QName::parse(ECHO_INTERFACE);
    registry.register(echo_endpoint("c1", "main"))?;
    let mut events = registry.subscribe();

    let external = registry.register_external(echo_endpoint("binding", "external"))?;
    assert_eq!(registry.external_endpoints_for_service(&service).len(), 1);
    assert_eq!(registry.external_endpoints_for_interface(&interface).len(), 1);
    assert_eq!(registry.lookup_by_service(&service).len(), 1);
    assert_eq!(registry.len(), 1);

    let err = registry
        .register_external(echo_endpoint("binding", "external"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateExternalEndpoint { .. }));

    let removed = registry.unregister_external(&service, "external").expect("registered");
    assert!(removed.same_identity(&external));
    assert!(registry.external_endpoints_for_service(&service).is_empty());

    match events.recv().await? {
        EndpointEvent::ExternalRegistered(published) => assert!(published.same_identity(&external)),
        other => panic!("unexpected event {other:?}"),
    }
    match events.recv().await? {
        EndpointEvent::ExternalUnregistered(withdrawn) => assert!(withdrawn.same_identity(&external)),
        other => panic!("unexpected event {other:?}"),
    }
    Ok(())
}
