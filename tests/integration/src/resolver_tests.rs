//! Interface Resolver Tests
//!
//! Named services are resolved when the resolver is built, cached per
//! slot, and looked up again only after a slot has been released.

mod common;

use std::sync::Arc;

use common::*;
use orb::{ErrorKind, Interface};
use orbkit::{InterfaceResolver, OrbkitError, ServiceSpec};

#[test]
fn test_get_twice_returns_cached_reference() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-resolver-cache");
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-resolver-cache");
    let resolver = InterfaceResolver::new(client, [ServiceSpec::of::<Counter>("Svc/Counter")]).unwrap();

    let first = resolver.get(0).unwrap();
    let second = resolver.get(0).unwrap();
    assert!(first.is_equivalent(&second));
    assert!(first.is_equivalent(&server.reference(0)));
}

#[test]
fn test_cached_reference_survives_unbind() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-resolver-unbind");
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-resolver-unbind");
    let resolver = InterfaceResolver::new(client.clone(), [ServiceSpec::of::<Counter>("Svc/Counter")]).unwrap();

    client
        .naming()
        .unbind(&orb::Name::parse("Svc/Counter").unwrap())
        .unwrap();
    let counter = resolver.get_typed::<Counter>(0).unwrap();
    assert_eq!(counter.increment().unwrap(), 1);

    resolver.release(0).unwrap();
    let err = resolver.get(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_released_slot_follows_rebinding() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-resolver-rebind");
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-resolver-rebind");
    let resolver = InterfaceResolver::new(client, [ServiceSpec::of::<Counter>("Svc/Counter")]).unwrap();
    let before = resolver.get(0).unwrap();

    // same name, fresh object
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();
    assert!(resolver.get(0).unwrap().is_equivalent(&before));

    resolver.release(0).unwrap();
    let after = resolver.get(0).unwrap();
    assert!(!after.is_equivalent(&before));
    assert!(after.is_equivalent(&server.reference(0)));
}

#[test]
fn test_missing_service_fails_construction() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-resolver-missing");
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-resolver-missing");
    let err = InterfaceResolver::new(
        client,
        [
            ServiceSpec::of::<Counter>("Svc/Counter"),
            ServiceSpec::of::<Counter>("Svc/Nowhere"),
        ],
    )
    .err()
    .expect("second service is not bound");
    assert!(matches!(err, OrbkitError::Resolution { ref name, .. } if name == "Svc/Nowhere"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_wrong_interface_is_a_mismatch() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-resolver-type");
    server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-resolver-type");
    let err = InterfaceResolver::new(client.clone(), [ServiceSpec::of::<TokenFactory>("Svc/Counter")])
        .err()
        .expect("a counter is not a token factory");
    assert!(matches!(err, OrbkitError::InterfaceMismatch { .. }));

    let resolver = InterfaceResolver::new(client, [ServiceSpec::of::<Counter>("Svc/Counter")]).unwrap();
    assert!(matches!(
        resolver.get_typed::<TokenFactory>(0),
        Err(OrbkitError::InterfaceMismatch { .. })
    ));
    assert!(!resolver.get_typed::<Counter>(0).unwrap().is_nil());
}
