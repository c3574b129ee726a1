//! Role Composition Tests
//!
//! Units declared with `compose_roles!` in every provided/consumed shape,
//! talking to each other inside one domain.

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use orb::{ErrorKind, Interface};
use orbkit::{compose_roles, OrbkitError, StopSignal};

compose_roles! {
    /// Publishes a counter and a token factory
    struct Backend {
        Provided<CounterServant>,
        Provided<TokenFactoryServant>,
    }
}

compose_roles! {
    /// Uses both backend services, publishes nothing
    struct Dashboard {
        Consumed<Counter>,
        Consumed<TokenFactory>,
    }
}

compose_roles! {
    /// Reads the backend counter and publishes a counter of its own
    struct Relay {
        Consumed<Counter>,
        Provided<CounterServant>,
    }
}

fn backend(domain: &str) -> Backend {
    init_logging();
    let mut backend = Backend::new("backend", orb_args(domain)).unwrap();
    backend
        .register::<CounterServant>("Backend/Counter", Arc::new(CounterServant::default()))
        .unwrap();
    backend
        .register::<TokenFactoryServant>("Backend/Tokens", Arc::new(TokenFactoryServant::default()))
        .unwrap();
    backend.registry_mut().start().unwrap();
    backend
}

#[test]
fn test_role_counts() {
    assert_eq!(Backend::PROVIDED_ROLES, 2);
    assert_eq!(Dashboard::CONSUMED_ROLES, 2);
    assert_eq!(Relay::PROVIDED_ROLES, 1);
    assert_eq!(Relay::CONSUMED_ROLES, 1);
}

#[test]
fn test_client_only_unit_exposes_both_stubs() {
    let backend = backend("it-compose-client");
    let dashboard = Dashboard::new(
        "dashboard",
        orb_args("it-compose-client"),
        ["Backend/Counter", "Backend/Tokens"],
    )
    .unwrap();

    let counter = dashboard.stub::<Counter>().unwrap();
    let factory = dashboard.stub::<TokenFactory>().unwrap();
    assert!(!counter.is_nil());
    assert!(!factory.is_nil());

    assert_eq!(counter.increment().unwrap(), 1);
    assert_eq!(factory.issue().unwrap().serial().unwrap(), 1);
    assert_eq!(backend.skeleton::<CounterServant>().map(CounterServant::value), Some(1));
    assert_eq!(dashboard.resolver().name(1), Some("Backend/Tokens"));
}

#[test]
fn test_client_only_unit_requires_every_service() {
    let _backend = backend("it-compose-missing");
    let err = Dashboard::new(
        "dashboard",
        orb_args("it-compose-missing"),
        ["Backend/Counter", "Backend/Nothing"],
    )
    .err()
    .expect("one service is not bound");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_mixed_unit_shares_one_session() {
    let _backend = backend("it-compose-mixed");
    let mut relay = Relay::new("relay", orb_args("it-compose-mixed"), ["Backend/Counter"]).unwrap();
    assert!(Arc::ptr_eq(relay.registry().session(), relay.resolver().session()));
    assert!(Arc::ptr_eq(relay.session(), relay.registry().session()));

    let own = relay
        .register::<CounterServant>("Relay/Counter", Arc::new(CounterServant::default()))
        .unwrap();
    relay.registry_mut().start().unwrap();

    let upstream = relay.stub::<Counter>().unwrap();
    for _ in 0..3 {
        upstream.increment().unwrap();
    }
    own.increment().unwrap();

    assert_eq!(upstream.value().unwrap(), 3);
    assert_eq!(relay.skeleton::<CounterServant>().map(CounterServant::value), Some(1));

    let names = relay.session().enumerate_names().unwrap();
    assert!(names.contains(&"Relay/Counter".to_string()));
    assert!(names.contains(&"Backend/Counter".to_string()));
}

#[test]
fn test_unregister_role_clears_skeleton() {
    let mut backend = backend("it-compose-unregister");
    assert!(backend.skeleton::<TokenFactoryServant>().is_some());

    backend.unregister::<TokenFactoryServant>().unwrap();
    assert!(backend.skeleton::<TokenFactoryServant>().is_none());
    assert!(backend.skeleton::<CounterServant>().is_some());

    let err = backend.session().resolve("Backend/Tokens").unwrap_err();
    assert!(matches!(err, OrbkitError::Resolution { .. }));
}

#[test]
fn test_run_until_stopped() {
    let _backend = backend("it-compose-run");
    let mut relay = Relay::new("relay", orb_args("it-compose-run"), ["Backend/Counter"]).unwrap();
    let own = relay
        .register::<CounterServant>("Relay/Counter", Arc::new(CounterServant::default()))
        .unwrap();

    let stop = StopSignal::new();
    let caller_stop = stop.clone();
    let caller = thread::spawn(move || {
        let value = own.increment();
        caller_stop.trigger();
        value
    });

    relay.run(&stop).unwrap();
    assert_eq!(caller.join().unwrap().unwrap(), 1);

    relay.stop();
    assert!(relay.skeleton::<CounterServant>().is_none());
    assert!(!relay.session().orb().is_running());
}
