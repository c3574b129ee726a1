//! Servant Registry Tests
//!
//! A server registry publishes servants in a shared domain while a
//! separate client session looks them up and calls them through the
//! server's request loop.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use orb::{ErrorKind, Interface};
use orbkit::{Cleanup, OrbkitError};

#[test]
fn test_register_then_unregister_removes_name() {
    init_logging();
    let mut server = running_registry::<2>("server", "it-registry-basic");
    let client = client_session("it-registry-basic");

    server.register(0, "Svc/X", Arc::new(CounterServant::default()), None).unwrap();
    assert!(client.enumerate_names().unwrap().contains(&"Svc/X".to_string()));
    assert!(client.resolve("Svc/X").is_ok());

    server.unregister(0).unwrap();
    assert!(!client.enumerate_names().unwrap().contains(&"Svc/X".to_string()));

    let err = client.resolve("Svc/X").unwrap_err();
    assert!(matches!(err, OrbkitError::Resolution { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_calls_reach_registered_servant() {
    init_logging();
    let server = {
        let mut server = running_registry::<1>("server", "it-registry-calls");
        server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();
        server
    };
    let client = client_session("it-registry-calls");

    let counter = Counter::narrow(&client.resolve("Svc/Counter").unwrap())
        .unwrap()
        .expect("bound object is a Counter");
    assert_eq!(counter.increment().unwrap(), 1);
    assert_eq!(counter.increment().unwrap(), 2);
    assert_eq!(counter.value().unwrap(), 2);
    assert_eq!(server.servant::<CounterServant>(0).map(CounterServant::value), Some(2));
}

#[test]
fn test_reregister_retires_previous_object() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-registry-rereg");
    let client = client_session("it-registry-rereg");

    let old = server.register(0, "Svc/Old", Arc::new(CounterServant::default()), None).unwrap();
    let new = server.register(0, "Svc/New", Arc::new(CounterServant::default()), None).unwrap();

    assert_eq!(client.enumerate_names().unwrap(), vec!["Svc/New"]);
    assert_eq!(new.increment().unwrap(), 1);

    let err = old.increment().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObjectNotExist);
    assert!(old.as_object().non_existent().unwrap());
}

#[test]
fn test_reregister_same_name_rebinds_new_object() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-registry-same");
    let client = client_session("it-registry-same");

    let old = server.register(0, "Svc/Same", Arc::new(CounterServant::default()), None).unwrap();
    let new = server.register(0, "Svc/Same", Arc::new(CounterServant::default()), None).unwrap();
    assert!(!new.as_object().is_equivalent(old.as_object()));

    let bound = client.resolve("Svc/Same").unwrap();
    assert!(bound.is_equivalent(new.as_object()));
    assert!(!bound.is_equivalent(old.as_object()));
    assert_eq!(client.enumerate_names().unwrap(), vec!["Svc/Same"]);

    assert_eq!(old.increment().unwrap_err().kind(), ErrorKind::ObjectNotExist);
    assert_eq!(new.increment().unwrap(), 1);
    assert_eq!(server.adapter().active_objects(), 1);
}

#[test]
fn test_holding_manager_reports_transient() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-registry-hold");
    let counter = server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();

    server.adapter().the_manager().hold_requests().unwrap();
    let err = counter.increment().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);

    server.adapter().the_manager().activate().unwrap();
    assert_eq!(counter.increment().unwrap(), 1);
}

#[test]
fn test_stopped_registry_is_unreachable() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-registry-stop");
    let counter = server.register(0, "Svc/Counter", Arc::new(CounterServant::default()), None).unwrap();
    assert_eq!(counter.increment().unwrap(), 1);

    server.stop();
    let err = counter.increment().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CommunicationFailure);
    assert!(!server.is_registered(0));
}

#[test]
fn test_drop_unbinds_and_runs_cleanup() {
    init_logging();
    let client = client_session("it-registry-drop");
    let calls = Arc::new(AtomicUsize::new(0));

    {
        let mut server = running_registry::<2>("server", "it-registry-drop");
        let observed = calls.clone();
        let cleanup: Cleanup = Box::new(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        server.register(0, "Svc/A", Arc::new(CounterServant::default()), Some(cleanup)).unwrap();
        server.register(1, "Svc/B", Arc::new(CounterServant::default()), None).unwrap();

        let mut names = client.enumerate_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["Svc/A", "Svc/B"]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(client.enumerate_names().unwrap().is_empty());
}

#[test]
fn test_out_of_range_slot_is_rejected() {
    let mut server = running_registry::<1>("server", "it-registry-range");
    let err = server
        .register(3, "Svc/X", Arc::new(CounterServant::default()), None)
        .unwrap_err();
    assert!(matches!(err, OrbkitError::SlotOutOfRange { slot: 3, arity: 1 }));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(server.unregister(3).is_err());
}
