//! Multi-Connection Client Tests
//!
//! One client connects to several replicas of the same interface at
//! runtime, each published by its own server registry.

mod common;

use std::sync::Arc;

use common::*;
use orb::{ErrorKind, Interface};
use orbkit::{MultiClient, OrbkitError, ServantRegistry};

/// `count` counter replicas bound at `Replicas/r<i>`
fn replicas(domain: &str, count: usize) -> Vec<ServantRegistry<1>> {
    (0..count)
        .map(|i| {
            let mut server = running_registry::<1>(&format!("replica{}", i), domain);
            server
                .register(0, &format!("Replicas/r{}", i), Arc::new(CounterServant::default()), None)
                .unwrap();
            server
        })
        .collect()
}

#[test]
fn test_remove_shifts_later_connections_down() {
    init_logging();
    let servers = replicas("it-multi-remove", 2);
    let mut clients = MultiClient::<Counter>::new(client_session("it-multi-remove"));

    clients.connect("Replicas/r0").unwrap();
    clients.connect("Replicas/r1").unwrap();
    assert_eq!(clients.size(), 2);

    clients.remove(0).unwrap();
    assert_eq!(clients.size(), 1);
    assert_eq!(clients.names(), vec!["Replicas/r1"]);
    assert!(clients
        .get(0)
        .unwrap()
        .as_object()
        .is_equivalent(&servers[1].reference(0)));
}

#[test]
fn test_each_connection_reaches_its_replica() {
    init_logging();
    let servers = replicas("it-multi-calls", 3);
    let mut clients = MultiClient::<Counter>::new(client_session("it-multi-calls"));
    for i in 0..3 {
        clients.connect(&format!("Replicas/r{}", i)).unwrap();
    }

    // replica i sees i + 1 calls
    for (i, connection) in clients.iter().enumerate() {
        for _ in 0..=i {
            connection.stub().increment().unwrap();
        }
    }
    for (i, server) in servers.iter().enumerate() {
        assert_eq!(server.servant::<CounterServant>(0).map(CounterServant::value), Some(i as u64 + 1));
    }
}

#[test]
fn test_connect_all_discovered_replicas() {
    init_logging();
    let _servers = replicas("it-multi-discover", 3);
    let session = client_session("it-multi-discover");
    let names = session.enumerate_names().unwrap();

    let mut clients = MultiClient::<Counter>::new(session);
    let failures = clients.try_connect_all(
        names
            .iter()
            .map(String::as_str)
            .chain(["Replicas/gone"]),
    );

    assert_eq!(clients.size(), 3);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind(), ErrorKind::NotFound);
}

#[test]
fn test_failed_connect_leaves_list_unchanged() {
    init_logging();
    let _servers = replicas("it-multi-fail", 1);
    let mut clients = MultiClient::<TokenFactory>::new(client_session("it-multi-fail"));

    let err = clients.connect("Replicas/r0").err().expect("a counter is not a token factory");
    assert!(matches!(err, OrbkitError::InterfaceMismatch { .. }));
    assert!(clients.connect("Replicas/none").is_err());
    assert!(clients.is_empty());
}

#[test]
fn test_index_past_end_is_rejected() {
    let _servers = replicas("it-multi-bounds", 1);
    let mut clients = MultiClient::<Counter>::new(client_session("it-multi-bounds"));
    clients.connect("Replicas/r0").unwrap();

    assert!(matches!(
        clients.get(1),
        Err(OrbkitError::IndexOutOfBounds { index: 1, len: 1 })
    ));
    assert!(matches!(
        clients.remove(4),
        Err(OrbkitError::IndexOutOfBounds { index: 4, len: 1 })
    ));
    assert_eq!(clients.size(), 1);
}
