//! Naming Directory Tests
//!
//! Enumeration and binding as seen by different sessions of one domain.

mod common;

use std::sync::Arc;

use common::*;
use orb::{ErrorKind, Interface, Name, NamingContext};
use orbkit::{Session, SessionConfig};

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[test]
fn test_nested_contexts_enumerate_leaf_paths() {
    init_logging();
    let mut server = running_registry::<3>("server", "it-naming-tree");
    server.register(0, "Root/A", Arc::new(CounterServant::default()), None).unwrap();
    server.register(1, "Root/Sub/B", Arc::new(CounterServant::default()), None).unwrap();
    server.register(2, "Root/Sub/C", Arc::new(CounterServant::default()), None).unwrap();

    let client = client_session("it-naming-tree");
    assert_eq!(
        sorted(client.enumerate_names().unwrap()),
        vec!["Root/A", "Root/Sub/B", "Root/Sub/C"]
    );

    // context entries themselves are not reported
    let root: Vec<_> = client
        .naming()
        .list(10)
        .unwrap()
        .0
        .into_iter()
        .map(|binding| binding.binding_name.to_string())
        .collect();
    assert_eq!(root, vec!["Root"]);
}

#[test]
fn test_enumeration_tracks_register_and_unregister() {
    init_logging();
    let mut server = running_registry::<1>("server", "it-naming-track");
    let client = client_session("it-naming-track");
    assert!(client.enumerate_names().unwrap().is_empty());

    server.register(0, "Svc/X", Arc::new(CounterServant::default()), None).unwrap();
    assert_eq!(client.enumerate_names().unwrap(), vec!["Svc/X"]);

    server.unregister(0).unwrap();
    assert!(client.enumerate_names().unwrap().is_empty());
}

#[test]
fn test_small_pages_see_every_binding() {
    init_logging();
    let mut server = running_registry::<5>("server", "it-naming-pages");
    for slot in 0..5 {
        server
            .register(slot, &format!("Pool/member{}", slot), Arc::new(CounterServant::default()), None)
            .unwrap();
    }

    let paged = Session::with_config(
        "paged",
        orb_args("it-naming-pages"),
        SessionConfig::new().with_list_page_size(2),
    )
    .unwrap();
    let names = sorted(paged.enumerate_names().unwrap());
    assert_eq!(names.len(), 5);
    assert_eq!(names[0], "Pool/member0");
    assert_eq!(names[4], "Pool/member4");
}

#[test]
fn test_register_under_object_binding_fails() {
    init_logging();
    let mut server = running_registry::<2>("server", "it-naming-clash");
    server.register(0, "Svc", Arc::new(CounterServant::default()), None).unwrap();

    let err = server
        .register(1, "Svc/Below", Arc::new(CounterServant::default()), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!server.is_registered(1));
    assert_eq!(server.adapter().active_objects(), 1);
}

#[test]
fn test_manual_context_is_shared_across_sessions() {
    init_logging();
    let writer = client_session("it-naming-shared");
    let reader = client_session("it-naming-shared");

    let shared = writer
        .naming()
        .bind_new_context(&Name::parse("Shared").unwrap())
        .unwrap();
    shared
        .bind(&Name::parse("Self.ctx").unwrap(), shared.as_object())
        .unwrap();

    let found = NamingContext::narrow(&reader.resolve("Shared").unwrap())
        .unwrap()
        .expect("Shared is a naming context");
    assert!(found.as_object().is_equivalent(shared.as_object()));
    assert_eq!(reader.enumerate_names().unwrap(), vec!["Shared/Self.ctx"]);
}
