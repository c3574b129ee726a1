//! Destroyable Reference Tests
//!
//! Transient tokens are issued by a factory on a server registry; the
//! client owns each one through a `Destroyable` and the factory counts
//! how many `destroy` calls actually arrived.

mod common;

use std::sync::Arc;

use common::*;
use orb::{ErrorKind, Interface};
use orbkit::{Destroyable, OrbkitError, ServantRegistry, Session};

struct Setup {
    server: ServantRegistry<1>,
    factory: TokenFactory,
    _client: Arc<Session>,
}

impl Setup {
    fn new(domain: &str) -> Self {
        init_logging();
        let mut server = running_registry::<1>("tokens", domain);
        server
            .register(0, "Svc/Tokens", Arc::new(TokenFactoryServant::default()), None)
            .unwrap();

        let client = client_session(domain);
        let factory = TokenFactory::narrow(&client.resolve("Svc/Tokens").unwrap())
            .unwrap()
            .expect("bound object is a token factory");
        Self {
            server,
            factory,
            _client: client,
        }
    }

    fn destroyed(&self) -> usize {
        self.server
            .servant::<TokenFactoryServant>(0)
            .map_or(0, TokenFactoryServant::destroyed)
    }
}

#[test]
fn test_scope_exit_destroys_exactly_once() {
    let setup = Setup::new("it-destroy-scope");
    {
        let token = Destroyable::new(setup.factory.issue().unwrap());
        assert_eq!(token.get().unwrap().serial().unwrap(), 1);
    }
    assert_eq!(setup.destroyed(), 1);
}

#[test]
fn test_moved_owner_destroys_once() {
    let setup = Setup::new("it-destroy-move");
    let source = Destroyable::new(setup.factory.issue().unwrap());

    let holder = std::thread::spawn(move || {
        let owned = source;
        owned.get().map(|token| token.serial().unwrap())
    });
    assert_eq!(holder.join().unwrap(), Some(1));
    assert_eq!(setup.destroyed(), 1);
}

#[test]
fn test_take_leaves_nil_owner_behind() {
    let setup = Setup::new("it-destroy-take");
    let mut source = Destroyable::new(setup.factory.issue().unwrap());
    let dest = std::mem::take(&mut source);

    assert!(source.is_nil());
    drop(source);
    assert_eq!(setup.destroyed(), 0);

    drop(dest);
    assert_eq!(setup.destroyed(), 1);
}

#[test]
fn test_replace_destroys_previous_token() {
    let setup = Setup::new("it-destroy-replace");
    let mut owned = Destroyable::new(setup.factory.issue().unwrap());

    owned.replace(Destroyable::new(setup.factory.issue().unwrap()));
    assert_eq!(setup.destroyed(), 1);
    assert_eq!(owned.get().unwrap().serial().unwrap(), 2);

    drop(owned);
    assert_eq!(setup.destroyed(), 2);
}

#[test]
fn test_close_after_server_stop_reports_failure() {
    let mut setup = Setup::new("it-destroy-stopped");
    let mut owned = Destroyable::new(setup.factory.issue().unwrap());

    setup.server.stop();
    let err = owned.close().unwrap_err();
    assert!(matches!(err, OrbkitError::RemoteTeardown { .. }));
    assert_eq!(err.kind(), ErrorKind::CommunicationFailure);
    assert!(owned.is_nil());
}

#[test]
fn test_release_keeps_token_alive() {
    let setup = Setup::new("it-destroy-release");
    let mut owned = Destroyable::new(setup.factory.issue().unwrap());
    let token = owned.release().unwrap();
    drop(owned);

    assert_eq!(setup.destroyed(), 0);
    assert_eq!(token.serial().unwrap(), 1);

    let mut adopted = Destroyable::from(token);
    adopted.close().unwrap();
    assert_eq!(setup.destroyed(), 1);
}
