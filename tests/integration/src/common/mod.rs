//! Shared fixtures for the lifecycle suites
//!
//! Every test brings its processes up in its own `-ORBDomain`, so suites
//! running in parallel never see each other's directory entries.

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use orb::cdr::{CdrReader, CdrWriter};
use orb::{Current, Interface, ObjectRef, OrbError, Result, Servant, Skeleton, Transient};
use orbkit::{RegistryConfig, ServantRegistry, Session};

/// Install a test-friendly subscriber once per test binary
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// ORB arguments placing a process in `domain`
pub fn orb_args(domain: &str) -> [String; 2] {
    ["-ORBDomain".to_string(), domain.to_string()]
}

/// A client-side session in `domain`
pub fn client_session(domain: &str) -> Arc<Session> {
    Arc::new(Session::create("client", orb_args(domain)).expect("client session"))
}

/// A server registry in `domain` with its request loop running
pub fn running_registry<const N: usize>(name: &str, domain: &str) -> ServantRegistry<N> {
    let mut registry =
        ServantRegistry::create(name, orb_args(domain), RegistryConfig::default()).expect("registry");
    registry.start().expect("request loop");
    registry
}

// =============================================================================
// Counter
// =============================================================================

#[derive(Clone, Debug)]
pub struct Counter(ObjectRef);

impl Interface for Counter {
    const REPOSITORY_ID: &'static str = "IDL:lifecycle/Counter:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Counter(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl Counter {
    /// Add one and return the new value
    pub fn increment(&self) -> Result<u64> {
        let reply = self.0.invoke("increment", Bytes::new())?;
        CdrReader::new(reply).read_u64()
    }

    pub fn value(&self) -> Result<u64> {
        let reply = self.0.invoke("value", Bytes::new())?;
        CdrReader::new(reply).read_u64()
    }
}

#[derive(Default)]
pub struct CounterServant {
    value: AtomicU64,
}

impl CounterServant {
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

impl Servant for CounterServant {
    fn repository_id(&self) -> &'static str {
        Counter::REPOSITORY_ID
    }

    fn invoke(&self, _current: &Current, operation: &str, _args: Bytes) -> Result<Bytes> {
        let mut reply = CdrWriter::new();
        match operation {
            "increment" => {
                reply.write_u64(self.value.fetch_add(1, Ordering::SeqCst) + 1);
            }
            "value" => {
                reply.write_u64(self.value());
            }
            other => return Err(OrbError::BadOperation(other.to_string())),
        }
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Skeleton for CounterServant {
    type Interface = Counter;
}

// =============================================================================
// Tokens
// =============================================================================

/// Transient object handed out by the token factory
#[derive(Clone, Debug)]
pub struct Token(ObjectRef);

impl Interface for Token {
    const REPOSITORY_ID: &'static str = "IDL:lifecycle/Token:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Token(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl Transient for Token {}

impl Token {
    pub fn serial(&self) -> Result<u64> {
        let reply = self.0.invoke("serial", Bytes::new())?;
        CdrReader::new(reply).read_u64()
    }
}

struct TokenServant {
    serial: u64,
    destroyed: Arc<AtomicUsize>,
}

impl Servant for TokenServant {
    fn repository_id(&self) -> &'static str {
        Token::REPOSITORY_ID
    }

    fn invoke(&self, current: &Current, operation: &str, _args: Bytes) -> Result<Bytes> {
        let mut reply = CdrWriter::new();
        match operation {
            "serial" => {
                reply.write_u64(self.serial);
            }
            "destroy" => {
                current.adapter().deactivate(&current.object_id())?;
                self.destroyed.fetch_add(1, Ordering::SeqCst);
            }
            other => return Err(OrbError::BadOperation(other.to_string())),
        }
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug)]
pub struct TokenFactory(ObjectRef);

impl Interface for TokenFactory {
    const REPOSITORY_ID: &'static str = "IDL:lifecycle/TokenFactory:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        TokenFactory(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl TokenFactory {
    pub fn issue(&self) -> Result<Token> {
        let reply = self.0.invoke("issue", Bytes::new())?;
        CdrReader::new(reply).read_interface()
    }
}

#[derive(Default)]
pub struct TokenFactoryServant {
    issued: AtomicU64,
    destroyed: Arc<AtomicUsize>,
}

impl TokenFactoryServant {
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Tokens whose `destroy` has run
    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Servant for TokenFactoryServant {
    fn repository_id(&self) -> &'static str {
        TokenFactory::REPOSITORY_ID
    }

    fn invoke(&self, current: &Current, operation: &str, _args: Bytes) -> Result<Bytes> {
        if operation != "issue" {
            return Err(OrbError::BadOperation(operation.to_string()));
        }
        let serial = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let oid = current.adapter().activate(Arc::new(TokenServant {
            serial,
            destroyed: self.destroyed.clone(),
        }))?;
        let obj = current.adapter().id_to_reference(&oid)?;

        let mut reply = CdrWriter::new();
        reply.write_object(&obj)?;
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Skeleton for TokenFactoryServant {
    type Interface = TokenFactory;
}
