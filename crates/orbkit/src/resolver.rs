//! Client interface resolver

use std::sync::Arc;

use orb::{Interface, ObjectRef};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{OrbkitError, Result};
use crate::session::Session;

/// Directory name and expected interface of one resolver slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSpec {
    name: String,
    repository_id: &'static str,
}

impl ServiceSpec {
    /// Expect `I` to be bound at `name`
    pub fn of<I: Interface>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository_id: I::REPOSITORY_ID,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repository_id(&self) -> &'static str {
        self.repository_id
    }
}

struct StubSlot {
    /// Name and interface the slot was declared with
    spec: ServiceSpec,
    /// Cached reference; nil after `release` until the next `get`
    reference: Mutex<ObjectRef>,
}

/// Fixed-arity set of named remote interfaces
///
/// Every slot is resolved eagerly on construction. A slot released with
/// [`release`](Self::release) is resolved again on the next `get`.
pub struct InterfaceResolver<const M: usize> {
    session: Arc<Session>,
    slots: [StubSlot; M],
}

impl<const M: usize> InterfaceResolver<M> {
    /// Number of slots
    pub const ARITY: usize = M;

    /// Resolve every service, failing on the first that is missing or of
    /// the wrong interface
    pub fn new(session: Arc<Session>, specs: [ServiceSpec; M]) -> Result<Self> {
        let slots = specs.map(|spec| StubSlot {
            spec,
            reference: Mutex::new(ObjectRef::nil()),
        });
        for slot in &slots {
            *slot.reference.lock() = Self::resolve(&session, &slot.spec)?;
        }
        debug!("session {}: resolved {} services", session.name(), M);
        Ok(Self { session, slots })
    }

    fn resolve(session: &Session, spec: &ServiceSpec) -> Result<ObjectRef> {
        let obj = session.resolve(&spec.name)?;
        match obj.is_a(spec.repository_id) {
            Ok(true) => Ok(obj),
            Ok(false) => Err(OrbkitError::InterfaceMismatch {
                name: spec.name.clone(),
                expected: spec.repository_id,
            }),
            Err(e) => Err(OrbkitError::resolution(spec.name.as_str(), e)),
        }
    }

    fn slot(&self, slot: usize) -> Result<&StubSlot> {
        self.slots
            .get(slot)
            .ok_or(OrbkitError::SlotOutOfRange { slot, arity: M })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn len(&self) -> usize {
        M
    }

    pub fn is_empty(&self) -> bool {
        M == 0
    }

    /// Directory name of `slot`
    pub fn name(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot).map(|s| s.spec.name.as_str())
    }

    /// Cached reference of `slot`, resolving it again if released
    pub fn get(&self, slot: usize) -> Result<ObjectRef> {
        let slot = self.slot(slot)?;
        let mut reference = slot.reference.lock();
        if reference.is_nil() {
            debug!("session {}: re-resolving {}", self.session.name(), slot.spec.name);
            *reference = Self::resolve(&self.session, &slot.spec)?;
        }
        Ok(reference.duplicate())
    }

    /// Typed stub for `slot`
    pub fn get_typed<I: Interface>(&self, slot: usize) -> Result<I> {
        let spec = &self.slot(slot)?.spec;
        if spec.repository_id != I::REPOSITORY_ID {
            return Err(OrbkitError::InterfaceMismatch {
                name: spec.name.clone(),
                expected: I::REPOSITORY_ID,
            });
        }
        Ok(I::from_object(self.get(slot)?))
    }

    /// Drop the cached reference of `slot`
    pub fn release(&self, slot: usize) -> Result<()> {
        *self.slot(slot)?.reference.lock() = ObjectRef::nil();
        Ok(())
    }
}

impl<const M: usize> Drop for InterfaceResolver<M> {
    fn drop(&mut self) {
        for slot in &self.slots {
            *slot.reference.lock() = ObjectRef::nil();
        }
    }
}
