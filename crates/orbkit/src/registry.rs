//! Servant registry
//!
//! A [`ServantRegistry<N>`] owns `N` servant slots activated under one
//! persistent child adapter and published in the naming directory.
//!
//! Slot lifecycle:
//!
//! ```text
//!   Unregistered ──register──▶ Registered
//!        ▲                        │
//!        └──unregister / drop─────┘
//! ```
//!
//! Registering an occupied slot retires the previous occupant first.

use std::any::type_name;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use orb::{
    Interface, Name, ObjectAdapter, ObjectId, ObjectRef, OrbError, Policies, Servant, Skeleton,
    ROOT_POA,
};
use tracing::{debug, info, trace, warn};

use crate::config::RegistryConfig;
use crate::error::{OrbkitError, Result};
use crate::session::Session;
use crate::signal::StopSignal;

/// Callback run once after a slot has been retired
pub type Cleanup = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Slot {
    /// Registered servant; `None` for an empty slot
    servant: Option<Arc<dyn Servant>>,
    /// Identity of the activated servant in the registry's adapter
    object_id: Option<ObjectId>,
    /// Name the reference is published under, if any
    bound_name: Option<Name>,
    /// Reference to the activated servant; nil for an empty slot
    reference: ObjectRef,
    /// Run once after the slot is retired
    cleanup: Option<Cleanup>,
}

/// Fixed-arity registry of servants under one adapter
pub struct ServantRegistry<const N: usize> {
    session: Arc<Session>,
    config: RegistryConfig,
    adapter: ObjectAdapter,
    slots: [Slot; N],
    worker: Option<JoinHandle<orb::Result<()>>>,
}

impl<const N: usize> ServantRegistry<N> {
    /// Number of slots
    pub const ARITY: usize = N;

    /// Create a session and a registry on it
    pub fn create<A, S>(name: &str, args: A, config: RegistryConfig) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let session = Arc::new(Session::create(name, args)?);
        Self::with_session(session, config)
    }

    /// Create a registry on an existing session
    ///
    /// Activates the root adapter's manager and creates the persistent
    /// child adapter every slot is activated under.
    pub fn with_session(session: Arc<Session>, config: RegistryConfig) -> Result<Self> {
        let init = |source| OrbkitError::Initialization {
            session: session.name().to_string(),
            source,
        };

        let root_obj = session
            .orb()
            .resolve_initial_references(ROOT_POA)
            .map_err(init)?;
        let root = ObjectAdapter::narrow(&root_obj)
            .ok_or_else(|| init(OrbError::Initialize("RootPOA is not an object adapter".to_string())))?;
        root.the_manager().activate().map_err(init)?;

        let adapter_name = config.adapter_name_for(session.name(), |name| root.find_child(name).is_some());
        let adapter = root
            .create_child(&adapter_name, Some(root.the_manager()), Policies::persistent())
            .map_err(init)?;
        debug!("session {}: registry of {} slots on adapter {}", session.name(), N, adapter.path());

        Ok(Self {
            session,
            config,
            adapter,
            slots: std::array::from_fn(|_| Slot::default()),
            worker: None,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn adapter(&self) -> &ObjectAdapter {
        &self.adapter
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    fn check(slot: usize) -> Result<()> {
        if slot >= N {
            return Err(OrbkitError::SlotOutOfRange { slot, arity: N });
        }
        Ok(())
    }

    /// Activate `servant` in `slot` and bind it at `name`
    ///
    /// Any previous occupant of the slot is unregistered first. Returns
    /// the typed reference that was bound.
    pub fn register<S: Skeleton>(
        &mut self,
        slot: usize,
        name: &str,
        servant: Arc<S>,
        cleanup: Option<Cleanup>,
    ) -> Result<S::Interface> {
        Self::check(slot)?;
        if name.is_empty() {
            return Err(OrbkitError::InvalidArgument(format!("empty bound name for slot {}", slot)));
        }
        let path = Name::parse(name).map_err(|e| OrbkitError::binding(name, e))?;

        self.unregister(slot)?;

        let servant: Arc<dyn Servant> = servant;
        let oid = self.adapter.activate(servant.clone())?;
        let obj = match self.adapter.id_to_reference(&oid) {
            Ok(obj) => obj,
            Err(e) => {
                self.retire_object(slot, &oid);
                return Err(e.into());
            }
        };

        let typed = match S::Interface::narrow(&obj) {
            Ok(Some(typed)) => typed,
            Ok(None) => {
                self.retire_object(slot, &oid);
                return Err(OrbkitError::InterfaceMismatch {
                    name: name.to_string(),
                    expected: S::Interface::REPOSITORY_ID,
                });
            }
            Err(e) => {
                self.retire_object(slot, &oid);
                return Err(OrbkitError::resolution(name, e));
            }
        };

        if let Err(e) = self.session.bind_path(&path, &obj) {
            self.retire_object(slot, &oid);
            return Err(e);
        }

        info!("session {}: slot {} registered as {} ({})", self.session.name(), slot, path, oid);
        self.slots[slot] = Slot {
            servant: Some(servant),
            object_id: Some(oid),
            bound_name: Some(path),
            reference: obj,
            cleanup,
        };
        Ok(typed)
    }

    fn retire_object(&self, slot: usize, oid: &ObjectId) {
        if let Err(e) = self.adapter.deactivate(oid) {
            debug!("session {}: slot {}: rollback of {} failed: {}", self.session.name(), slot, oid, e);
        }
    }

    /// Unbind, deactivate and clear `slot`, then run its cleanup
    ///
    /// Unregistering an empty slot does nothing. Directory failures are
    /// logged and never stop the slot from being cleared.
    pub fn unregister(&mut self, slot: usize) -> Result<()> {
        Self::check(slot)?;
        let Slot {
            servant,
            object_id,
            bound_name,
            reference,
            cleanup,
        } = std::mem::take(&mut self.slots[slot]);

        let Some(path) = bound_name else {
            return Ok(());
        };

        match self.session.naming().unbind(&path) {
            Ok(()) => debug!("session {}: slot {}: unbound {}", self.session.name(), slot, path),
            Err(e) if e.kind() == orb::ErrorKind::NotFound => {
                debug!("session {}: slot {}: {} already gone", self.session.name(), slot, path)
            }
            Err(e) => warn!(
                "session {}: slot {}: unbind {} failed ({:?}): {}",
                self.session.name(),
                slot,
                path,
                e.kind(),
                e
            ),
        }

        if let Some(oid) = object_id {
            if let Err(e) = self.adapter.deactivate(&oid) {
                debug!("session {}: slot {}: deactivate {}: {}", self.session.name(), slot, oid, e);
            }
        }
        drop(reference);
        drop(servant);

        if let Some(cleanup) = cleanup {
            cleanup();
        }
        info!("session {}: slot {} unregistered", self.session.name(), slot);
        Ok(())
    }

    /// Unregister every slot in slot order
    pub fn shutdown_all(&mut self) {
        for slot in 0..N {
            // Slot index is always in range here.
            let _ = self.unregister(slot);
        }
    }

    /// Servant in `slot`, if registered
    pub fn get(&self, slot: usize) -> Option<Arc<dyn Servant>> {
        self.slots.get(slot)?.servant.clone()
    }

    /// Servant in `slot` downcast to its concrete type
    pub fn servant<S: Servant>(&self, slot: usize) -> Option<&S> {
        self.slots.get(slot)?.servant.as_ref()?.as_any().downcast_ref::<S>()
    }

    pub fn is_registered(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.servant.is_some())
    }

    pub fn bound_name(&self, slot: usize) -> Option<&Name> {
        self.slots.get(slot)?.bound_name.as_ref()
    }

    pub fn object_id(&self, slot: usize) -> Option<ObjectId> {
        self.slots.get(slot)?.object_id
    }

    /// Cached self-reference of `slot`; nil when unregistered
    pub fn reference(&self, slot: usize) -> ObjectRef {
        self.slots
            .get(slot)
            .map(|s| s.reference.duplicate())
            .unwrap_or_default()
    }

    /// Start the request loop on a background thread
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(OrbkitError::AlreadyRunning);
        }
        if self.session.orb().is_running() {
            debug!("session {}: request loop already served elsewhere", self.session.name());
            return Ok(());
        }

        let orb = self.session.orb().clone();
        let worker = thread::Builder::new()
            .name(format!("{}-orb", self.session.name()))
            .spawn(move || orb.run())
            .map_err(|e| OrbkitError::Initialization {
                session: self.session.name().to_string(),
                source: OrbError::Initialize(format!("cannot spawn request loop: {}", e)),
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Serve requests until `stop` is triggered
    ///
    /// Starts the request loop if needed, then blocks the calling thread.
    /// The loop itself keeps running until [`stop`](Self::stop) or drop.
    pub fn run(&mut self, stop: &StopSignal) -> Result<()> {
        if self.worker.is_none() {
            self.start()?;
        }
        info!("session {}: serving until stopped", self.session.name());
        while !stop.wait_timeout(self.config.poll_interval) {
            if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
                warn!("session {}: request loop exited on its own", self.session.name());
                break;
            }
            trace!("session {}: still serving", self.session.name());
        }
        Ok(())
    }

    /// Retire every slot, destroy the adapter and stop the request loop
    pub fn stop(&mut self) {
        self.shutdown_all();
        self.adapter.destroy();

        let Some(worker) = self.worker.take() else {
            return;
        };
        self.session.orb().shutdown();
        match worker.join() {
            Ok(Ok(())) => debug!("session {}: request loop joined", self.session.name()),
            Ok(Err(e)) => warn!("session {}: request loop failed: {}", self.session.name(), e),
            Err(_) => warn!("session {}: request loop panicked", self.session.name()),
        }
    }
}

impl<const N: usize> Drop for ServantRegistry<N> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<const N: usize> std::fmt::Debug for ServantRegistry<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<_> = (0..N).filter(|&slot| self.is_registered(slot)).collect();
        f.debug_struct(type_name::<Self>())
            .field("session", &self.session.name())
            .field("adapter", &self.adapter.path())
            .field("registered", &registered)
            .finish()
    }
}
