//! Object adapters
//!
//! An object adapter maps object ids to servants and manages their
//! activation lifecycle. Adapters form a tree under the ORB's `RootPOA`;
//! each has a manager that gates request processing:
//!
//! ```text
//!   Holding ──activate──▶ Active ──deactivate──▶ Inactive
//!      ▲                    │
//!      └──hold_requests─────┘
//! ```
//!
//! Requests reaching a holding adapter fail with `Transient`; requests
//! reaching an inactive or destroyed adapter fail with `ObjectNotExist`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{OrbError, Result};
use crate::identifiers::{AdapterId, ObjectId, OrbId};
use crate::reference::{ObjectRef, Target};
use crate::runtime::Endpoint;
use crate::servant::{Current, Servant};

/// Repository id reported by adapter references
pub const ADAPTER_REPOSITORY_ID: &str = "IDL:omg.org/PortableServer/POA:2.3";

/// Lifespan policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifespan {
    /// References die with the adapter instance
    #[default]
    Transient,
    /// References stay meaningful across re-creation of the same adapter path
    Persistent,
}

/// Servant retention policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Retention {
    /// Keep activated servants in the active object map
    #[default]
    Retain,
    /// No active object map; explicit activation is refused
    NonRetain,
}

/// Policies applied when creating an adapter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policies {
    pub lifespan: Lifespan,
    pub retention: Retention,
}

impl Policies {
    /// Persistent lifespan, retained servants
    pub fn persistent() -> Self {
        Self {
            lifespan: Lifespan::Persistent,
            retention: Retention::Retain,
        }
    }

    /// Transient lifespan, retained servants
    pub fn transient() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}

/// Adapter manager state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Holding,
    Active,
    Inactive,
}

/// Gate controlling request processing for one or more adapters
#[derive(Clone)]
pub struct AdapterManager {
    state: Arc<RwLock<ManagerState>>,
}

impl AdapterManager {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ManagerState::Holding)),
        }
    }

    /// Start dispatching requests
    pub fn activate(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state == ManagerState::Inactive {
            return Err(OrbError::BadInvOrder("adapter manager is inactive".to_string()));
        }
        *state = ManagerState::Active;
        Ok(())
    }

    /// Refuse requests with a transient failure until reactivated
    pub fn hold_requests(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state == ManagerState::Inactive {
            return Err(OrbError::BadInvOrder("adapter manager is inactive".to_string()));
        }
        *state = ManagerState::Holding;
        Ok(())
    }

    /// Permanently stop dispatching
    pub fn deactivate(&self) {
        *self.state.write() = ManagerState::Inactive;
    }

    pub fn state(&self) -> ManagerState {
        *self.state.read()
    }
}

pub(crate) struct AdapterCore {
    id: AdapterId,
    name: String,
    path: String,
    orb: OrbId,
    domain: Arc<str>,
    policies: Policies,
    manager: AdapterManager,
    endpoint: Weak<Endpoint>,
    parent: Weak<AdapterCore>,
    servants: RwLock<HashMap<ObjectId, Arc<dyn Servant>>>,
    children: RwLock<HashMap<String, Arc<AdapterCore>>>,
    destroyed: AtomicBool,
}

impl AdapterCore {
    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn servant(&self, object: &ObjectId) -> Option<Arc<dyn Servant>> {
        self.servants.read().get(object).cloned()
    }

    /// Execute a request against an active servant
    pub(crate) fn dispatch(
        self: &Arc<Self>,
        object: ObjectId,
        operation: &str,
        args: Bytes,
    ) -> Result<Bytes> {
        if self.is_destroyed() {
            return Err(OrbError::ObjectNotExist(format!("adapter {} is destroyed", self.path)));
        }
        match self.manager.state() {
            ManagerState::Active => {}
            ManagerState::Holding => {
                return Err(OrbError::Transient(format!(
                    "adapter {} is holding requests",
                    self.path
                )))
            }
            ManagerState::Inactive => {
                return Err(OrbError::ObjectNotExist(format!(
                    "adapter {} is inactive",
                    self.path
                )))
            }
        }

        let servant = self
            .servant(&object)
            .ok_or_else(|| OrbError::ObjectNotExist(format!("{} in {}", object, self.path)))?;

        trace!("dispatch {} on {} in {}", operation, object, self.path);
        let current = Current::new(ObjectAdapter { core: self.clone() }, object, operation);
        servant.invoke(&current, operation, args)
    }
}

/// Handle to an object adapter
#[derive(Clone)]
pub struct ObjectAdapter {
    core: Arc<AdapterCore>,
}

impl ObjectAdapter {
    /// Create the root adapter of an ORB
    pub(crate) fn root(orb: &OrbId, domain: &str, endpoint: &Arc<Endpoint>) -> Self {
        let path = crate::ROOT_POA.to_string();
        let core = Arc::new(AdapterCore {
            id: AdapterId::transient(&path),
            name: path.clone(),
            path,
            orb: orb.clone(),
            domain: domain.into(),
            policies: Policies::transient(),
            manager: AdapterManager::new(),
            endpoint: Arc::downgrade(endpoint),
            parent: Weak::new(),
            servants: RwLock::new(HashMap::new()),
            children: RwLock::new(HashMap::new()),
            destroyed: AtomicBool::new(false),
        });
        endpoint.add_adapter(&core.id, &core);
        Self { core }
    }

    /// Checked conversion from a generic reference
    pub fn narrow(obj: &ObjectRef) -> Option<ObjectAdapter> {
        match &obj.ior()?.target {
            Target::Adapter(core) => core
                .upgrade()
                .filter(|core| !core.is_destroyed())
                .map(|core| ObjectAdapter { core }),
            _ => None,
        }
    }

    /// Generic reference to this adapter
    pub fn as_object(&self) -> ObjectRef {
        ObjectRef::new(ADAPTER_REPOSITORY_ID, Target::Adapter(Arc::downgrade(&self.core)))
    }

    pub fn id(&self) -> &AdapterId {
        &self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Slash-separated path from the root adapter
    pub fn path(&self) -> &str {
        &self.core.path
    }

    pub fn policies(&self) -> Policies {
        self.core.policies
    }

    pub fn the_manager(&self) -> &AdapterManager {
        &self.core.manager
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    /// Create a child adapter
    ///
    /// With no manager given the child gets its own, initially holding.
    pub fn create_child(
        &self,
        name: &str,
        manager: Option<&AdapterManager>,
        policies: Policies,
    ) -> Result<ObjectAdapter> {
        if name.is_empty() || name.contains('/') {
            return Err(OrbError::InvalidName(format!("bad adapter name {:?}", name)));
        }
        if self.is_destroyed() {
            return Err(OrbError::ObjectNotExist(format!("adapter {} is destroyed", self.core.path)));
        }

        let path = format!("{}/{}", self.core.path, name);
        let mut children = self.core.children.write();
        if children.contains_key(name) {
            return Err(OrbError::AdapterAlreadyExists(path));
        }

        let id = match policies.lifespan {
            Lifespan::Persistent => AdapterId::persistent(&self.core.orb, &path),
            Lifespan::Transient => AdapterId::transient(&path),
        };
        let core = Arc::new(AdapterCore {
            id,
            name: name.to_string(),
            path,
            orb: self.core.orb.clone(),
            domain: self.core.domain.clone(),
            policies,
            manager: manager.cloned().unwrap_or_else(AdapterManager::new),
            endpoint: self.core.endpoint.clone(),
            parent: Arc::downgrade(&self.core),
            servants: RwLock::new(HashMap::new()),
            children: RwLock::new(HashMap::new()),
            destroyed: AtomicBool::new(false),
        });
        children.insert(name.to_string(), core.clone());
        drop(children);

        if let Some(endpoint) = self.core.endpoint.upgrade() {
            endpoint.add_adapter(&core.id, &core);
        }
        debug!("created adapter {} ({:?})", core.path, policies.lifespan);
        Ok(ObjectAdapter { core })
    }

    pub fn find_child(&self, name: &str) -> Option<ObjectAdapter> {
        self.core
            .children
            .read()
            .get(name)
            .map(|core| ObjectAdapter { core: core.clone() })
    }

    /// Activate a servant under a system-assigned object id
    pub fn activate(&self, servant: Arc<dyn Servant>) -> Result<ObjectId> {
        if self.is_destroyed() {
            return Err(OrbError::ObjectNotExist(format!("adapter {} is destroyed", self.core.path)));
        }
        if self.core.policies.retention == Retention::NonRetain {
            return Err(OrbError::WrongPolicy(format!(
                "adapter {} does not retain servants",
                self.core.path
            )));
        }

        let mut servants = self.core.servants.write();
        if servants.values().any(|active| Arc::ptr_eq(active, &servant)) {
            return Err(OrbError::ServantAlreadyActive);
        }
        let oid = ObjectId::generate();
        debug!("activating {} as {} in {}", servant.repository_id(), oid, self.core.path);
        servants.insert(oid, servant);
        Ok(oid)
    }

    /// Build a reference for an active object
    pub fn id_to_reference(&self, oid: &ObjectId) -> Result<ObjectRef> {
        let servant = self.id_to_servant(oid)?;
        Ok(ObjectRef::new(
            servant.repository_id(),
            Target::Servant {
                domain: self.core.domain.clone(),
                orb: self.core.orb.clone(),
                endpoint: self.core.endpoint.clone(),
                adapter: self.core.id.clone(),
                object: *oid,
            },
        ))
    }

    pub fn id_to_servant(&self, oid: &ObjectId) -> Result<Arc<dyn Servant>> {
        self.core
            .servant(oid)
            .ok_or_else(|| OrbError::ObjectNotActive(format!("{} in {}", oid, self.core.path)))
    }

    /// Remove an object from the active object map
    pub fn deactivate(&self, oid: &ObjectId) -> Result<()> {
        // The servant is dropped outside the table lock.
        let removed = self.core.servants.write().remove(oid);
        match removed {
            Some(servant) => {
                debug!("deactivated {} ({}) in {}", oid, servant.repository_id(), self.core.path);
                Ok(())
            }
            None => Err(OrbError::ObjectNotActive(format!("{} in {}", oid, self.core.path))),
        }
    }

    /// Number of objects in the active object map
    pub fn active_objects(&self) -> usize {
        self.core.servants.read().len()
    }

    /// Destroy this adapter and all of its descendants
    pub fn destroy(&self) {
        if self.core.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let children: Vec<Arc<AdapterCore>> =
            self.core.children.write().drain().map(|(_, child)| child).collect();
        for child in children {
            ObjectAdapter { core: child }.destroy();
        }

        let servants = std::mem::take(&mut *self.core.servants.write());
        if let Some(parent) = self.core.parent.upgrade() {
            parent.children.write().remove(&self.core.name);
        }
        if let Some(endpoint) = self.core.endpoint.upgrade() {
            endpoint.remove_adapter(&self.core.id);
        }
        debug!("destroyed adapter {} ({} servants released)", self.core.path, servants.len());
    }
}

impl std::fmt::Debug for ObjectAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectAdapter")
            .field("id", &self.core.id)
            .field("path", &self.core.path)
            .field("policies", &self.core.policies)
            .finish()
    }
}
