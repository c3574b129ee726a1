//! Process-wide domain table
//!
//! A domain is the unit of visibility between ORBs: every ORB initialized
//! with the same `-ORBDomain` shares one naming directory and can route
//! stringified references to the others' endpoints.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::identifiers::OrbId;
use crate::naming::NamingStore;
use crate::runtime::Endpoint;

static DOMAINS: LazyLock<Mutex<HashMap<String, Arc<Domain>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Shared state of one domain
pub(crate) struct Domain {
    name: String,
    naming: Arc<NamingStore>,
    endpoints: RwLock<HashMap<OrbId, Weak<Endpoint>>>,
}

impl Domain {
    /// Get the named domain, creating it on first use
    pub(crate) fn attach(name: &str) -> Arc<Domain> {
        let mut domains = DOMAINS.lock();
        domains
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("creating domain {}", name);
                Arc::new(Domain {
                    name: name.to_string(),
                    naming: Arc::new(NamingStore::new(name)),
                    endpoints: RwLock::new(HashMap::new()),
                })
            })
            .clone()
    }

    /// Look up an existing domain
    pub(crate) fn lookup(name: &str) -> Option<Arc<Domain>> {
        DOMAINS.lock().get(name).cloned()
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn naming(&self) -> &Arc<NamingStore> {
        &self.naming
    }

    /// Register an ORB endpoint; fails if a live ORB already uses the id
    pub(crate) fn register_endpoint(&self, id: &OrbId, endpoint: &Arc<Endpoint>) -> bool {
        let mut endpoints = self.endpoints.write();
        if endpoints
            .get(id)
            .is_some_and(|existing| existing.strong_count() > 0)
        {
            return false;
        }
        endpoints.insert(id.clone(), Arc::downgrade(endpoint));
        true
    }

    pub(crate) fn remove_endpoint(&self, id: &OrbId) {
        self.endpoints.write().remove(id);
    }

    /// Endpoint for an ORB id; dangling if the ORB is gone
    pub(crate) fn endpoint(&self, id: &OrbId) -> Weak<Endpoint> {
        self.endpoints.read().get(id).cloned().unwrap_or_default()
    }
}
