//! Dynamic multi-connection client
//!
//! Connections to any number of replicas of one interface, resolved by
//! name at runtime and kept in connection order.

use std::sync::Arc;

use orb::Interface;
use tracing::{debug, warn};

use crate::error::{OrbkitError, Result};
use crate::session::Session;

/// One connected replica
#[derive(Clone, Debug)]
pub struct Connection<I> {
    name: String,
    stub: I,
}

impl<I: Interface> Connection<I> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stub(&self) -> &I {
        &self.stub
    }
}

/// Ordered, growable list of connections to one interface type
pub struct MultiClient<I: Interface> {
    session: Arc<Session>,
    entries: Vec<Connection<I>>,
}

impl<I: Interface> MultiClient<I> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            entries: Vec::new(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Resolve `name`, narrow it to `I` and append it
    pub fn connect(&mut self, name: &str) -> Result<&I> {
        let obj = self.session.resolve(name)?;
        let stub = I::narrow(&obj)
            .map_err(|e| OrbkitError::resolution(name, e))?
            .ok_or_else(|| OrbkitError::InterfaceMismatch {
                name: name.to_string(),
                expected: I::REPOSITORY_ID,
            })?;

        debug!("session {}: connected to {} as #{}", self.session.name(), name, self.entries.len());
        self.entries.push(Connection {
            name: name.to_string(),
            stub,
        });
        Ok(&self.entries[self.entries.len() - 1].stub)
    }

    /// Connect every name that resolves; returns the failures
    pub fn try_connect_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<OrbkitError> {
        let mut failures = Vec::new();
        for name in names {
            if let Err(e) = self.connect(name) {
                warn!("session {}: skipping {}: {}", self.session.name(), name, e);
                failures.push(e);
            }
        }
        failures
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&I> {
        self.entries
            .get(index)
            .map(|entry| &entry.stub)
            .ok_or(OrbkitError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            })
    }

    /// Drop the connection at `index`, shifting later ones down
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(OrbkitError::IndexOutOfBounds { index, len })?;
        entry.stub = I::nil();
        let entry = self.entries.remove(index);
        debug!("session {}: disconnected {}", self.session.name(), entry.name);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<I>> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

impl<I: Interface> Drop for MultiClient<I> {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.stub = I::nil();
        }
    }
}
