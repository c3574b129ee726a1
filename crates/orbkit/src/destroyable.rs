//! Owned transient-object references
//!
//! A [`Destroyable`] is the single owner of a transient object and tells
//! the server to retire it exactly once: on [`close`](Destroyable::close),
//! on [`replace`](Destroyable::replace), or on drop. Moving it transfers
//! ownership; `std::mem::take` leaves a nil owner behind that destroys
//! nothing.

use orb::Transient;
use tracing::{debug, warn};

use crate::error::{OrbkitError, Result};

/// Move-only owner of a transient object reference
pub struct Destroyable<T: Transient> {
    inner: Option<T>,
}

impl<T: Transient> Destroyable<T> {
    /// Take ownership of `stub`; a nil stub yields a nil owner
    pub fn new(stub: T) -> Self {
        Self {
            inner: (!stub.is_nil()).then_some(stub),
        }
    }

    pub fn nil() -> Self {
        Self { inner: None }
    }

    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    /// The owned stub, if any
    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Destroy the object now, reporting failure
    ///
    /// The owner is nil afterwards whether or not the call succeeded.
    pub fn close(&mut self) -> Result<()> {
        let Some(stub) = self.inner.take() else {
            return Ok(());
        };
        stub.destroy().map_err(|source| OrbkitError::RemoteTeardown {
            target: format!("{:?}", stub.as_object()),
            source,
        })?;
        debug!("destroyed {:?}", stub.as_object());
        Ok(())
    }

    /// Give up ownership without destroying
    pub fn release(&mut self) -> Option<T> {
        self.inner.take()
    }

    /// Destroy the held object, if any, and take ownership of `other`'s
    pub fn replace(&mut self, mut other: Destroyable<T>) {
        self.destroy_logged();
        self.inner = other.inner.take();
    }

    fn destroy_logged(&mut self) {
        if let Err(e) = self.close() {
            warn!("{}", e);
        }
    }
}

impl<T: Transient> Default for Destroyable<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: Transient> From<T> for Destroyable<T> {
    fn from(stub: T) -> Self {
        Self::new(stub)
    }
}

impl<T: Transient> Drop for Destroyable<T> {
    fn drop(&mut self) {
        self.destroy_logged();
    }
}

impl<T: Transient + std::fmt::Debug> std::fmt::Debug for Destroyable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(stub) => f.debug_tuple("Destroyable").field(stub).finish(),
            None => f.write_str("Destroyable(nil)"),
        }
    }
}
