//! Servant traits
//!
//! A servant is the object-side implementation that handles requests for
//! one activated object identity.

use std::any::Any;

use bytes::Bytes;

use crate::adapter::ObjectAdapter;
use crate::error::Result;
use crate::identifiers::ObjectId;
use crate::reference::Interface;

/// Per-request context handed to a servant
///
/// Gives the servant access to the adapter it is activated under and its
/// own object id, which is what a transient object needs to retire
/// itself on `destroy`.
pub struct Current {
    adapter: ObjectAdapter,
    object_id: ObjectId,
    operation: String,
}

impl Current {
    pub(crate) fn new(adapter: ObjectAdapter, object_id: ObjectId, operation: &str) -> Self {
        Self {
            adapter,
            object_id,
            operation: operation.to_string(),
        }
    }

    pub fn adapter(&self) -> &ObjectAdapter {
        &self.adapter
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Trait for servant implementations
pub trait Servant: Send + Sync + 'static {
    /// Most-derived repository id this servant implements
    fn repository_id(&self) -> &'static str;

    /// Whether the servant supports the given interface
    fn is_a(&self, repository_id: &str) -> bool {
        repository_id == self.repository_id()
    }

    /// Execute one operation
    fn invoke(&self, current: &Current, operation: &str, args: Bytes) -> Result<Bytes>;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Servant with a statically known client-side interface
///
/// This is the server-side dispatch base for one interface: the adapter
/// hands out references that narrow to `Self::Interface`.
pub trait Skeleton: Servant + Sized {
    type Interface: Interface;
}
