//! Naming context stub

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::name::Name;
use super::store::{Entry, NamingStore};
use super::Binding;
use crate::error::{OrbError, Result};
use crate::identifiers::ContextId;
use crate::reference::{Interface, ObjectRef, Target};

/// Typed reference to a naming context
#[derive(Clone, Debug)]
pub struct NamingContext {
    obj: ObjectRef,
}

impl Interface for NamingContext {
    const REPOSITORY_ID: &'static str = "IDL:omg.org/CosNaming/NamingContext:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Self { obj }
    }

    fn as_object(&self) -> &ObjectRef {
        &self.obj
    }
}

impl NamingContext {
    fn target(&self) -> Result<(&Arc<NamingStore>, ContextId)> {
        let ior = self
            .obj
            .ior()
            .ok_or_else(|| OrbError::BadInvOrder("naming operation on a nil context".to_string()))?;
        match &ior.target {
            Target::Context { store, context } => {
                if !store.contains(*context) {
                    return Err(OrbError::ObjectNotExist(format!("naming context {}", context)));
                }
                Ok((store, *context))
            }
            _ => Err(OrbError::BadOperation(format!("{:?} is not a naming context", self.obj))),
        }
    }

    /// Context id within the store, for contexts bound into this one
    fn context_in(&self, store: &Arc<NamingStore>, other: &NamingContext) -> Result<ContextId> {
        let (other_store, other_id) = other.target()?;
        if !Arc::ptr_eq(store, other_store) {
            return Err(OrbError::BadOperation(format!(
                "context belongs to domain {}, not {}",
                other_store.domain(),
                store.domain()
            )));
        }
        Ok(other_id)
    }

    /// Look up the object or context bound at `name`
    pub fn resolve(&self, name: &Name) -> Result<ObjectRef> {
        let (store, context) = self.target()?;
        match store.resolve(context, name)? {
            Entry::Object(obj) => Ok(obj),
            Entry::Context(id) => Ok(store.reference(id)),
        }
    }

    /// Parse and resolve a stringified name
    pub fn resolve_str(&self, name: &str) -> Result<ObjectRef> {
        self.resolve(&Name::parse(name)?)
    }

    fn check_bindable(obj: &ObjectRef) -> Result<()> {
        if obj.is_nil() {
            return Err(OrbError::BadOperation("cannot bind a nil reference".to_string()));
        }
        Ok(())
    }

    /// Bind an object; fails with `AlreadyBound` if the name is taken
    pub fn bind(&self, name: &Name, obj: &ObjectRef) -> Result<()> {
        Self::check_bindable(obj)?;
        let (store, context) = self.target()?;
        store.bind(context, name, Entry::Object(obj.duplicate()), false)
    }

    /// Bind an object, replacing an existing object binding
    pub fn rebind(&self, name: &Name, obj: &ObjectRef) -> Result<()> {
        Self::check_bindable(obj)?;
        let (store, context) = self.target()?;
        store.bind(context, name, Entry::Object(obj.duplicate()), true)
    }

    /// Bind an existing context so name resolution traverses it
    pub fn bind_context(&self, name: &Name, nc: &NamingContext) -> Result<()> {
        let (store, context) = self.target()?;
        let id = self.context_in(store, nc)?;
        store.bind(context, name, Entry::Context(id), false)
    }

    pub fn rebind_context(&self, name: &Name, nc: &NamingContext) -> Result<()> {
        let (store, context) = self.target()?;
        let id = self.context_in(store, nc)?;
        store.bind(context, name, Entry::Context(id), true)
    }

    /// Create an unbound context in the same directory
    pub fn new_context(&self) -> Result<NamingContext> {
        let (store, _) = self.target()?;
        Ok(NamingContext::from_object(store.reference(store.new_context())))
    }

    /// Create a context and bind it at `name`
    pub fn bind_new_context(&self, name: &Name) -> Result<NamingContext> {
        let (store, context) = self.target()?;
        let id = store.new_context();
        if let Err(e) = store.bind(context, name, Entry::Context(id), false) {
            // Freshly created and still empty, so this cannot fail.
            let _ = store.destroy(id);
            return Err(e);
        }
        Ok(NamingContext::from_object(store.reference(id)))
    }

    pub fn unbind(&self, name: &Name) -> Result<()> {
        let (store, context) = self.target()?;
        store.unbind(context, name)
    }

    /// First `how_many` bindings, plus an iterator over the rest if any
    pub fn list(&self, how_many: usize) -> Result<(Vec<Binding>, Option<BindingIterator>)> {
        let (store, context) = self.target()?;
        let mut all: VecDeque<Binding> = store.list(context)?.into();
        let first: Vec<Binding> = all.drain(..how_many.min(all.len())).collect();
        let rest = (!all.is_empty()).then(|| BindingIterator::new(all));
        Ok((first, rest))
    }

    /// Remove this context; it must have no bindings left
    pub fn destroy(&self) -> Result<()> {
        let (store, context) = self.target()?;
        store.destroy(context)
    }
}

/// Cursor over bindings not returned by the first `list` page
#[derive(Clone, Debug)]
pub struct BindingIterator {
    remaining: Arc<Mutex<Option<VecDeque<Binding>>>>,
}

impl BindingIterator {
    fn new(remaining: VecDeque<Binding>) -> Self {
        Self {
            remaining: Arc::new(Mutex::new(Some(remaining))),
        }
    }

    /// Next page of at most `how_many` bindings; empty when exhausted
    pub fn next_n(&self, how_many: usize) -> Result<Vec<Binding>> {
        let mut remaining = self.remaining.lock();
        let remaining = remaining
            .as_mut()
            .ok_or_else(|| OrbError::ObjectNotExist("binding iterator is destroyed".to_string()))?;
        let n = how_many.min(remaining.len());
        Ok(remaining.drain(..n).collect())
    }

    /// Next single binding
    pub fn next_one(&self) -> Result<Option<Binding>> {
        Ok(self.next_n(1)?.pop())
    }

    pub fn destroy(&self) {
        self.remaining.lock().take();
    }
}
