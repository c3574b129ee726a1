//! Naming directory storage shared by a domain

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::context::NamingContext;
use super::name::{rest_of, Name, NameComponent};
use super::{Binding, BindingType};
use crate::error::{NotFoundReason, OrbError, Result};
use crate::identifiers::ContextId;
use crate::reference::{Interface, ObjectRef, Target};

pub(crate) const ROOT_CONTEXT: ContextId = ContextId(0);

#[derive(Clone)]
pub(crate) enum Entry {
    Object(ObjectRef),
    Context(ContextId),
}

impl Entry {
    fn binding_type(&self) -> BindingType {
        match self {
            Entry::Object(_) => BindingType::Object,
            Entry::Context(_) => BindingType::Context,
        }
    }
}

type Table = BTreeMap<NameComponent, Entry>;

/// All contexts of one domain
pub(crate) struct NamingStore {
    domain: String,
    next_id: AtomicU64,
    contexts: RwLock<HashMap<ContextId, Table>>,
}

impl NamingStore {
    pub(crate) fn new(domain: &str) -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(ROOT_CONTEXT, Table::new());
        Self {
            domain: domain.to_string(),
            next_id: AtomicU64::new(ROOT_CONTEXT.0 + 1),
            contexts: RwLock::new(contexts),
        }
    }

    pub(crate) fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn contains(&self, context: ContextId) -> bool {
        self.contexts.read().contains_key(&context)
    }

    pub(crate) fn reference(self: &Arc<Self>, context: ContextId) -> ObjectRef {
        ObjectRef::new(
            NamingContext::REPOSITORY_ID,
            Target::Context {
                store: self.clone(),
                context,
            },
        )
    }

    pub(crate) fn root_reference(self: &Arc<Self>) -> ObjectRef {
        self.reference(ROOT_CONTEXT)
    }

    /// Walk all but the last component; returns the context holding it
    fn parent_of(
        contexts: &HashMap<ContextId, Table>,
        start: ContextId,
        name: &Name,
    ) -> Result<ContextId> {
        let components = name.components();
        let mut current = start;
        for (i, component) in components[..components.len() - 1].iter().enumerate() {
            let table = contexts
                .get(&current)
                .ok_or_else(|| OrbError::missing(rest_of(components, i)))?;
            current = match table.get(component) {
                Some(Entry::Context(next)) => *next,
                Some(Entry::Object(_)) => {
                    return Err(OrbError::NotFound {
                        reason: NotFoundReason::NotContext,
                        rest: rest_of(components, i),
                    })
                }
                None => return Err(OrbError::missing(rest_of(components, i))),
            };
        }
        if !contexts.contains_key(&current) {
            return Err(OrbError::missing(rest_of(components, components.len() - 1)));
        }
        Ok(current)
    }

    pub(crate) fn resolve(&self, start: ContextId, name: &Name) -> Result<Entry> {
        let contexts = self.contexts.read();
        let parent = Self::parent_of(&contexts, start, name)?;
        contexts
            .get(&parent)
            .and_then(|table| table.get(name.last()))
            .cloned()
            .ok_or_else(|| OrbError::missing(name.last().to_string()))
    }

    /// Bind `entry` at `name`; with `overwrite` an existing binding of the
    /// same type is replaced
    pub(crate) fn bind(&self, start: ContextId, name: &Name, entry: Entry, overwrite: bool) -> Result<()> {
        let mut contexts = self.contexts.write();
        if let Entry::Context(target) = entry {
            if !contexts.contains_key(&target) {
                return Err(OrbError::ObjectNotExist(format!("naming context {}", target)));
            }
        }
        let parent = Self::parent_of(&contexts, start, name)?;
        let table = contexts
            .get_mut(&parent)
            .ok_or_else(|| OrbError::missing(name.to_string()))?;

        let last = name.last();
        match table.get(last) {
            None => {}
            Some(_) if !overwrite => return Err(OrbError::AlreadyBound(name.to_string())),
            Some(existing) if existing.binding_type() != entry.binding_type() => {
                let reason = match entry {
                    Entry::Object(_) => NotFoundReason::NotObject,
                    Entry::Context(_) => NotFoundReason::NotContext,
                };
                return Err(OrbError::NotFound {
                    reason,
                    rest: last.to_string(),
                });
            }
            Some(_) => {}
        }
        trace!("bind {} in context {} of domain {}", name, parent, self.domain);
        table.insert(last.clone(), entry);
        Ok(())
    }

    pub(crate) fn unbind(&self, start: ContextId, name: &Name) -> Result<()> {
        let mut contexts = self.contexts.write();
        let parent = Self::parent_of(&contexts, start, name)?;
        contexts
            .get_mut(&parent)
            .and_then(|table| table.remove(name.last()))
            .map(|_| ())
            .ok_or_else(|| OrbError::missing(name.last().to_string()))
    }

    pub(crate) fn new_context(&self) -> ContextId {
        let id = ContextId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.contexts.write().insert(id, Table::new());
        id
    }

    pub(crate) fn list(&self, context: ContextId) -> Result<Vec<Binding>> {
        let contexts = self.contexts.read();
        let table = contexts
            .get(&context)
            .ok_or_else(|| OrbError::ObjectNotExist(format!("naming context {}", context)))?;
        Ok(table
            .iter()
            .map(|(component, entry)| Binding {
                binding_name: Name::from(component.clone()),
                binding_type: entry.binding_type(),
            })
            .collect())
    }

    pub(crate) fn destroy(&self, context: ContextId) -> Result<()> {
        if context == ROOT_CONTEXT {
            return Err(OrbError::BadOperation("the root naming context cannot be destroyed".to_string()));
        }
        let mut contexts = self.contexts.write();
        match contexts.get(&context) {
            None => Err(OrbError::ObjectNotExist(format!("naming context {}", context))),
            Some(table) if !table.is_empty() => Err(OrbError::NotEmpty),
            Some(_) => {
                contexts.remove(&context);
                Ok(())
            }
        }
    }
}
