//! Hierarchical naming directory
//!
//! Every domain hosts one directory of contexts. A context maps single
//! name components to either an object reference or another context;
//! compound names are resolved by walking contexts component by
//! component.

mod context;
mod name;
mod store;

pub use context::{BindingIterator, NamingContext};
pub use name::{Name, NameComponent};

pub(crate) use store::NamingStore;

/// What a binding refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingType {
    Object,
    Context,
}

/// One entry returned by `list`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub binding_name: Name,
    pub binding_type: BindingType,
}
