//! In-process object request broker
//!
//! This crate is the middleware substrate the `orbkit` lifecycle framework
//! runs on. It models the parts of a CORBA-style broker that object
//! lifecycles depend on, without a network wire format.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Orb (per process unit)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Object Adapters       │  Request Loop     │  References    │
//! │  - RootPOA + children  │  - run/shutdown   │  - ObjectRef   │
//! │  - lifespan policies   │  - inline collo-  │  - narrow/nil  │
//! │  - activate/deactivate │    cated dispatch │  - IOR strings │
//! ├─────────────────────────────────────────────────────────────┤
//! │                Domain (shared by all ORBs of a name)        │
//! │  - naming directory (contexts, bindings, iterators)         │
//! │  - endpoint table for stringified references                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ORBs that pass the same `-ORBDomain` option share one naming directory
//! and can invoke each other's objects. Requests to an object are queued
//! to the owning ORB and executed by whichever thread runs [`Orb::run`].
//!
//! # Modules
//!
//! - [`runtime`]: ORB bring-up, initial references, the request loop
//! - [`adapter`]: object adapters and their managers
//! - [`reference`]: object references and the typed stub traits
//! - [`servant`]: server-side servant traits
//! - [`naming`]: the hierarchical naming directory
//! - [`cdr`]: payload encoding for operation arguments

pub mod adapter;
pub mod cdr;
pub mod naming;
pub mod reference;
pub mod runtime;
pub mod servant;

mod domain;
mod error;
mod identifiers;

pub use adapter::{AdapterManager, Lifespan, ManagerState, ObjectAdapter, Policies, Retention};
pub use error::{ErrorKind, NotFoundReason, OrbError, Result};
pub use identifiers::{AdapterId, ContextId, ObjectId, OrbId};
pub use naming::{Binding, BindingIterator, BindingType, Name, NameComponent, NamingContext};
pub use reference::{Interface, ObjectRef, Transient};
pub use runtime::{Orb, OrbConfig};
pub use servant::{Current, Servant, Skeleton};

/// Initial reference id of the root object adapter
pub const ROOT_POA: &str = "RootPOA";

/// Initial reference id of the root naming context
pub const NAME_SERVICE: &str = "NameService";

/// Domain used when no `-ORBDomain` option is given
pub const DEFAULT_DOMAIN: &str = "default";
