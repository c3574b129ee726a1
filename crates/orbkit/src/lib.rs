//! Distributed object lifecycle framework
//!
//! Builds object lifecycles on top of the [`orb`] broker:
//!
//! - [`Session`]: one ORB plus the resolved naming directory
//! - [`ServantRegistry`]: fixed-arity servant slots published under a
//!   persistent adapter, with a background request loop
//! - [`InterfaceResolver`]: fixed-arity named remote interfaces, resolved
//!   eagerly and cached
//! - [`MultiClient`]: a growable list of connections to replicas of one
//!   interface
//! - [`Destroyable`]: single owner of a transient object that destroys it
//!   exactly once
//! - [`compose_roles!`]: a unit that both provides and consumes
//!   interfaces over one shared session
//!
//! # Example
//!
//! ```no_run
//! use orbkit::{RegistryConfig, ServantRegistry, StopSignal};
//!
//! let mut registry: ServantRegistry<2> =
//!     ServantRegistry::create("server", std::env::args(), RegistryConfig::default())?;
//! // registry.register(0, "Svc/Clock", servant, None)?;
//! registry.run(&StopSignal::new())?;
//! # Ok::<(), orbkit::OrbkitError>(())
//! ```

pub mod config;
pub mod destroyable;
pub mod error;
pub mod multi;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod signal;

pub use orb;

pub use config::{RegistryConfig, SessionConfig};
pub use destroyable::Destroyable;
pub use error::{OrbkitError, Result};
pub use multi::{Connection, MultiClient};
pub use registry::{Cleanup, ServantRegistry};
pub use resolver::{InterfaceResolver, ServiceSpec};
pub use roles::{Consumes, Provides};
pub use session::Session;
pub use signal::StopSignal;
