//! Role composition
//!
//! [`compose_roles!`](crate::compose_roles) declares a unit that provides
//! some interfaces (server role) and consumes others (client role). The
//! role list is partitioned while the macro expands: `Provided<S>` entries
//! become the slots of one [`ServantRegistry`](crate::ServantRegistry),
//! `Consumed<I>` entries the slots of one
//! [`InterfaceResolver`](crate::InterfaceResolver). Both share the unit's
//! single [`Session`](crate::Session).
//!
//! The constructor depends on the partition:
//!
//! | provided | consumed | constructor |
//! |---|---|---|
//! | > 0 | 0 | `new(name, args)` |
//! | 0 | > 0 | `new(name, args, [names; C])` |
//! | > 0 | > 0 | `new(name, args, [names; C])` |
//!
//! Service names are given in the order the `Consumed` roles appear.
//!
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use orbkit::orb::{self, Current, Interface, ObjectRef, Servant, Skeleton};
//!
//! #[derive(Clone)]
//! pub struct Clock(ObjectRef);
//!
//! impl Interface for Clock {
//!     const REPOSITORY_ID: &'static str = "IDL:doc/Clock:1.0";
//!     fn from_object(obj: ObjectRef) -> Self { Clock(obj) }
//!     fn as_object(&self) -> &ObjectRef { &self.0 }
//! }
//!
//! pub struct ClockServant;
//!
//! impl Servant for ClockServant {
//!     fn repository_id(&self) -> &'static str { Clock::REPOSITORY_ID }
//!     fn invoke(&self, _: &Current, _: &str, args: Bytes) -> orb::Result<Bytes> { Ok(args) }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! impl Skeleton for ClockServant {
//!     type Interface = Clock;
//! }
//!
//! orbkit::compose_roles! {
//!     pub struct Upstream {
//!         Provided<ClockServant>,
//!     }
//! }
//!
//! orbkit::compose_roles! {
//!     /// Reads the upstream clock and republishes its own
//!     pub struct Relay {
//!         Consumed<Clock>,
//!         Provided<ClockServant>,
//!     }
//! }
//!
//! let mut upstream = Upstream::new("upstream", ["-ORBDomain", "doc-roles"])?;
//! upstream.register::<ClockServant>("Upstream/Clock", Arc::new(ClockServant))?;
//!
//! let mut relay = Relay::new("relay", ["-ORBDomain", "doc-roles"], ["Upstream/Clock"])?;
//! let clock: Clock = relay.stub::<Clock>()?;
//! assert!(!clock.is_nil());
//!
//! relay.register::<ClockServant>("Relay/Clock", Arc::new(ClockServant))?;
//! assert!(relay.skeleton::<ClockServant>().is_some());
//! # Ok::<(), orbkit::OrbkitError>(())
//! ```
//!
//! A unit without a server role has no skeleton accessor:
//!
//! ```compile_fail
//! # use orbkit::orb::{Interface, ObjectRef};
//! # #[derive(Clone)]
//! # pub struct Clock(ObjectRef);
//! # impl Interface for Clock {
//! #     const REPOSITORY_ID: &'static str = "IDL:doc/Clock:1.0";
//! #     fn from_object(obj: ObjectRef) -> Self { Clock(obj) }
//! #     fn as_object(&self) -> &ObjectRef { &self.0 }
//! # }
//! orbkit::compose_roles! {
//!     pub struct Reader {
//!         Consumed<Clock>,
//!     }
//! }
//!
//! let reader = Reader::new("reader", ["-ORBDomain", "doc"], ["Clock"]).unwrap();
//! let _ = reader.skeleton::<Clock>();
//! ```
//!
//! Composing nothing is rejected:
//!
//! ```compile_fail
//! orbkit::compose_roles! {
//!     pub struct Nothing {}
//! }
//! ```
//!
//! So is listing the same role twice:
//!
//! ```compile_fail
//! # use orbkit::orb::{Interface, ObjectRef};
//! # #[derive(Clone)]
//! # pub struct Clock(ObjectRef);
//! # impl Interface for Clock {
//! #     const REPOSITORY_ID: &'static str = "IDL:doc/Clock:1.0";
//! #     fn from_object(obj: ObjectRef) -> Self { Clock(obj) }
//! #     fn as_object(&self) -> &ObjectRef { &self.0 }
//! # }
//! orbkit::compose_roles! {
//!     pub struct Twice {
//!         Consumed<Clock>,
//!         Consumed<Clock>,
//!     }
//! }
//! ```

use orb::{Interface, Skeleton};

/// Implemented by composed units that serve `S`
pub trait Provides<S: Skeleton> {
    /// Registry slot holding the `S` servant
    const SLOT: usize;
}

/// Implemented by composed units that consume `I`
pub trait Consumes<I: Interface> {
    /// Resolver slot holding the `I` stub
    const SLOT: usize;
}

#[doc(hidden)]
#[macro_export]
macro_rules! __count_roles {
    (@one $t:ty) => {
        1usize
    };
    ($($t:ty),*) => {
        0usize $(+ $crate::__count_roles!(@one $t))*
    };
}

/// Declare a unit composed of provided and consumed roles
///
/// See the [`roles`](crate::roles) module for the generated API.
#[macro_export]
macro_rules! compose_roles {
    // Partition finished: pick the shape.
    (@partition $attrs:tt $vis:tt $name:ident; []; []; ) => {
        compile_error!("compose_roles! needs at least one Provided<..> or Consumed<..> role");
    };
    (@partition [$(#[$meta:meta])*] [$vis:vis] $name:ident; [$($p:ty),+]; []; ) => {
        $(#[$meta])*
        $vis struct $name {
            registry: $crate::ServantRegistry<{ $crate::__count_roles!($($p),+) }>,
            session: ::std::sync::Arc<$crate::Session>,
        }

        #[allow(dead_code)]
        impl $name {
            /// Bring up a session and an empty registry
            pub fn new<A, S>(name: &str, args: A) -> $crate::Result<Self>
            where
                A: ::std::iter::IntoIterator<Item = S>,
                S: ::std::convert::AsRef<str>,
            {
                let session = ::std::sync::Arc::new($crate::Session::create(name, args)?);
                Self::from_session(session, $crate::RegistryConfig::default())
            }

            pub fn from_session(
                session: ::std::sync::Arc<$crate::Session>,
                config: $crate::RegistryConfig,
            ) -> $crate::Result<Self> {
                let registry = $crate::ServantRegistry::with_session(session.clone(), config)?;
                ::std::result::Result::Ok(Self { registry, session })
            }
        }

        $crate::compose_roles!(@common $name);
        $crate::compose_roles!(@server $name; $($p),+);
    };
    (@partition [$(#[$meta:meta])*] [$vis:vis] $name:ident; []; [$($c:ty),+]; ) => {
        $(#[$meta])*
        $vis struct $name {
            resolver: $crate::InterfaceResolver<{ $crate::__count_roles!($($c),+) }>,
            session: ::std::sync::Arc<$crate::Session>,
        }

        #[allow(dead_code)]
        impl $name {
            /// Bring up a session and resolve every consumed service
            pub fn new<A, S>(
                name: &str,
                args: A,
                services: [&str; $crate::__count_roles!($($c),+)],
            ) -> $crate::Result<Self>
            where
                A: ::std::iter::IntoIterator<Item = S>,
                S: ::std::convert::AsRef<str>,
            {
                let session = ::std::sync::Arc::new($crate::Session::create(name, args)?);
                Self::from_session(session, services)
            }

            pub fn from_session(
                session: ::std::sync::Arc<$crate::Session>,
                services: [&str; $crate::__count_roles!($($c),+)],
            ) -> $crate::Result<Self> {
                let resolver =
                    $crate::InterfaceResolver::new(session.clone(), Self::service_specs(services))?;
                ::std::result::Result::Ok(Self { resolver, session })
            }
        }

        $crate::compose_roles!(@common $name);
        $crate::compose_roles!(@client $name; $($c),+);
    };
    (@partition [$(#[$meta:meta])*] [$vis:vis] $name:ident; [$($p:ty),+]; [$($c:ty),+]; ) => {
        $(#[$meta])*
        $vis struct $name {
            registry: $crate::ServantRegistry<{ $crate::__count_roles!($($p),+) }>,
            resolver: $crate::InterfaceResolver<{ $crate::__count_roles!($($c),+) }>,
            session: ::std::sync::Arc<$crate::Session>,
        }

        #[allow(dead_code)]
        impl $name {
            /// Bring up a session, an empty registry, and resolve every
            /// consumed service
            pub fn new<A, S>(
                name: &str,
                args: A,
                services: [&str; $crate::__count_roles!($($c),+)],
            ) -> $crate::Result<Self>
            where
                A: ::std::iter::IntoIterator<Item = S>,
                S: ::std::convert::AsRef<str>,
            {
                let session = ::std::sync::Arc::new($crate::Session::create(name, args)?);
                Self::from_session(session, $crate::RegistryConfig::default(), services)
            }

            pub fn from_session(
                session: ::std::sync::Arc<$crate::Session>,
                config: $crate::RegistryConfig,
                services: [&str; $crate::__count_roles!($($c),+)],
            ) -> $crate::Result<Self> {
                let resolver =
                    $crate::InterfaceResolver::new(session.clone(), Self::service_specs(services))?;
                let registry = $crate::ServantRegistry::with_session(session.clone(), config)?;
                ::std::result::Result::Ok(Self { registry, resolver, session })
            }
        }

        $crate::compose_roles!(@common $name);
        $crate::compose_roles!(@server $name; $($p),+);
        $crate::compose_roles!(@client $name; $($c),+);
    };

    // Partition one role at a time.
    (@partition $attrs:tt $vis:tt $name:ident; [$($p:ty),*]; [$($c:ty),*]; Provided<$t:ty> $(, $($rest:tt)*)?) => {
        $crate::compose_roles!(@partition $attrs $vis $name; [$($p,)* $t]; [$($c),*]; $($($rest)*)?);
    };
    (@partition $attrs:tt $vis:tt $name:ident; [$($p:ty),*]; [$($c:ty),*]; Consumed<$t:ty> $(, $($rest:tt)*)?) => {
        $crate::compose_roles!(@partition $attrs $vis $name; [$($p),*]; [$($c,)* $t]; $($($rest)*)?);
    };
    (@partition $attrs:tt $vis:tt $name:ident; $p:tt; $c:tt; $other:tt $($rest:tt)*) => {
        compile_error!(concat!(
            "compose_roles!: expected Provided<..> or Consumed<..>, found `",
            stringify!($other),
            "`"
        ));
    };

    (@common $name:ident) => {
        #[allow(dead_code)]
        impl $name {
            pub fn session(&self) -> &::std::sync::Arc<$crate::Session> {
                &self.session
            }
        }
    };

    (@server $name:ident; $($p:ty),+) => {
        #[allow(dead_code)]
        impl $name {
            /// Number of provided roles
            pub const PROVIDED_ROLES: usize = $crate::__count_roles!($($p),+);

            pub fn registry(&self) -> &$crate::ServantRegistry<{ $crate::__count_roles!($($p),+) }> {
                &self.registry
            }

            pub fn registry_mut(&mut self) -> &mut $crate::ServantRegistry<{ $crate::__count_roles!($($p),+) }> {
                &mut self.registry
            }

            /// Register the `S` servant at `name`
            pub fn register<S>(
                &mut self,
                name: &str,
                servant: ::std::sync::Arc<S>,
            ) -> $crate::Result<<S as $crate::orb::Skeleton>::Interface>
            where
                S: $crate::orb::Skeleton,
                Self: $crate::roles::Provides<S>,
            {
                self.registry
                    .register(<Self as $crate::roles::Provides<S>>::SLOT, name, servant, None)
            }

            pub fn unregister<S>(&mut self) -> $crate::Result<()>
            where
                S: $crate::orb::Skeleton,
                Self: $crate::roles::Provides<S>,
            {
                self.registry.unregister(<Self as $crate::roles::Provides<S>>::SLOT)
            }

            /// The registered `S` servant, if any
            pub fn skeleton<S>(&self) -> ::std::option::Option<&S>
            where
                S: $crate::orb::Skeleton,
                Self: $crate::roles::Provides<S>,
            {
                self.registry.servant::<S>(<Self as $crate::roles::Provides<S>>::SLOT)
            }

            pub fn run(&mut self, stop: &$crate::StopSignal) -> $crate::Result<()> {
                self.registry.run(stop)
            }

            pub fn stop(&mut self) {
                self.registry.stop()
            }
        }

        $crate::compose_roles!(@provides $name; 0usize; $($p),+);

        $(
            const _: () = assert!(
                <$name as $crate::roles::Provides<$p>>::SLOT < <$name>::PROVIDED_ROLES
            );
        )+
        const _: () = assert!(
            $crate::ServantRegistry::<{ $crate::__count_roles!($($p),+) }>::ARITY
                == <$name>::PROVIDED_ROLES
        );
    };

    (@client $name:ident; $($c:ty),+) => {
        #[allow(dead_code)]
        impl $name {
            /// Number of consumed roles
            pub const CONSUMED_ROLES: usize = $crate::__count_roles!($($c),+);

            pub fn resolver(&self) -> &$crate::InterfaceResolver<{ $crate::__count_roles!($($c),+) }> {
                &self.resolver
            }

            /// Stub for the consumed `I` service
            pub fn stub<I>(&self) -> $crate::Result<I>
            where
                I: $crate::orb::Interface,
                Self: $crate::roles::Consumes<I>,
            {
                self.resolver
                    .get_typed::<I>(<Self as $crate::roles::Consumes<I>>::SLOT)
            }

            fn service_specs(
                services: [&str; $crate::__count_roles!($($c),+)],
            ) -> [$crate::ServiceSpec; $crate::__count_roles!($($c),+)] {
                [$(
                    $crate::ServiceSpec::of::<$c>(
                        services[<Self as $crate::roles::Consumes<$c>>::SLOT],
                    )
                ),+]
            }
        }

        $crate::compose_roles!(@consumes $name; 0usize; $($c),+);

        $(
            const _: () = assert!(
                <$name as $crate::roles::Consumes<$c>>::SLOT < <$name>::CONSUMED_ROLES
            );
        )+
        const _: () = assert!(
            $crate::InterfaceResolver::<{ $crate::__count_roles!($($c),+) }>::ARITY
                == <$name>::CONSUMED_ROLES
        );
    };

    (@provides $name:ident; $idx:expr; ) => {};
    (@provides $name:ident; $idx:expr; $head:ty $(, $tail:ty)*) => {
        impl $crate::roles::Provides<$head> for $name {
            const SLOT: usize = $idx;
        }
        $crate::compose_roles!(@provides $name; $idx + 1usize; $($tail),*);
    };

    (@consumes $name:ident; $idx:expr; ) => {};
    (@consumes $name:ident; $idx:expr; $head:ty $(, $tail:ty)*) => {
        impl $crate::roles::Consumes<$head> for $name {
            const SLOT: usize = $idx;
        }
        $crate::compose_roles!(@consumes $name; $idx + 1usize; $($tail),*);
    };

    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($roles:tt)* }) => {
        $crate::compose_roles!(@partition [$(#[$meta])*] [$vis] $name; []; []; $($roles)*);
    };
}
