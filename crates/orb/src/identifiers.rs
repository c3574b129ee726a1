//! Broker identifier types
//!
//! - `OrbId`: names one ORB inside a domain
//! - `AdapterId`: names one object adapter inside an ORB
//! - `ObjectId`: system-assigned identity of an activated servant
//! - `ContextId`: names one naming context inside a domain

use std::fmt;
use std::sync::Arc;

/// Object identity assigned by an adapter on activation
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u128);

impl ObjectId {
    /// Generate a new random object id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().as_u128())
    }

    /// Parse the hex form produced by `Display`
    pub fn parse(s: &str) -> Option<Self> {
        u128::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OID({:032x})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Identifier of an ORB within its domain
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OrbId(Arc<str>);

impl OrbId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh ORB id
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(format!("orb-{}", &uuid.simple().to_string()[..12]).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrbId({})", self.0)
    }
}

impl fmt::Display for OrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an object adapter
///
/// Persistent adapters get an id derived from their ORB id and adapter
/// path so references stay meaningful across a restart of the same ORB;
/// transient adapters get a unique suffix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AdapterId(Arc<str>);

impl AdapterId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub(crate) fn persistent(orb: &OrbId, path: &str) -> Self {
        Self(format!("{}/{}", orb, path).into())
    }

    pub(crate) fn transient(path: &str) -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(format!("{}#{}", path, &uuid.simple().to_string()[..8]).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdapterId({})", self.0)
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a naming context within a domain
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
