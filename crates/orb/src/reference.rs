//! Object references and typed stubs
//!
//! An [`ObjectRef`] is the generic, nilable handle to a remote object. It
//! is cheap to clone (`duplicate`) and carries enough addressing to route
//! a request to the ORB that owns the servant. Typed stubs wrap one and
//! implement [`Interface`]; transient objects additionally implement
//! [`Transient`] to get the terminal `destroy` operation.

use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;

use crate::adapter::AdapterCore;
use crate::domain::Domain;
use crate::error::{OrbError, Result};
use crate::identifiers::{AdapterId, ContextId, ObjectId, OrbId};
use crate::naming::NamingStore;
use crate::runtime::Endpoint;

const IOR_PREFIX: &str = "IOR:";
const IOR_NIL: &str = "IOR:nil";

/// Where a reference points
pub(crate) enum Target {
    /// A servant activated under an adapter of some ORB
    Servant {
        domain: Arc<str>,
        orb: OrbId,
        endpoint: Weak<Endpoint>,
        adapter: AdapterId,
        object: ObjectId,
    },
    /// An object adapter (local only)
    Adapter(Weak<AdapterCore>),
    /// A naming context hosted by a domain
    Context {
        store: Arc<NamingStore>,
        context: ContextId,
    },
}

/// Interoperable object reference payload
pub(crate) struct Ior {
    pub(crate) type_id: String,
    pub(crate) target: Target,
}

/// Generic reference to a (possibly remote) object
#[derive(Clone, Default)]
pub struct ObjectRef {
    ior: Option<Arc<Ior>>,
}

impl ObjectRef {
    pub(crate) fn new(type_id: impl Into<String>, target: Target) -> Self {
        Self {
            ior: Some(Arc::new(Ior {
                type_id: type_id.into(),
                target,
            })),
        }
    }

    /// The nil reference
    pub fn nil() -> Self {
        Self { ior: None }
    }

    pub fn is_nil(&self) -> bool {
        self.ior.is_none()
    }

    /// Another handle to the same object
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    pub(crate) fn ior(&self) -> Option<&Ior> {
        self.ior.as_deref()
    }

    /// Most-derived repository id recorded in the reference
    pub fn repository_id(&self) -> Option<&str> {
        self.ior.as_ref().map(|ior| ior.type_id.as_str())
    }

    /// Object id, for servant references
    pub fn object_id(&self) -> Option<ObjectId> {
        match self.ior.as_deref()?.target {
            Target::Servant { object, .. } => Some(object),
            _ => None,
        }
    }

    /// Whether both references denote the same object
    pub fn is_equivalent(&self, other: &ObjectRef) -> bool {
        match (self.ior.as_deref(), other.ior.as_deref()) {
            (None, None) => true,
            (Some(a), Some(b)) => match (&a.target, &b.target) {
                (
                    Target::Servant { orb: oa, adapter: aa, object: ob, .. },
                    Target::Servant { orb: ox, adapter: ax, object: oy, .. },
                ) => oa == ox && aa == ax && ob == oy,
                (
                    Target::Context { store: sa, context: ca },
                    Target::Context { store: sb, context: cb },
                ) => Arc::ptr_eq(sa, sb) && ca == cb,
                (Target::Adapter(a), Target::Adapter(b)) => Weak::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }

    /// Invoke an operation and wait for the reply
    ///
    /// Blocks the calling thread until the owning ORB's request loop has
    /// executed the request. Must not be called from inside an async
    /// runtime context.
    pub fn invoke(&self, operation: &str, args: Bytes) -> Result<Bytes> {
        let ior = self
            .ior
            .as_deref()
            .ok_or_else(|| OrbError::BadInvOrder(format!("{} invoked on a nil reference", operation)))?;

        match &ior.target {
            Target::Servant { orb, endpoint, adapter, object, .. } => {
                let endpoint = endpoint
                    .upgrade()
                    .ok_or_else(|| OrbError::CommFailure(format!("ORB {} is not reachable", orb)))?;
                endpoint.invoke(adapter, *object, operation, args)
            }
            Target::Adapter(_) => Err(OrbError::BadOperation(format!(
                "{}: object adapters are locality-constrained",
                operation
            ))),
            Target::Context { .. } => Err(OrbError::BadOperation(format!(
                "{}: naming contexts are invoked through NamingContext",
                operation
            ))),
        }
    }

    /// Ask whether the object supports the given repository id
    pub fn is_a(&self, repository_id: &str) -> Result<bool> {
        let Some(ior) = self.ior.as_deref() else {
            return Ok(false);
        };
        if ior.type_id == repository_id {
            return Ok(true);
        }
        match &ior.target {
            Target::Servant { orb, endpoint, adapter, object, .. } => {
                let endpoint = endpoint
                    .upgrade()
                    .ok_or_else(|| OrbError::CommFailure(format!("ORB {} is not reachable", orb)))?;
                endpoint.is_a(adapter, *object, repository_id)
            }
            Target::Adapter(_) | Target::Context { .. } => Ok(false),
        }
    }

    /// True if the object is definitely gone
    pub fn non_existent(&self) -> Result<bool> {
        let Some(ior) = self.ior.as_deref() else {
            return Ok(true);
        };
        match &ior.target {
            Target::Servant { endpoint, adapter, object, .. } => match endpoint.upgrade() {
                Some(endpoint) => Ok(!endpoint.locate(adapter, *object)),
                None => Ok(true),
            },
            Target::Adapter(core) => Ok(core.upgrade().map_or(true, |core| core.is_destroyed())),
            Target::Context { store, context } => Ok(!store.contains(*context)),
        }
    }

    /// Stringify the reference
    pub fn to_ior_string(&self) -> Result<String> {
        let Some(ior) = self.ior.as_deref() else {
            return Ok(IOR_NIL.to_string());
        };
        match &ior.target {
            Target::Servant { domain, orb, adapter, object, .. } => Ok(format!(
                "{}S|{}|{}|{}|{}|{}",
                IOR_PREFIX, domain, orb, adapter, object, ior.type_id
            )),
            Target::Context { store, context } => Ok(format!(
                "{}C|{}|{}|{}",
                IOR_PREFIX,
                store.domain(),
                context,
                ior.type_id
            )),
            Target::Adapter(_) => Err(OrbError::Marshal(
                "object adapter references cannot be stringified".to_string(),
            )),
        }
    }

    /// Parse a stringified reference
    ///
    /// References into a domain that has never been attached in this
    /// process, or to an ORB that is gone, still parse; invoking them
    /// reports a communication failure.
    pub fn from_ior_string(s: &str) -> Result<ObjectRef> {
        if s == IOR_NIL {
            return Ok(ObjectRef::nil());
        }
        let body = s
            .strip_prefix(IOR_PREFIX)
            .ok_or_else(|| OrbError::Marshal(format!("not a stringified reference: {}", s)))?;
        let bad = || OrbError::Marshal(format!("malformed reference: {}", s));

        match body.split_once('|') {
            Some(("S", rest)) => {
                let mut fields = rest.splitn(5, '|');
                let domain = fields.next().ok_or_else(bad)?;
                let orb = OrbId::new(fields.next().ok_or_else(bad)?);
                let adapter = AdapterId::new(fields.next().ok_or_else(bad)?);
                let object = fields.next().and_then(ObjectId::parse).ok_or_else(bad)?;
                let type_id = fields.next().ok_or_else(bad)?;
                let endpoint = Domain::lookup(domain)
                    .map(|d| d.endpoint(&orb))
                    .unwrap_or_default();
                Ok(ObjectRef::new(
                    type_id,
                    Target::Servant {
                        domain: domain.into(),
                        orb,
                        endpoint,
                        adapter,
                        object,
                    },
                ))
            }
            Some(("C", rest)) => {
                let mut fields = rest.splitn(3, '|');
                let domain = fields.next().ok_or_else(bad)?;
                let context = fields
                    .next()
                    .and_then(|c| c.parse().ok())
                    .map(ContextId)
                    .ok_or_else(bad)?;
                let type_id = fields.next().ok_or_else(bad)?;
                let domain = Domain::lookup(domain)
                    .ok_or_else(|| OrbError::CommFailure(format!("unknown domain {}", domain)))?;
                Ok(ObjectRef::new(
                    type_id,
                    Target::Context {
                        store: domain.naming().clone(),
                        context,
                    },
                ))
            }
            _ => Err(bad()),
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(ior) = self.ior.as_deref() else {
            return f.write_str("ObjectRef(nil)");
        };
        match &ior.target {
            Target::Servant { orb, adapter, object, .. } => {
                write!(f, "ObjectRef({} @ {}/{}/{})", ior.type_id, orb, adapter, object)
            }
            Target::Adapter(_) => write!(f, "ObjectRef({} @ local adapter)", ior.type_id),
            Target::Context { context, .. } => write!(f, "ObjectRef({} @ context {})", ior.type_id, context),
        }
    }
}

/// Typed client-side stub over an [`ObjectRef`]
pub trait Interface: Clone + Send + Sync + 'static {
    /// Repository id of the interface, e.g. `IDL:demo/Clock:1.0`
    const REPOSITORY_ID: &'static str;

    /// Wrap a reference without checking its type
    fn from_object(obj: ObjectRef) -> Self;

    fn as_object(&self) -> &ObjectRef;

    /// Typed nil
    fn nil() -> Self {
        Self::from_object(ObjectRef::nil())
    }

    fn is_nil(&self) -> bool {
        self.as_object().is_nil()
    }

    fn duplicate(&self) -> Self {
        Self::from_object(self.as_object().duplicate())
    }

    /// Checked conversion from a generic reference
    ///
    /// Returns `Ok(None)` for a nil reference or one whose object does not
    /// support this interface.
    fn narrow(obj: &ObjectRef) -> Result<Option<Self>> {
        if obj.is_nil() || !obj.is_a(Self::REPOSITORY_ID)? {
            return Ok(None);
        }
        Ok(Some(Self::from_object(obj.duplicate())))
    }
}

/// Interface whose objects must be explicitly retired by the client
pub trait Transient: Interface {
    /// Ask the server to retire the object
    fn destroy(&self) -> Result<()> {
        self.as_object().invoke("destroy", Bytes::new()).map(|_| ())
    }
}
