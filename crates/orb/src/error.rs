//! ORB error types

use thiserror::Error;

/// Result type for ORB operations
pub type Result<T> = std::result::Result<T, OrbError>;

/// Why a naming lookup failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No binding exists for a component of the name
    MissingNode,
    /// An intermediate component is bound to an object, not a context
    NotContext,
    /// The final component is bound to a context where an object was expected
    NotObject,
}

/// Coarse classification of failures
///
/// Lets callers tell "object not found" apart from "communication
/// failure" and "service transiently busy" without matching on messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name or object could not be located
    NotFound,
    /// The peer could not be reached or went away mid-call
    CommunicationFailure,
    /// The peer exists but cannot serve the request right now
    Transient,
    /// The target object has been deactivated or never existed
    ObjectNotExist,
    /// The request itself was malformed
    InvalidArgument,
    /// An operation was invoked in the wrong lifecycle state
    BadOrder,
    /// Argument or reply payload could not be decoded
    Marshal,
    /// The servant raised an application-level exception
    Application,
    /// Bring-up or internal failure
    Internal,
}

/// ORB-level errors
#[derive(Error, Debug)]
pub enum OrbError {
    /// ORB bring-up failed
    #[error("ORB initialization failed: {0}")]
    Initialize(String),

    /// Unknown initial reference or malformed name
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Naming lookup failed
    #[error("name not found ({reason:?}): {rest}")]
    NotFound { reason: NotFoundReason, rest: String },

    /// Name is already bound in the target context
    #[error("name already bound: {0}")]
    AlreadyBound(String),

    /// Context still holds bindings
    #[error("naming context is not empty")]
    NotEmpty,

    /// Target object is not (or no longer) active
    #[error("object does not exist: {0}")]
    ObjectNotExist(String),

    /// Peer unreachable or request dropped
    #[error("communication failure: {0}")]
    CommFailure(String),

    /// Peer is holding requests
    #[error("transient failure: {0}")]
    Transient(String),

    /// Servant does not implement the requested operation
    #[error("bad operation: {0}")]
    BadOperation(String),

    /// Invocation made against a shut down or busy ORB
    #[error("bad invocation order: {0}")]
    BadInvOrder(String),

    /// Payload encoding or decoding failed
    #[error("marshaling error: {0}")]
    Marshal(String),

    /// Adapter with this name already exists under the parent
    #[error("adapter already exists: {0}")]
    AdapterAlreadyExists(String),

    /// Object id is not in the active object map
    #[error("object not active: {0}")]
    ObjectNotActive(String),

    /// Servant is already active under another id
    #[error("servant already active")]
    ServantAlreadyActive,

    /// Adapter policies forbid the operation
    #[error("wrong policy: {0}")]
    WrongPolicy(String),

    /// Application exception raised by a servant
    #[error("user exception {repository_id}: {message}")]
    User { repository_id: String, message: String },
}

impl OrbError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrbError::NotFound { .. } => ErrorKind::NotFound,
            OrbError::CommFailure(_) => ErrorKind::CommunicationFailure,
            OrbError::Transient(_) => ErrorKind::Transient,
            OrbError::ObjectNotExist(_) | OrbError::ObjectNotActive(_) => ErrorKind::ObjectNotExist,
            OrbError::InvalidName(_)
            | OrbError::AlreadyBound(_)
            | OrbError::NotEmpty
            | OrbError::BadOperation(_)
            | OrbError::AdapterAlreadyExists(_)
            | OrbError::ServantAlreadyActive
            | OrbError::WrongPolicy(_) => ErrorKind::InvalidArgument,
            OrbError::BadInvOrder(_) => ErrorKind::BadOrder,
            OrbError::Marshal(_) => ErrorKind::Marshal,
            OrbError::User { .. } => ErrorKind::Application,
            OrbError::Initialize(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a missing-node lookup failure
    pub fn missing(rest: impl Into<String>) -> Self {
        OrbError::NotFound {
            reason: NotFoundReason::MissingNode,
            rest: rest.into(),
        }
    }
}
