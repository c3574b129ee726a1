//! Lifecycle framework errors

use orb::{ErrorKind, OrbError};
use thiserror::Error;

/// Result type for framework operations
pub type Result<T> = std::result::Result<T, OrbkitError>;

/// Framework errors
///
/// The first four variants are the lifecycle failure classes; each keeps
/// the middleware error that caused it so [`OrbkitError::kind`] can report
/// whether the object was missing, unreachable, or transiently busy.
#[derive(Error, Debug)]
pub enum OrbkitError {
    /// Runtime or naming directory bring-up failed
    #[error("session {session}: initialization failed: {source}")]
    Initialization {
        session: String,
        #[source]
        source: OrbError,
    },

    /// Directory lookup or narrowing failed
    #[error("cannot resolve {name}: {source}")]
    Resolution {
        name: String,
        #[source]
        source: OrbError,
    },

    /// Rebind or unbind failed
    #[error("cannot bind {name}: {source}")]
    Binding {
        name: String,
        #[source]
        source: OrbError,
    },

    /// Remote `destroy` of a transient object failed
    #[error("destroy of {target} failed: {source}")]
    RemoteTeardown {
        target: String,
        #[source]
        source: OrbError,
    },

    /// Reference did not narrow to the expected interface
    #[error("{name} is not a {expected}")]
    InterfaceMismatch { name: String, expected: &'static str },

    /// Caller-supplied argument is unusable
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Slot index past the registry or resolver arity
    #[error("slot {slot} out of range (arity {arity})")]
    SlotOutOfRange { slot: usize, arity: usize },

    /// Index past the end of a connection list
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Request loop already started for this registry
    #[error("request loop already running")]
    AlreadyRunning,

    #[error(transparent)]
    Orb(#[from] OrbError),
}

impl OrbkitError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrbkitError::Initialization { source, .. } => match source.kind() {
                ErrorKind::CommunicationFailure | ErrorKind::Transient => source.kind(),
                _ => ErrorKind::Internal,
            },
            OrbkitError::Resolution { source, .. }
            | OrbkitError::Binding { source, .. }
            | OrbkitError::RemoteTeardown { source, .. } => source.kind(),
            OrbkitError::InterfaceMismatch { .. } => ErrorKind::NotFound,
            OrbkitError::InvalidArgument(_)
            | OrbkitError::SlotOutOfRange { .. }
            | OrbkitError::IndexOutOfBounds { .. } => ErrorKind::InvalidArgument,
            OrbkitError::AlreadyRunning => ErrorKind::BadOrder,
            OrbkitError::Orb(e) => e.kind(),
        }
    }

    pub(crate) fn resolution(name: impl Into<String>, source: OrbError) -> Self {
        OrbkitError::Resolution {
            name: name.into(),
            source,
        }
    }

    pub(crate) fn binding(name: impl Into<String>, source: OrbError) -> Self {
        OrbkitError::Binding {
            name: name.into(),
            source,
        }
    }
}
