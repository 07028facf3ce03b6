//! Queue lifecycle errors.
//!
//! Wraps the register-access and allocator errors so callers deal with one
//! type, and adds the queue state errors of the lifecycle layer.

use core::fmt;

use qdma_access::AccessError;
use qdma_resource::ResourceError;

/// Result type for device and queue operations
pub type Result<T> = core::result::Result<T, QdmaError>;

/// Device and queue lifecycle error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QdmaError {
    /// Register access or context programming failed
    Access(AccessError),

    /// Queue allocator refused the operation
    Resource(ResourceError),

    /// Queue id is outside the function's assigned range
    QueueNotInRange,

    /// Queue was never started or is already stopped
    QueueNotStarted,

    /// Queue is already running
    QueueAlreadyStarted,
}

impl From<AccessError> for QdmaError {
    fn from(e: AccessError) -> Self {
        Self::Access(e)
    }
}

impl From<ResourceError> for QdmaError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

impl fmt::Display for QdmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access(e) => write!(f, "Register access: {}", e),
            Self::Resource(e) => write!(f, "Queue allocation: {}", e),
            Self::QueueNotInRange => write!(f, "Queue not in function range"),
            Self::QueueNotStarted => write!(f, "Queue not started"),
            Self::QueueAlreadyStarted => write!(f, "Queue already started"),
        }
    }
}
