//! Error types for queue range management.

use core::fmt;

/// Result type for allocator operations
pub type Result<T> = core::result::Result<T, ResourceError>;

/// Errors returned by the queue range allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// A group for the key, or a function with the id, already exists
    AlreadyExists,

    /// No such group or function
    NotFound,

    /// Group still has functions attached
    NotEmpty,

    /// Allocation of bookkeeping storage failed
    OutOfMemory,

    /// No free range can satisfy the request
    NoQueuesLeft,

    /// Function has active queues; its range cannot change
    QmaxChangeRejected,

    /// Request is malformed (range outside the group, zero-sized group, ...)
    InvalidParameter,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "Resource already exists"),
            Self::NotFound => write!(f, "Resource not found"),
            Self::NotEmpty => write!(f, "Group still has functions"),
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::NoQueuesLeft => write!(f, "No queues left"),
            Self::QmaxChangeRejected => write!(f, "Queues active, qmax change rejected"),
            Self::InvalidParameter => write!(f, "Invalid parameter"),
        }
    }
}
