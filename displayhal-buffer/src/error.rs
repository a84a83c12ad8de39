//! Error types for buffer handling.

use crate::handle::Fd;
use thiserror::Error;

/// Why a handle failed structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleDefect {
    #[error("handle is missing")]
    Missing,
    #[error("unexpected header version {found}")]
    Version { found: i32 },
    #[error("unexpected fd count {found}")]
    FdCount { found: i32 },
    #[error("unexpected int count {found}")]
    IntCount { found: i32 },
    #[error("bad magic {found:#010x}")]
    Magic { found: u32 },
    /// The backing store was freed and never replaced.
    #[error("backing allocation was released")]
    Released,
}

/// Errors reported by a [`crate::MemoryAllocator`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: u64, available: u64 },
    #[error("invalid allocation request: {0}")]
    InvalidRequest(String),
    #[error("no allocation registered for fd {fd}")]
    UnknownRegion { fd: Fd },
    #[error("region described for fd {fd} does not match the allocation")]
    RegionMismatch { fd: Fd },
    #[error("allocator backend error: {0}")]
    Backend(String),
}

/// Errors returned by the buffer lifecycle operations.
///
/// None of these are retried internally. `FreeFailed` and `AllocFailed` are
/// fatal to the buffer involved: after `FreeFailed` its memory is suspect, after
/// `AllocFailed` it has no memory at all.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("invalid buffer handle: {defect}")]
    InvalidHandle {
        #[from]
        defect: HandleDefect,
    },

    #[error("failed to free the backing allocation of fd {fd}")]
    FreeFailed {
        fd: Fd,
        #[source]
        source: AllocatorError,
    },

    /// The old allocation is already gone; the handle is left released.
    #[error("failed to allocate {requested} bytes, buffer has no backing store")]
    AllocFailed {
        requested: u64,
        #[source]
        source: AllocatorError,
    },

    #[error("graphic buffer is absent")]
    NullBuffer,
}

impl BufferError {
    /// The handle defect, for `InvalidHandle` errors.
    pub fn defect(&self) -> Option<HandleDefect> {
        match self {
            BufferError::InvalidHandle { defect } => Some(*defect),
            _ => None,
        }
    }
}
