//! # DisplayHAL Buffer
//!
//! Buffer lifecycle helpers that sit between the compositor and the graphics
//! memory allocator:
//!
//! - [`needs_reallocation`] decides whether a buffer's geometry change needs new memory.
//! - [`BufferReallocator`] frees and reallocates the backing store of a
//!   [`BufferHandle`] through an injected [`MemoryAllocator`].
//! - [`update_geometry`] rewrites a [`GraphicBuffer`]'s geometry metadata in place.
//! - [`BufferManager`] owns registered buffers and routes the operations above
//!   to them by [`BufferId`].
//!
//! Handles are only read or written through the views returned by
//! [`BufferHandle::validate`] and [`BufferHandle::validate_mut`].
//!
//! None of these types lock internally. A buffer must be driven from one
//! thread at a time; free-then-allocate is not atomic with respect to the
//! allocator.

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod format;
pub mod geometry;
pub mod handle;
pub mod realloc;
pub mod reconcile;
pub mod update;

pub use allocator::{
    page_size, AllocationRequest, MemoryAllocator, PoolAllocator, PoolStats, UsageFlags,
};
pub use buffer::{BufferId, BufferManager, GraphicBuffer};
pub use error::{AllocatorError, BufferError, HandleDefect};
pub use format::{is_gpu_supported_format, PixelFormat};
pub use geometry::BufferGeometry;
pub use handle::{AllocationDescriptor, BufferHandle, HandleFlags, HandleMut, HandleRef, RawBufferHandle};
pub use realloc::{AlignmentPolicy, BufferReallocator, TILED_ALIGNMENT};
pub use reconcile::needs_reallocation;
pub use update::update_geometry;
