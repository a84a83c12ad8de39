//! Reallocation of a handle's backing store.

use crate::allocator::{page_size, AllocationRequest, MemoryAllocator, UsageFlags};
use crate::error::BufferError;
use crate::format::PixelFormat;
use crate::handle::BufferHandle;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::{debug, error};

/// Alignment of buffers in tiled formats.
pub const TILED_ALIGNMENT: u64 = 8192;

/// Picks the base alignment for a buffer's backing store.
///
/// Tiled formats need [`TILED_ALIGNMENT`]; every other format is page aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentPolicy {
    page_size: u64,
}

impl AlignmentPolicy {
    /// A policy that aligns non-tiled buffers to `page_size` bytes.
    ///
    /// `page_size` should be a power of two; allocators reject anything else.
    pub fn new(page_size: u64) -> Self {
        Self { page_size }
    }

    /// The policy for this machine's page size.
    pub fn platform() -> Self {
        Self::new(page_size())
    }

    /// Alignment used for every non-tiled format.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Base alignment required for a buffer of `format`.
    pub fn alignment_for(&self, format: PixelFormat) -> u64 {
        if format.requires_tile_alignment() {
            TILED_ALIGNMENT
        } else {
            self.page_size
        }
    }
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        Self::platform()
    }
}

/// Frees and reallocates buffer backing stores through a [`MemoryAllocator`].
#[derive(Clone)]
pub struct BufferReallocator {
    allocator: Arc<dyn MemoryAllocator>,
    alignment: AlignmentPolicy,
}

impl fmt::Debug for BufferReallocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferReallocator")
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}

impl BufferReallocator {
    /// Creates a reallocator using the platform alignment policy.
    pub fn new(allocator: Arc<dyn MemoryAllocator>) -> Self {
        Self::with_alignment_policy(allocator, AlignmentPolicy::platform())
    }

    /// Creates a reallocator with an explicit alignment policy.
    ///
    /// # Arguments
    /// * `allocator`: Frees old regions and hands out new ones.
    /// * `alignment`: Decides the base alignment per pixel format.
    pub fn with_alignment_policy(allocator: Arc<dyn MemoryAllocator>, alignment: AlignmentPolicy) -> Self {
        Self { allocator, alignment }
    }

    /// The policy requests are aligned by.
    pub fn alignment_policy(&self) -> AlignmentPolicy {
        self.alignment
    }

    /// The allocator all frees and allocations go through.
    pub fn allocator(&self) -> &Arc<dyn MemoryAllocator> {
        &self.allocator
    }

    /// The request [`reallocate`](Self::reallocate) issues for a buffer of
    /// `format`. Allocations are always uncached.
    pub fn allocation_request(&self, format: PixelFormat, size: u64, usage: UsageFlags) -> AllocationRequest {
        AllocationRequest {
            size,
            alignment: self.alignment.alignment_for(format),
            uncached: true,
            usage,
        }
    }

    /// Replaces the backing store of `handle` with one of `requested` bytes.
    ///
    /// Does nothing if the handle already has that size. Otherwise the old
    /// region is freed first and a new one allocated; only the backing
    /// descriptor (fd, base, offset, size) of the handle changes.
    ///
    /// # Errors
    ///
    /// * `InvalidHandle` if the handle fails validation.
    /// * `FreeFailed` if the old region could not be freed. No allocation is
    ///   attempted and the handle is untouched.
    /// * `AllocFailed` if the new region could not be obtained. The old region
    ///   is already gone and the handle is left released, so it fails
    ///   validation from then on.
    pub fn reallocate(
        &self,
        handle: &mut BufferHandle,
        requested: NonZeroU64,
        usage: UsageFlags,
    ) -> Result<(), BufferError> {
        let requested = requested.get();
        let mut view = handle.validate_mut().map_err(|defect| {
            error!("reallocate: invalid handle: {}", defect);
            BufferError::from(defect)
        })?;

        let old = view.backing;
        if old.size == requested {
            return Ok(());
        }

        if let Err(source) = self.allocator.free(&old) {
            error!(fd = old.fd, size = old.size, "reallocate: free failed: {}", source);
            return Err(BufferError::FreeFailed { fd: old.fd, source });
        }

        let request = self.allocation_request(view.geometry.format, requested, usage);
        match self.allocator.allocate(&request) {
            Ok(backing) => {
                debug!(
                    old_fd = old.fd,
                    new_fd = backing.fd,
                    old_size = old.size,
                    new_size = backing.size,
                    alignment = request.alignment,
                    "Reallocated buffer"
                );
                view.replace_backing(backing);
                Ok(())
            }
            Err(source) => {
                view.release_backing();
                error!(
                    size = requested,
                    alignment = request.alignment,
                    "reallocate: allocation failed, buffer left without memory: {}",
                    source
                );
                Err(BufferError::AllocFailed { requested, source })
            }
        }
    }

    /// Ensures `handle` is backed by `requested` bytes.
    ///
    /// A `requested` size of zero or less means no size was specified and is
    /// a no-op; the handle is not even validated.
    pub fn check_buffer(
        &self,
        handle: &mut BufferHandle,
        requested: i64,
        usage: UsageFlags,
    ) -> Result<(), BufferError> {
        match u64::try_from(requested).ok().and_then(NonZeroU64::new) {
            Some(size) => self.reallocate(handle, size, usage),
            None => Ok(()),
        }
    }

    /// Frees the backing store of `handle` and marks it released.
    ///
    /// On failure the handle keeps its descriptor.
    pub fn release(&self, handle: &mut BufferHandle) -> Result<(), BufferError> {
        let mut view = handle.validate_mut()?;
        let old = view.backing;
        self.allocator.free(&old).map_err(|source| {
            error!(fd = old.fd, "release: free failed: {}", source);
            BufferError::FreeFailed { fd: old.fd, source }
        })?;
        view.release_backing();
        Ok(())
    }
}
