//! The graphics memory allocator capability.
//!
//! [`MemoryAllocator`] is the seam between the buffer helpers and whatever owns
//! graphics memory on the device (ION, ashmem, a DRM driver). The helpers only
//! ever free what a handle describes and ask for a fresh region; they never
//! touch the memory itself.
//!
//! [`PoolAllocator`] is an in-process implementation backed by heap storage.
//! It keeps the same bookkeeping a device allocator would, which makes it
//! useful for host-side tools and tests.

use crate::error::AllocatorError;
use crate::handle::{AllocationDescriptor, Fd};
use bitflags::bitflags;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const FALLBACK_PAGE_SIZE: u64 = 4096;

static PAGE_SIZE: Lazy<u64> = Lazy::new(query_page_size);

#[cfg(unix)]
fn query_page_size() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads system configuration.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        warn!("sysconf(_SC_PAGESIZE) failed, assuming {} bytes", FALLBACK_PAGE_SIZE);
        FALLBACK_PAGE_SIZE
    }
}

#[cfg(not(unix))]
fn query_page_size() -> u64 {
    FALLBACK_PAGE_SIZE
}

/// The platform page size in bytes, queried once per process.
pub fn page_size() -> u64 {
    *PAGE_SIZE
}

bitflags! {
    /// Gralloc usage bits passed through to the allocator.
    ///
    /// Bits this type does not name are preserved, so callers can forward
    /// vendor usage words untouched with [`UsageFlags::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UsageFlags: u32 {
        const SW_READ_OFTEN = 0x0000_0003;
        const SW_WRITE_OFTEN = 0x0000_0030;
        const HW_TEXTURE = 0x0000_0100;
        const HW_RENDER = 0x0000_0200;
        const HW_2D = 0x0000_0400;
        const HW_COMPOSER = 0x0000_0800;
        const HW_FB = 0x0000_1000;
        const PRIVATE_UNCACHED = 0x0010_0000;
        const PRIVATE_IOMMU_HEAP = 0x0100_0000;
        const PRIVATE_ADSP_HEAP = 0x1000_0000;
        const PRIVATE_EBI_HEAP = 0x2000_0000;
        const PRIVATE_SMI_HEAP = 0x4000_0000;
        const PRIVATE_SYSTEM_HEAP = 0x8000_0000;
    }
}

/// A request for a new backing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Size of the region in bytes.
    pub size: u64,
    /// Required alignment of the region's base, a power of two.
    pub alignment: u64,
    /// Map the region without CPU caching.
    pub uncached: bool,
    /// Usage bits of the buffer the region will back.
    pub usage: UsageFlags,
}

/// Allocates and frees graphics memory regions.
pub trait MemoryAllocator: Send + Sync {
    /// Releases the region described by `descriptor`.
    fn free(&self, descriptor: &AllocationDescriptor) -> Result<(), AllocatorError>;

    /// Obtains a new region satisfying `request`.
    fn allocate(&self, request: &AllocationRequest) -> Result<AllocationDescriptor, AllocatorError>;
}

/// Counters describing the live allocations of a [`PoolAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Regions allocated and not yet freed.
    pub live_allocations: usize,
    /// Sum of the sizes of those regions.
    pub bytes_in_use: u64,
}

struct Region {
    descriptor: AllocationDescriptor,
    // Owns the memory `descriptor.base` points into.
    _storage: Vec<u8>,
}

struct PoolState {
    next_fd: Fd,
    regions: HashMap<Fd, Region>,
    bytes_in_use: u64,
}

/// A heap-backed [`MemoryAllocator`] with an optional capacity limit.
pub struct PoolAllocator {
    capacity: Option<u64>,
    state: Mutex<PoolState>,
}

impl PoolAllocator {
    /// First synthetic descriptor handed out, clear of stdio.
    const FIRST_FD: Fd = 3;

    /// Creates a pool without a capacity limit.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a pool that refuses to hold more than `capacity` bytes at once.
    pub fn with_capacity(capacity: u64) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<u64>) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState {
                next_fd: Self::FIRST_FD,
                regions: HashMap::new(),
                bytes_in_use: 0,
            }),
        }
    }

    /// The byte limit, if the pool has one.
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// A snapshot of the pool's live allocations.
    pub fn stats(&self) -> Result<PoolStats, AllocatorError> {
        let state = self.lock()?;
        Ok(PoolStats {
            live_allocations: state.regions.len(),
            bytes_in_use: state.bytes_in_use,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>, AllocatorError> {
        self.state
            .lock()
            .map_err(|e| AllocatorError::Backend(format!("pool state lock poisoned: {}", e)))
    }
}

impl Default for PoolAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAllocator for PoolAllocator {
    fn free(&self, descriptor: &AllocationDescriptor) -> Result<(), AllocatorError> {
        let mut state = self.lock()?;
        let region = state
            .regions
            .get(&descriptor.fd)
            .ok_or(AllocatorError::UnknownRegion { fd: descriptor.fd })?;
        if region.descriptor != *descriptor {
            return Err(AllocatorError::RegionMismatch { fd: descriptor.fd });
        }

        state.regions.remove(&descriptor.fd);
        state.bytes_in_use -= descriptor.size;
        debug!(fd = descriptor.fd, size = descriptor.size, "Freed pool region");
        Ok(())
    }

    fn allocate(&self, request: &AllocationRequest) -> Result<AllocationDescriptor, AllocatorError> {
        if request.size == 0 {
            return Err(AllocatorError::InvalidRequest("size must be non-zero".to_string()));
        }
        if !request.alignment.is_power_of_two() {
            return Err(AllocatorError::InvalidRequest(format!(
                "alignment {} is not a power of two",
                request.alignment
            )));
        }

        let mut state = self.lock()?;
        let fd = state.next_fd;
        let next_fd = fd
            .checked_add(1)
            .ok_or_else(|| AllocatorError::Backend("pool ran out of descriptor numbers".to_string()))?;
        if let Some(capacity) = self.capacity {
            let available = capacity.saturating_sub(state.bytes_in_use);
            if request.size > available {
                return Err(AllocatorError::OutOfMemory { requested: request.size, available });
            }
        }

        let padded = request
            .size
            .checked_add(request.alignment - 1)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                AllocatorError::InvalidRequest(format!("size {} does not fit in memory", request.size))
            })?;
        let mut storage = Vec::new();
        storage.try_reserve_exact(padded).map_err(|_| AllocatorError::OutOfMemory {
            requested: request.size,
            available: 0,
        })?;
        storage.resize(padded, 0u8);

        let start = storage.as_ptr() as usize;
        let alignment = request.alignment as usize;
        let base = (start + alignment - 1) & !(alignment - 1);

        state.next_fd = next_fd;
        let descriptor = AllocationDescriptor { fd, base, offset: 0, size: request.size };
        state.regions.insert(fd, Region { descriptor, _storage: storage });
        state.bytes_in_use += request.size;

        debug!(
            fd,
            size = request.size,
            alignment = request.alignment,
            uncached = request.uncached,
            usage = ?request.usage,
            "Allocated pool region"
        );
        Ok(descriptor)
    }
}
