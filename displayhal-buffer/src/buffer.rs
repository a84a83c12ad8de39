//! Graphic buffers and the arena that owns them.

use crate::allocator::UsageFlags;
use crate::error::{BufferError, HandleDefect};
use crate::format::PixelFormat;
use crate::geometry::BufferGeometry;
use crate::handle::{BufferHandle, HandleFlags};
use crate::realloc::BufferReallocator;
use crate::reconcile::needs_reallocation;
use crate::update;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Represents a unique identifier for a buffer registered with a [`BufferManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Creates a new, unique `BufferId` from a process-wide counter.
    fn new_unique() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        BufferId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of the ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A compositor-side buffer: an optional handle plus a mirror of its geometry.
///
/// The mirror and the handle's geometry agree whenever the handle is present;
/// both are only changed together through [`crate::update_geometry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicBuffer {
    pub(crate) handle: Option<BufferHandle>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: PixelFormat,
    usage: UsageFlags,
}

impl GraphicBuffer {
    /// Wraps a handle, mirroring its geometry.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the handle fails validation.
    pub fn from_handle(handle: BufferHandle, usage: UsageFlags) -> Result<Self, BufferError> {
        let geometry = handle.validate()?.geometry;
        Ok(Self {
            width: geometry.width,
            height: geometry.height,
            format: geometry.format,
            handle: Some(handle),
            usage,
        })
    }

    /// A buffer whose handle has not been attached yet.
    pub fn without_handle(geometry: BufferGeometry, usage: UsageFlags) -> Self {
        Self {
            handle: None,
            width: geometry.width,
            height: geometry.height,
            format: geometry.format,
            usage,
        }
    }

    /// The mirrored geometry, valid even without a handle.
    pub fn geometry(&self) -> BufferGeometry {
        BufferGeometry::new(self.width, self.height, self.format)
    }

    pub fn handle(&self) -> Option<&BufferHandle> {
        self.handle.as_ref()
    }

    /// Mutable access for reallocation. Geometry changes go through
    /// [`crate::update_geometry`] instead.
    pub fn handle_mut(&mut self) -> Option<&mut BufferHandle> {
        self.handle.as_mut()
    }

    /// Usage bits the buffer was created with.
    pub fn usage(&self) -> UsageFlags {
        self.usage
    }
}

/// Owns a set of [`GraphicBuffer`]s and drives their lifecycle.
///
/// All operations take the buffer by [`BufferId`]; the manager is the single
/// owner of every buffer it holds, so `&mut self` serializes access to them.
#[derive(Debug)]
pub struct BufferManager {
    buffers: HashMap<BufferId, GraphicBuffer>,
    reallocator: BufferReallocator,
}

impl BufferManager {
    /// Creates an empty manager that frees and allocates through `reallocator`.
    pub fn new(reallocator: BufferReallocator) -> Self {
        Self {
            buffers: HashMap::new(),
            reallocator,
        }
    }

    pub fn reallocator(&self) -> &BufferReallocator {
        &self.reallocator
    }

    /// Takes ownership of `buffer` and returns its new id.
    pub fn register(&mut self, buffer: GraphicBuffer) -> BufferId {
        let id = BufferId::new_unique();
        debug!(id = id.as_u64(), geometry = ?buffer.geometry(), "Registered buffer");
        self.buffers.insert(id, buffer);
        id
    }

    /// Allocates a fresh backing store and registers a buffer around it.
    ///
    /// # Arguments
    /// * `geometry`: Shape of the new buffer; its format selects the alignment.
    /// * `size`: Size of the backing store in bytes.
    /// * `usage`: Usage bits forwarded to the allocator.
    /// * `flags`: Flags recorded in the new handle.
    pub fn allocate(
        &mut self,
        geometry: BufferGeometry,
        size: NonZeroU64,
        usage: UsageFlags,
        flags: HandleFlags,
    ) -> Result<BufferId, BufferError> {
        let request = self.reallocator.allocation_request(geometry.format, size.get(), usage);
        let backing = self
            .reallocator
            .allocator()
            .allocate(&request)
            .map_err(|source| BufferError::AllocFailed { requested: size.get(), source })?;
        let handle = BufferHandle::new(backing, geometry, request.alignment, flags);
        let buffer = GraphicBuffer::from_handle(handle, usage)?;
        Ok(self.register(buffer))
    }

    /// Looks up a registered buffer.
    pub fn get(&self, id: BufferId) -> Option<&GraphicBuffer> {
        self.buffers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.buffers.keys().copied()
    }

    /// Whether buffer `id` must be reallocated to take the shape `required`.
    ///
    /// # Arguments
    /// * `id`: The buffer to check; its mirrored geometry is the current one.
    /// * `required`: The geometry the consumer asks for.
    /// * `updated`: The geometry already applied through an update, if any.
    pub fn needs_new_buffer(
        &self,
        id: BufferId,
        required: BufferGeometry,
        updated: BufferGeometry,
    ) -> Result<bool, BufferError> {
        let buffer = self.buffers.get(&id).ok_or(BufferError::NullBuffer)?;
        Ok(needs_reallocation(buffer.geometry(), required, updated))
    }

    /// Makes buffer `id` backed by `size` bytes, reallocating if needed.
    ///
    /// A `size` of zero or less is a no-op.
    pub fn check_buffer(&mut self, id: BufferId, size: i64, usage: UsageFlags) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NullBuffer)?;
        if size <= 0 {
            return Ok(());
        }
        let handle = buffer.handle.as_mut().ok_or(HandleDefect::Missing)?;
        self.reallocator.check_buffer(handle, size, usage)
    }

    /// Rewrites the geometry of buffer `id`. See [`crate::update_geometry`].
    pub fn update_geometry(&mut self, id: BufferId, updated: BufferGeometry) -> Result<(), BufferError> {
        update::update_geometry(self.buffers.get_mut(&id), updated)
    }

    /// Removes buffer `id` and frees its backing store.
    ///
    /// A buffer without a handle, or whose backing store was already released,
    /// has nothing to free and is simply dropped. Any other handle defect is
    /// returned as `InvalidHandle`, and a failed free as `FreeFailed`; in both
    /// cases the buffer stays registered.
    pub fn release(&mut self, id: BufferId) -> Result<GraphicBuffer, BufferError> {
        let mut buffer = self.buffers.remove(&id).ok_or(BufferError::NullBuffer)?;
        let result = match buffer.handle.as_mut() {
            None => Ok(()),
            Some(handle) => match handle.validate().map(|_| ()) {
                Ok(()) => self.reallocator.release(handle),
                Err(HandleDefect::Released) => {
                    debug!(id = id.as_u64(), "Dropping buffer whose backing store is already released");
                    Ok(())
                }
                Err(defect) => {
                    warn!(id = id.as_u64(), "Refusing to release buffer with malformed handle: {}", defect);
                    Err(BufferError::from(defect))
                }
            },
        };
        match result {
            Ok(()) => Ok(buffer),
            Err(e) => {
                self.buffers.insert(id, buffer);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::PoolAllocator;
    use crate::handle::{AllocationDescriptor, RawBufferHandle};
    use std::sync::Arc;

    fn manager() -> (Arc<PoolAllocator>, BufferManager) {
        let pool = Arc::new(PoolAllocator::new());
        let manager = BufferManager::new(BufferReallocator::new(pool.clone()));
        (pool, manager)
    }

    fn size(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn test_unique_buffer_ids() {
        let id1 = BufferId::new_unique();
        let id2 = BufferId::new_unique();
        assert_ne!(id1, id2, "BufferId::new_unique should generate unique IDs.");
    }

    #[test]
    fn test_from_handle_mirrors_geometry() {
        let geometry = BufferGeometry::new(640, 480, PixelFormat::RGB_565);
        let handle = BufferHandle::new(
            AllocationDescriptor { fd: 4, base: 0, offset: 0, size: 640 * 480 * 2 },
            geometry,
            4096,
            HandleFlags::empty(),
        );
        let buffer = GraphicBuffer::from_handle(handle, UsageFlags::HW_TEXTURE).unwrap();
        assert_eq!(buffer.geometry(), geometry);
        assert_eq!(buffer.usage(), UsageFlags::HW_TEXTURE);
    }

    #[test]
    fn test_from_handle_rejects_invalid_handle() {
        let handle = BufferHandle::from_raw(RawBufferHandle {
            version: 0,
            num_fds: 1,
            num_ints: 11,
            magic: 0,
            backing: AllocationDescriptor::RELEASED,
            alignment: 0,
            geometry: BufferGeometry::UNSET,
            flags: HandleFlags::empty(),
        });
        let err = GraphicBuffer::from_handle(handle, UsageFlags::empty()).unwrap_err();
        assert_eq!(err.defect(), Some(HandleDefect::Version { found: 0 }));
    }

    #[test]
    fn test_allocate_registers_buffer() {
        let (pool, mut manager) = manager();
        let geometry = BufferGeometry::new(32, 32, PixelFormat::RGBA_8888);
        let id = manager
            .allocate(geometry, size(4096), UsageFlags::HW_RENDER, HandleFlags::USES_ION)
            .unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.ids().collect::<Vec<_>>(), vec![id]);
        let buffer = manager.get(id).unwrap();
        assert_eq!(buffer.geometry(), geometry);
        assert_eq!(buffer.handle().unwrap().validate().unwrap().backing.size, 4096);
        assert_eq!(pool.stats().unwrap().live_allocations, 1);
    }

    #[test]
    fn test_needs_new_buffer_uses_mirror() {
        let (_pool, mut manager) = manager();
        let geometry = BufferGeometry::new(100, 200, PixelFormat::RGBA_8888);
        let id = manager.register(GraphicBuffer::without_handle(geometry, UsageFlags::empty()));

        let other = BufferGeometry::new(100, 200, PixelFormat::RGB_565);
        assert!(!manager.needs_new_buffer(id, geometry, BufferGeometry::UNSET).unwrap());
        assert!(manager.needs_new_buffer(id, other, BufferGeometry::UNSET).unwrap());
        assert!(!manager.needs_new_buffer(id, other, other).unwrap());
    }

    #[test]
    fn test_unknown_id_is_null_buffer() {
        let (_pool, mut manager) = manager();
        let id = BufferId::new_unique();
        assert!(matches!(
            manager.needs_new_buffer(id, BufferGeometry::UNSET, BufferGeometry::UNSET),
            Err(BufferError::NullBuffer)
        ));
        assert!(matches!(manager.check_buffer(id, 64, UsageFlags::empty()), Err(BufferError::NullBuffer)));
        assert!(matches!(manager.release(id), Err(BufferError::NullBuffer)));
    }

    #[test]
    fn test_check_buffer_without_handle() {
        let (_pool, mut manager) = manager();
        let id = manager.register(GraphicBuffer::without_handle(BufferGeometry::UNSET, UsageFlags::empty()));
        assert!(manager.check_buffer(id, 0, UsageFlags::empty()).is_ok());
        let err = manager.check_buffer(id, 4096, UsageFlags::empty()).unwrap_err();
        assert_eq!(err.defect(), Some(HandleDefect::Missing));
    }

    #[test]
    fn test_check_buffer_grows_backing_store() {
        let (pool, mut manager) = manager();
        let geometry = BufferGeometry::new(64, 64, PixelFormat::RGBA_8888);
        let id = manager
            .allocate(geometry, size(4096), UsageFlags::empty(), HandleFlags::empty())
            .unwrap();

        manager.check_buffer(id, 64 * 64 * 4, UsageFlags::HW_TEXTURE).unwrap();
        let backing = manager.get(id).unwrap().handle().unwrap().validate().unwrap().backing;
        assert_eq!(backing.size, 64 * 64 * 4);
        assert_eq!(pool.stats().unwrap().bytes_in_use, 64 * 64 * 4);
    }

    #[test]
    fn test_release_frees_backing_store() {
        let (pool, mut manager) = manager();
        let geometry = BufferGeometry::new(16, 16, PixelFormat::RGBA_8888);
        let id = manager
            .allocate(geometry, size(1024), UsageFlags::empty(), HandleFlags::empty())
            .unwrap();

        let buffer = manager.release(id).unwrap();
        assert!(manager.is_empty());
        assert_eq!(pool.stats().unwrap().live_allocations, 0);
        assert_eq!(
            buffer.handle().unwrap().validate().unwrap_err(),
            HandleDefect::Released
        );
    }

    #[test]
    fn test_release_of_released_handle_drops_buffer() {
        let (pool, mut manager) = manager();
        let geometry = BufferGeometry::new(8, 8, PixelFormat::RGBA_8888);
        let handle = BufferHandle::new(AllocationDescriptor::RELEASED, geometry, 4096, HandleFlags::empty());
        let mut buffer = GraphicBuffer::without_handle(geometry, UsageFlags::empty());
        buffer.handle = Some(handle);
        let id = manager.register(buffer);

        assert!(manager.release(id).is_ok());
        assert!(manager.is_empty());
        assert_eq!(pool.stats().unwrap().live_allocations, 0);
    }

    #[test]
    fn test_release_of_corrupted_handle_keeps_buffer() {
        let (pool, mut manager) = manager();
        let geometry = BufferGeometry::new(16, 16, PixelFormat::RGBA_8888);
        let id = manager
            .allocate(geometry, size(1024), UsageFlags::empty(), HandleFlags::empty())
            .unwrap();
        let buffer = manager.buffers.get_mut(&id).unwrap();
        let mut raw = buffer.handle.take().unwrap().into_raw();
        raw.magic = 0xdead_beef;
        buffer.handle = Some(BufferHandle::from_raw(raw));

        let err = manager.release(id).unwrap_err();

        assert_eq!(err.defect(), Some(HandleDefect::Magic { found: 0xdead_beef }));
        assert_eq!(manager.len(), 1);
        assert!(manager.get(id).is_some());
        assert_eq!(pool.stats().unwrap().live_allocations, 1);
    }
}
