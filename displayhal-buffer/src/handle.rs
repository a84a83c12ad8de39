//! Graphics buffer handles.
//!
//! A [`BufferHandle`] describes one allocation: the allocator's descriptor for
//! the backing store plus the buffer's geometry and flags. Handles can arrive
//! from outside the process in any state, so their contents are private and
//! only reachable through the views returned by [`BufferHandle::validate`] and
//! [`BufferHandle::validate_mut`]. Both run the same structural check.

use crate::error::HandleDefect;
use crate::geometry::BufferGeometry;
use bitflags::bitflags;
use std::ops::Deref;

/// A file descriptor number as carried in a handle.
pub type Fd = i32;

/// Byte size of the native handle header (version, fd count, int count).
pub const HANDLE_VERSION: i32 = 12;
/// A buffer handle carries exactly one file descriptor.
pub const HANDLE_NUM_FDS: i32 = 1;
/// Integer words following the descriptor: magic, flags, size, offset,
/// base, alignment, width, height, format, and two words of bookkeeping.
pub const HANDLE_NUM_INTS: i32 = 11;
/// "gmsm"
pub const HANDLE_MAGIC: u32 = 0x676d_736d;

bitflags! {
    /// Private handle flags describing where the memory came from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HandleFlags: u32 {
        const FRAMEBUFFER = 0x0000_0001;
        const USES_PMEM = 0x0000_0002;
        const USES_ASHMEM = 0x0000_0004;
        const USES_ION = 0x0000_0008;
        const NEEDS_FLUSH = 0x0000_0010;
        const DO_NOT_FLUSH = 0x0000_0020;
    }
}

/// Identifies an allocation as the allocator handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationDescriptor {
    /// Descriptor of the shared memory region, `-1` once released.
    pub fd: Fd,
    /// Address the region is mapped at in this process.
    pub base: usize,
    /// Offset of the buffer's first byte within the region.
    pub offset: u64,
    /// Size of the region in bytes.
    pub size: u64,
}

impl AllocationDescriptor {
    /// A descriptor that refers to no memory.
    pub const RELEASED: AllocationDescriptor = AllocationDescriptor {
        fd: -1,
        base: 0,
        offset: 0,
        size: 0,
    };

    /// True if the descriptor no longer refers to memory.
    pub fn is_released(&self) -> bool {
        self.fd < 0
    }
}

/// The full contents of a handle, as received from another component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBufferHandle {
    /// Header size; must equal [`HANDLE_VERSION`].
    pub version: i32,
    /// Must equal [`HANDLE_NUM_FDS`].
    pub num_fds: i32,
    /// Must equal [`HANDLE_NUM_INTS`].
    pub num_ints: i32,
    /// Must equal [`HANDLE_MAGIC`].
    pub magic: u32,
    /// The memory currently backing the buffer.
    pub backing: AllocationDescriptor,
    /// Base alignment the backing store was allocated with.
    pub alignment: u64,
    /// Width, height and format of the buffer contents.
    pub geometry: BufferGeometry,
    pub flags: HandleFlags,
}

/// A graphics buffer handle. Validate before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferHandle {
    raw: RawBufferHandle,
}

impl BufferHandle {
    /// Creates a well-formed handle for a fresh allocation.
    pub fn new(
        backing: AllocationDescriptor,
        geometry: BufferGeometry,
        alignment: u64,
        flags: HandleFlags,
    ) -> Self {
        Self {
            raw: RawBufferHandle {
                version: HANDLE_VERSION,
                num_fds: HANDLE_NUM_FDS,
                num_ints: HANDLE_NUM_INTS,
                magic: HANDLE_MAGIC,
                backing,
                alignment,
                geometry,
                flags,
            },
        }
    }

    /// Wraps handle contents received from elsewhere. Nothing is checked here.
    pub fn from_raw(raw: RawBufferHandle) -> Self {
        Self { raw }
    }

    fn check(&self) -> Result<(), HandleDefect> {
        let raw = &self.raw;
        if raw.version != HANDLE_VERSION {
            return Err(HandleDefect::Version { found: raw.version });
        }
        if raw.num_fds != HANDLE_NUM_FDS {
            return Err(HandleDefect::FdCount { found: raw.num_fds });
        }
        if raw.num_ints != HANDLE_NUM_INTS {
            return Err(HandleDefect::IntCount { found: raw.num_ints });
        }
        if raw.magic != HANDLE_MAGIC {
            return Err(HandleDefect::Magic { found: raw.magic });
        }
        if raw.backing.is_released() {
            return Err(HandleDefect::Released);
        }
        Ok(())
    }

    /// Unwraps the handle contents, for passing the handle on. Nothing is checked here.
    pub fn into_raw(self) -> RawBufferHandle {
        self.raw
    }

    /// Checks the handle and returns a read-only view of it.
    pub fn validate(&self) -> Result<HandleRef<'_>, HandleDefect> {
        self.check()?;
        Ok(HandleRef { raw: &self.raw })
    }

    /// Checks the handle and returns a view through which it can be updated.
    pub fn validate_mut(&mut self) -> Result<HandleMut<'_>, HandleDefect> {
        self.check()?;
        Ok(HandleMut { raw: &mut self.raw })
    }

    /// Checks the given handle if present, reporting [`HandleDefect::Missing`] otherwise.
    pub fn validate_opt(handle: Option<&Self>) -> Result<HandleRef<'_>, HandleDefect> {
        handle.ok_or(HandleDefect::Missing)?.validate()
    }
}

/// Read access to a validated handle.
#[derive(Debug, Clone, Copy)]
pub struct HandleRef<'a> {
    raw: &'a RawBufferHandle,
}

impl Deref for HandleRef<'_> {
    type Target = RawBufferHandle;

    fn deref(&self) -> &RawBufferHandle {
        self.raw
    }
}

/// Write access to a validated handle.
///
/// Every mutation replaces a whole group of fields in one assignment, so a
/// handle is never seen with, say, a new fd and an old size.
#[derive(Debug)]
pub struct HandleMut<'a> {
    raw: &'a mut RawBufferHandle,
}

impl Deref for HandleMut<'_> {
    type Target = RawBufferHandle;

    fn deref(&self) -> &RawBufferHandle {
        self.raw
    }
}

impl HandleMut<'_> {
    /// Installs a new backing allocation.
    pub(crate) fn replace_backing(&mut self, backing: AllocationDescriptor) {
        self.raw.backing = backing;
    }

    /// Marks the backing store as gone. The handle fails validation afterwards.
    pub(crate) fn release_backing(&mut self) {
        self.raw.backing = AllocationDescriptor::RELEASED;
    }

    pub(crate) fn set_geometry(&mut self, geometry: BufferGeometry) {
        self.raw.geometry = geometry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use rstest::rstest;

    fn sample_handle() -> BufferHandle {
        BufferHandle::new(
            AllocationDescriptor { fd: 7, base: 0x1000, offset: 0, size: 4096 },
            BufferGeometry::new(32, 32, PixelFormat::RGBA_8888),
            4096,
            HandleFlags::USES_ION,
        )
    }

    #[test]
    fn test_new_handle_validates() {
        let handle = sample_handle();
        let view = handle.validate().unwrap();
        assert_eq!(view.backing.fd, 7);
        assert_eq!(view.geometry.width, 32);
        assert_eq!(view.flags, HandleFlags::USES_ION);
    }

    #[rstest]
    #[case(|r: &mut RawBufferHandle| r.version = 4, HandleDefect::Version { found: 4 })]
    #[case(|r: &mut RawBufferHandle| r.num_fds = 0, HandleDefect::FdCount { found: 0 })]
    #[case(|r: &mut RawBufferHandle| r.num_ints = 3, HandleDefect::IntCount { found: 3 })]
    #[case(|r: &mut RawBufferHandle| r.magic = 0, HandleDefect::Magic { found: 0 })]
    #[case(|r: &mut RawBufferHandle| r.backing = AllocationDescriptor::RELEASED, HandleDefect::Released)]
    fn test_malformed_handles_are_rejected(
        #[case] corrupt: fn(&mut RawBufferHandle),
        #[case] expected: HandleDefect,
    ) {
        let mut raw = sample_handle().raw;
        corrupt(&mut raw);
        let mut handle = BufferHandle::from_raw(raw);

        assert_eq!(handle.validate().unwrap_err(), expected);
        assert_eq!(handle.validate_mut().unwrap_err(), expected);
    }

    #[test]
    fn test_missing_handle() {
        assert_eq!(BufferHandle::validate_opt(None).unwrap_err(), HandleDefect::Missing);
        let handle = sample_handle();
        assert!(BufferHandle::validate_opt(Some(&handle)).is_ok());
    }

    #[test]
    fn test_release_backing_invalidates_handle() {
        let mut handle = sample_handle();
        handle.validate_mut().unwrap().release_backing();
        assert_eq!(handle.validate().unwrap_err(), HandleDefect::Released);
    }
}
