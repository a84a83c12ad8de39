//! In-place geometry updates.

use crate::buffer::GraphicBuffer;
use crate::error::{BufferError, HandleDefect};
use crate::geometry::BufferGeometry;
use tracing::{debug, error};

/// Writes `updated` into `buffer` and its handle without touching memory.
///
/// An unset `updated`, or one equal to the buffer's current geometry, is a
/// no-op. Otherwise the handle is validated and, on success, the handle and
/// the buffer's mirror are both rewritten before this returns.
///
/// # Errors
///
/// * `NullBuffer` if `buffer` is `None`.
/// * `InvalidHandle` if the buffer's handle is missing or malformed. Nothing
///   is changed in that case.
pub fn update_geometry(buffer: Option<&mut GraphicBuffer>, updated: BufferGeometry) -> Result<(), BufferError> {
    let Some(buffer) = buffer else {
        error!("update_geometry: buffer is absent");
        return Err(BufferError::NullBuffer);
    };
    if !updated.is_set() || buffer.geometry() == updated {
        return Ok(());
    }

    let handle = buffer.handle.as_mut().ok_or(HandleDefect::Missing);
    let mut view = handle.and_then(|h| h.validate_mut()).map_err(|defect| {
        error!("update_geometry: invalid handle: {}", defect);
        BufferError::from(defect)
    })?;

    view.set_geometry(updated);
    buffer.width = updated.width;
    buffer.height = updated.height;
    buffer.format = updated.format;
    debug!(geometry = ?updated, "Updated buffer geometry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::UsageFlags;
    use crate::format::PixelFormat;
    use crate::handle::{AllocationDescriptor, BufferHandle, HandleFlags};

    fn buffer(geometry: BufferGeometry) -> GraphicBuffer {
        let handle = BufferHandle::new(
            AllocationDescriptor { fd: 9, base: 0x4000, offset: 0, size: 8192 },
            geometry,
            4096,
            HandleFlags::empty(),
        );
        GraphicBuffer::from_handle(handle, UsageFlags::empty()).unwrap()
    }

    #[test]
    fn test_absent_buffer() {
        let updated = BufferGeometry::new(1, 1, PixelFormat::RGBA_8888);
        assert!(matches!(update_geometry(None, updated), Err(BufferError::NullBuffer)));
    }

    #[test]
    fn test_updates_mirror_and_handle_together() {
        let mut buffer = buffer(BufferGeometry::new(32, 32, PixelFormat::RGBA_8888));
        let updated = BufferGeometry::new(48, 16, PixelFormat::RGB_565);

        update_geometry(Some(&mut buffer), updated).unwrap();

        assert_eq!(buffer.geometry(), updated);
        let view = buffer.handle().unwrap().validate().unwrap();
        assert_eq!(view.geometry, updated);
        assert_eq!(view.backing.size, 8192);
    }

    #[test]
    fn test_unset_update_is_noop() {
        let original = BufferGeometry::new(32, 32, PixelFormat::RGBA_8888);
        let mut buffer = buffer(original);
        update_geometry(Some(&mut buffer), BufferGeometry::new(64, 0, PixelFormat::RGBA_8888)).unwrap();
        assert_eq!(buffer.geometry(), original);
    }

    #[test]
    fn test_invalid_handle_leaves_buffer_untouched() {
        let original = BufferGeometry::new(32, 32, PixelFormat::RGBA_8888);
        let mut buffer = buffer(original);
        buffer.handle_mut().unwrap().validate_mut().unwrap().release_backing();

        let err = update_geometry(Some(&mut buffer), BufferGeometry::new(8, 8, PixelFormat::RGBA_8888))
            .unwrap_err();
        assert_eq!(err.defect(), Some(HandleDefect::Released));
        assert_eq!(buffer.geometry(), original);
    }

    #[test]
    fn test_missing_handle() {
        let mut buffer = GraphicBuffer::without_handle(BufferGeometry::UNSET, UsageFlags::empty());
        let err = update_geometry(Some(&mut buffer), BufferGeometry::new(8, 8, PixelFormat::RGBA_8888))
            .unwrap_err();
        assert_eq!(err.defect(), Some(HandleDefect::Missing));
    }
}
