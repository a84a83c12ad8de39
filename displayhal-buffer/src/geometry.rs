//! Buffer geometry: width, height and pixel format.

use crate::format::PixelFormat;

/// The shape of a graphics buffer.
///
/// A geometry with any zero field is "unset" and carries no opinion about the
/// buffer's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferGeometry {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl BufferGeometry {
    /// The all-zero geometry.
    pub const UNSET: BufferGeometry = BufferGeometry {
        width: 0,
        height: 0,
        format: PixelFormat::UNSET,
    };

    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self { width, height, format }
    }

    /// True when width, height and format are all non-zero.
    pub fn is_set(&self) -> bool {
        self.width != 0 && self.height != 0 && self.format.is_set()
    }
}
