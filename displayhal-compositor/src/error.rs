//! Errors reported by the compositor helpers.

use crate::composition::CompositionType;
use crate::framebuffer::Rectangle;
use displayhal_buffer::BufferError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompositorError {
    /// A required input was absent.
    #[error("{0} is absent")]
    NullInput(&'static str),

    /// The active composition type cannot perform the request. The caller
    /// should fall back to drawing with the GPU.
    #[error("operation not supported with {0:?} composition")]
    UnsupportedComposition(CompositionType),

    #[error("rectangle {rect:?} lies outside the {width}x{height} render target")]
    RegionOutOfBounds { rect: Rectangle, width: u32, height: u32 },

    #[error("unknown window operation {0:#x}")]
    UnknownOperation(i32),

    #[error("unknown layer attribute {0:#x}")]
    UnknownAttribute(i32),

    #[error("unknown external display event {0}")]
    UnknownDisplayEvent(i32),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}
