//! Vendor window operations.
//!
//! Native windows forward vendor `perform` calls as an operation code and a
//! list of integer arguments. [`WindowRequest::decode`] checks the argument
//! count and ranges and turns them into a typed request, which is then applied
//! to a buffer held by a [`BufferManager`].

use crate::error::CompositorError;
use displayhal_buffer::{BufferError, BufferGeometry, BufferId, BufferManager, PixelFormat};
use tracing::{debug, error};

/// Vendor operation codes of the native window `perform` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum WindowOperation {
    /// `(size)`: make the buffer's backing store `size` bytes.
    SetBuffersSize = 0x1000_0000,
    /// `(width, height, format)`: rewrite the buffer's geometry.
    UpdateBuffersGeometry = 0x2000_0000,
}

impl WindowOperation {
    pub fn from_raw(code: i32) -> Result<Self, CompositorError> {
        match code {
            0x1000_0000 => Ok(WindowOperation::SetBuffersSize),
            0x2000_0000 => Ok(WindowOperation::UpdateBuffersGeometry),
            _ => {
                error!("invalid operation({:#x})", code);
                Err(CompositorError::UnknownOperation(code))
            }
        }
    }

    /// Number of arguments the operation takes.
    pub fn arg_count(self) -> usize {
        match self {
            WindowOperation::SetBuffersSize => 1,
            WindowOperation::UpdateBuffersGeometry => 3,
        }
    }
}

/// A decoded window operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    /// Sizes of zero or less are accepted and leave the buffer alone.
    SetBuffersSize { size: i64 },
    UpdateBuffersGeometry(BufferGeometry),
}

fn u32_arg(operation: WindowOperation, name: &str, value: i64) -> Result<u32, CompositorError> {
    u32::try_from(value).map_err(|_| {
        CompositorError::InvalidArguments(format!("{:?}: {} {} is out of range", operation, name, value))
    })
}

impl WindowRequest {
    pub fn decode(code: i32, args: &[i64]) -> Result<Self, CompositorError> {
        let operation = WindowOperation::from_raw(code)?;
        if args.len() != operation.arg_count() {
            return Err(CompositorError::InvalidArguments(format!(
                "{:?} takes {} argument(s), got {}",
                operation,
                operation.arg_count(),
                args.len()
            )));
        }

        let request = match operation {
            WindowOperation::SetBuffersSize => WindowRequest::SetBuffersSize { size: args[0] },
            WindowOperation::UpdateBuffersGeometry => WindowRequest::UpdateBuffersGeometry(BufferGeometry::new(
                u32_arg(operation, "width", args[0])?,
                u32_arg(operation, "height", args[1])?,
                PixelFormat(u32_arg(operation, "format", args[2])?),
            )),
        };
        Ok(request)
    }

    pub fn operation(&self) -> WindowOperation {
        match self {
            WindowRequest::SetBuffersSize { .. } => WindowOperation::SetBuffersSize,
            WindowRequest::UpdateBuffersGeometry(_) => WindowOperation::UpdateBuffersGeometry,
        }
    }

    /// Carries out the request on buffer `id`.
    ///
    /// A size request reallocates with the buffer's own usage bits.
    pub fn apply(&self, manager: &mut BufferManager, id: BufferId) -> Result<(), CompositorError> {
        debug!(request = ?self, buffer = id.as_u64(), "Applying window request");
        match *self {
            WindowRequest::SetBuffersSize { size } => {
                let usage = manager.get(id).ok_or(BufferError::NullBuffer)?.usage();
                manager.check_buffer(id, size, usage)?;
            }
            WindowRequest::UpdateBuffersGeometry(geometry) => manager.update_geometry(id, geometry)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_decode_set_buffers_size() {
        let request = WindowRequest::decode(0x1000_0000, &[8192]).unwrap();
        assert_eq!(request, WindowRequest::SetBuffersSize { size: 8192 });
        assert_eq!(request.operation().arg_count(), 1);
    }

    #[test]
    fn test_decode_update_geometry() {
        let request = WindowRequest::decode(0x2000_0000, &[640, 480, 0x108]).unwrap();
        assert_eq!(
            request,
            WindowRequest::UpdateBuffersGeometry(BufferGeometry::new(640, 480, PixelFormat::YCBCR_420_SP_TILED))
        );
        assert_eq!(request.operation().arg_count(), 3);
    }

    #[test]
    fn test_unknown_operation() {
        assert!(matches!(
            WindowRequest::decode(0x42, &[]),
            Err(CompositorError::UnknownOperation(0x42))
        ));
    }

    #[rstest]
    #[case(0x1000_0000, &[])]
    #[case(0x1000_0000, &[1, 2])]
    #[case(0x2000_0000, &[640, 480])]
    #[case(0x2000_0000, &[-1, 480, 1])]
    #[case(0x2000_0000, &[640, 480, 1 << 40])]
    fn test_invalid_arguments(#[case] code: i32, #[case] args: &[i64]) {
        assert!(matches!(
            WindowRequest::decode(code, args),
            Err(CompositorError::InvalidArguments(_))
        ));
    }
}
