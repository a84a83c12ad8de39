//! Pixel formats known to the buffer helpers.
//!
//! Values follow the HAL pixel format numbering, including the vendor YUV
//! formats. Bit fields above the format code flag interlaced and
//! stereoscopic (S3D) content.

use std::fmt;

/// Set on formats carrying interlaced content.
pub const INTERLACE_MASK: u32 = 0x80;
/// Any of these bits marks an S3D packing.
pub const S3D_FORMAT_MASK: u32 = 0xF_F000;

/// A HAL pixel format code. `PixelFormat(0)` means "unset".
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// No format specified.
    pub const UNSET: PixelFormat = PixelFormat(0);

    // Core HAL formats.
    /// 32-bit RGBA, 8 bits per channel.
    pub const RGBA_8888: PixelFormat = PixelFormat(1);
    /// 32-bit RGB with an unused alpha byte.
    pub const RGBX_8888: PixelFormat = PixelFormat(2);
    /// Packed 24-bit RGB.
    pub const RGB_888: PixelFormat = PixelFormat(3);
    /// 16-bit RGB, 5/6/5 bits.
    pub const RGB_565: PixelFormat = PixelFormat(4);
    /// 32-bit BGRA, 8 bits per channel.
    pub const BGRA_8888: PixelFormat = PixelFormat(5);
    /// 16-bit RGBA with one alpha bit.
    pub const RGBA_5551: PixelFormat = PixelFormat(6);
    /// 16-bit RGBA, 4 bits per channel.
    pub const RGBA_4444: PixelFormat = PixelFormat(7);
    /// NV16: semi-planar 4:2:2, Cb before Cr.
    pub const YCBCR_422_SP: PixelFormat = PixelFormat(0x10);
    /// NV21: semi-planar 4:2:0, Cr before Cb.
    pub const YCRCB_420_SP: PixelFormat = PixelFormat(0x11);
    /// YUY2: interleaved 4:2:2.
    pub const YCBCR_422_I: PixelFormat = PixelFormat(0x14);
    /// Planar 4:2:0, Y then Cr then Cb. The code spells "YV12".
    pub const YV12: PixelFormat = PixelFormat(0x3231_5659);

    // Vendor formats.
    /// NV12 laid out for the video encoder.
    pub const NV12_ENCODEABLE: PixelFormat = PixelFormat(0x102);
    /// NV12 in 64x32 macro tiles. Needs 8K alignment.
    pub const YCBCR_420_SP_TILED: PixelFormat = PixelFormat(0x108);
    /// NV12: semi-planar 4:2:0, Cb before Cr.
    pub const YCBCR_420_SP: PixelFormat = PixelFormat(0x109);
    /// NV21 with the plane padding the Adreno GPU expects.
    pub const YCRCB_420_SP_ADRENO: PixelFormat = PixelFormat(0x10A);
    /// NV61: semi-planar 4:2:2, Cr before Cb.
    pub const YCRCB_422_SP: PixelFormat = PixelFormat(0x10B);
    /// Single 8-bit channel.
    pub const R_8: PixelFormat = PixelFormat(0x10D);
    /// Two 8-bit channels.
    pub const RG_88: PixelFormat = PixelFormat(0x10E);
    /// XOR-ed into a base format to describe its interlaced variant.
    pub const INTERLACE: PixelFormat = PixelFormat(0x180);

    /// The interlaced variant of this format.
    #[inline(always)]
    pub fn interlaced(self) -> PixelFormat {
        PixelFormat(self.0 ^ Self::INTERLACE.0)
    }

    /// False for [`PixelFormat::UNSET`].
    #[inline(always)]
    pub fn is_set(self) -> bool {
        self.0 != 0
    }

    /// True if the interlace bit is set.
    #[inline(always)]
    pub fn is_interlaced(self) -> bool {
        self.0 & INTERLACE_MASK != 0
    }

    /// True if any S3D packing bit is set.
    #[inline(always)]
    pub fn is_s3d(self) -> bool {
        self.0 & S3D_FORMAT_MASK != 0
    }

    /// Formats whose tiles need a coarser alignment than a page.
    pub fn requires_tile_alignment(self) -> bool {
        self == Self::YCBCR_420_SP_TILED || self == Self::YCBCR_420_SP_TILED.interlaced()
    }

    /// Bytes per pixel of the first plane, for the packed RGB formats.
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            Self::RGBA_8888 | Self::RGBX_8888 | Self::BGRA_8888 => Some(4),
            Self::RGB_888 => Some(3),
            Self::RGB_565 | Self::RGBA_5551 | Self::RGBA_4444 => Some(2),
            _ => None,
        }
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::UNSET => "UNSET",
            Self::RGBA_8888 => "RGBA_8888",
            Self::RGBX_8888 => "RGBX_8888",
            Self::RGB_888 => "RGB_888",
            Self::RGB_565 => "RGB_565",
            Self::BGRA_8888 => "BGRA_8888",
            Self::RGBA_5551 => "RGBA_5551",
            Self::RGBA_4444 => "RGBA_4444",
            Self::YCBCR_422_SP => "YCbCr_422_SP",
            Self::YCRCB_420_SP => "YCrCb_420_SP",
            Self::YCBCR_422_I => "YCbCr_422_I",
            Self::YV12 => "YV12",
            Self::NV12_ENCODEABLE => "NV12_ENCODEABLE",
            Self::YCBCR_420_SP_TILED => "YCbCr_420_SP_TILED",
            Self::YCBCR_420_SP => "YCbCr_420_SP",
            Self::YCRCB_420_SP_ADRENO => "YCrCb_420_SP_ADRENO",
            Self::YCRCB_422_SP => "YCrCb_422_SP",
            Self::R_8 => "R_8",
            Self::RG_88 => "RG_88",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "PixelFormat({})", name),
            None => write!(f, "PixelFormat({:#x})", self.0),
        }
    }
}

/// Returns true if the GPU can sample buffers of this format.
///
/// YV12 is checked first since its fourcc code overlaps the S3D bits.
pub fn is_gpu_supported_format(format: PixelFormat) -> bool {
    // Saves SurfaceFlinger CPU time on targets that bypass EGL images for 4:2:0 SP.
    #[cfg(feature = "bypass-eglimage")]
    {
        if format == PixelFormat::YCRCB_420_SP {
            return false;
        }
    }

    if format == PixelFormat::YV12 {
        true
    } else if format.is_interlaced() {
        false
    } else {
        !format.is_s3d()
    }
}
