//! Framebuffer regions and clearing them without the GPU.

use crate::composition::CompositionType;
use crate::error::CompositorError;
use displayhal_buffer::PixelFormat;
use tracing::{error, trace};

/// An axis-aligned rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Exclusive right edge. Widened so `x + width` cannot overflow.
    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        i64::from(self.x) < other.right()
            && self.right() > i64::from(other.x)
            && i64::from(self.y) < other.bottom()
            && self.bottom() > i64::from(other.y)
    }

    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());

        // Extents past i32::MAX saturate.
        let span = |from: i32, to: i64| i32::try_from(to - i64::from(from)).unwrap_or(i32::MAX);
        Self { x: x1, y: y1, width: span(x1, x2), height: span(y1, y2) }
    }

    /// True when `self` lies inside a `width` x `height` area at the origin.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= i64::from(width)
            && self.bottom() <= i64::from(height)
    }

    /// Shares a full edge with `other`, so their union is exactly both.
    fn abuts(&self, other: &Self) -> bool {
        let vertical = self.x == other.x
            && self.width == other.width
            && (i64::from(self.y) == other.bottom() || self.bottom() == i64::from(other.y));
        let horizontal = self.y == other.y
            && self.height == other.height
            && (i64::from(self.x) == other.right() || self.right() == i64::from(other.x));
        vertical || horizontal
    }
}

/// A set of rectangles, e.g. the uncovered area of a frame.
///
/// Rectangles may overlap; clearing an overlap twice is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    rectangles: Vec<Rectangle>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `rect`, merging it with a rectangle it abuts. Empty rectangles are ignored.
    pub fn add(&mut self, rect: Rectangle) {
        if rect.is_empty() {
            return;
        }
        let mut rect = rect;
        // Merging can make the grown rectangle abut another one.
        while let Some(i) = self.rectangles.iter().position(|r| r.abuts(&rect)) {
            rect = self.rectangles.swap_remove(i).union(&rect);
        }
        self.rectangles.push(rect);
    }

    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    pub fn clear(&mut self) {
        self.rectangles.clear();
    }

    /// The smallest rectangle covering the whole region.
    pub fn bounds(&self) -> Rectangle {
        self.rectangles
            .iter()
            .fold(Rectangle::default(), |acc, r| acc.union(r))
    }
}

impl FromIterator<Rectangle> for Region {
    fn from_iter<I: IntoIterator<Item = Rectangle>>(iter: I) -> Self {
        let mut region = Region::new();
        for rect in iter {
            region.add(rect);
        }
        region
    }
}

/// CPU-visible pixels of the buffer being rendered into.
#[derive(Debug)]
pub struct RenderTarget<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    /// Row pitch in pixels.
    stride: u32,
    format: PixelFormat,
}

impl<'a> RenderTarget<'a> {
    /// Wraps `pixels`, checking it can hold `height` rows of `stride` pixels.
    pub fn new(
        pixels: &'a mut [u8],
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
    ) -> Result<Self, CompositorError> {
        if stride < width {
            return Err(CompositorError::InvalidArguments(format!(
                "stride {} is narrower than width {}",
                stride, width
            )));
        }
        let needed = u64::from(stride) * u64::from(height) * u64::from(Self::bytes_per_pixel_of(format));
        if (pixels.len() as u64) < needed {
            return Err(CompositorError::InvalidArguments(format!(
                "render target needs {} bytes, got {}",
                needed,
                pixels.len()
            )));
        }
        Ok(Self { pixels, width, height, stride, format })
    }

    fn bytes_per_pixel_of(format: PixelFormat) -> u32 {
        if format == PixelFormat::RGB_565 {
            2
        } else {
            4
        }
    }

    /// 2 for RGB565 and 4 for everything else.
    pub fn bytes_per_pixel(&self) -> u32 {
        Self::bytes_per_pixel_of(self.format)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixels
    }

    fn zero(&mut self, rect: &Rectangle) {
        let bpp = self.bytes_per_pixel() as usize;
        let pitch = self.stride as usize * bpp;
        let row_bytes = rect.width as usize * bpp;
        let first = rect.y as usize * pitch + rect.x as usize * bpp;
        for row in 0..rect.height as usize {
            let start = first + row * pitch;
            self.pixels[start..start + row_bytes].fill(0);
        }
    }
}

/// Zeroes every rectangle of `region` in `target`.
///
/// Only CPU, MDP and C2D composition clear here. Any other type returns
/// `UnsupportedComposition` so the caller can draw the area with the GPU.
///
/// # Errors
///
/// * `UnsupportedComposition` for GPU or DYN composition.
/// * `NullInput` if there is no render target.
/// * `RegionOutOfBounds` if a rectangle leaves the target. Nothing is written.
pub fn clear_region(
    composition: CompositionType,
    region: &Region,
    target: Option<&mut RenderTarget<'_>>,
) -> Result<(), CompositorError> {
    if !composition.clears_without_gpu() {
        return Err(CompositorError::UnsupportedComposition(composition));
    }
    let Some(target) = target else {
        error!("clear_region: no render target");
        return Err(CompositorError::NullInput("render target"));
    };

    if let Some(rect) = region
        .rectangles()
        .iter()
        .find(|r| !r.is_empty() && !r.fits_within(target.width, target.height))
    {
        error!(?rect, width = target.width, height = target.height, "clear_region: rectangle out of bounds");
        return Err(CompositorError::RegionOutOfBounds {
            rect: *rect,
            width: target.width,
            height: target.height,
        });
    }

    for rect in region.rectangles().iter().filter(|r| !r.is_empty()) {
        trace!(?rect, "Clearing rectangle");
        target.zero(rect);
    }
    Ok(())
}
