use crate::{PixelFormat, UnsupportedFormatError, util::AlignedBuf};

/// Everything that can go wrong when wrapping a buffer into a surface view
#[derive(Debug, thiserror::Error)]
pub enum BoundsCheckError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    #[error("width or height must not be zero")]
    InvalidDimensions,

    #[error("invalid pitch, expected it to be at least {minimum}, but got {got}")]
    InvalidPitch { minimum: usize, got: usize },

    #[error("invalid buffer size, expected it to be at least {minimum}, but got {got}")]
    InvalidBufferSize { minimum: usize, got: usize },
}

/// Check that a `pitch`-strided buffer of `len` bytes holds `width` x `height` pixels of `format`
#[deny(clippy::arithmetic_side_effects)]
fn bounds_check(
    format: PixelFormat,
    width: usize,
    height: usize,
    pitch: usize,
    len: usize,
) -> Result<(), BoundsCheckError> {
    let bpp = format.bytes_per_pixel()?;

    if width == 0 || height == 0 {
        return Err(BoundsCheckError::InvalidDimensions);
    }

    let row = width.checked_mul(bpp).ok_or(BoundsCheckError::InvalidPitch {
        minimum: usize::MAX,
        got: pitch,
    })?;

    if row > pitch {
        return Err(BoundsCheckError::InvalidPitch {
            minimum: row,
            got: pitch,
        });
    }

    // The last row only needs to be as long as its pixels
    let minimum = height
        .saturating_sub(1)
        .checked_mul(pitch)
        .and_then(|n| n.checked_add(row))
        .unwrap_or(usize::MAX);

    if minimum > len {
        return Err(BoundsCheckError::InvalidBufferSize { minimum, got: len });
    }

    Ok(())
}

/// Owned, aligned, tightly packed RGB surface
#[derive(Debug)]
pub struct Surface {
    format: PixelFormat,
    width: usize,
    height: usize,
    pitch: usize,
    pixels: AlignedBuf,
}

/// Error returned by [`Surface::new`]
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error(transparent)]
    BoundsCheck(#[from] BoundsCheckError),

    #[error("failed to allocate {bytes} bytes for a surface")]
    Allocation { bytes: usize },
}

impl Surface {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, SurfaceError> {
        let bpp = format.bytes_per_pixel().map_err(BoundsCheckError::from)?;

        let pitch = width
            .checked_mul(bpp)
            .ok_or(SurfaceError::Allocation { bytes: usize::MAX })?;
        let size = pitch
            .checked_mul(height)
            .ok_or(SurfaceError::Allocation { bytes: usize::MAX })?;

        bounds_check(format, width, height, pitch, size)?;

        let pixels =
            AlignedBuf::zeroed(size).map_err(|e| SurfaceError::Allocation { bytes: e.bytes })?;

        Ok(Self {
            format,
            width,
            height,
            pitch,
            pixels,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_slice()
    }

    pub fn view(&self) -> SurfaceRef<'_> {
        SurfaceRef {
            format: self.format,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            pixels: self.pixels.as_slice(),
        }
    }

    pub fn view_mut(&mut self) -> SurfaceMut<'_> {
        SurfaceMut {
            format: self.format,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            pixels: self.pixels.as_mut_slice(),
        }
    }
}

/// Immutable view of RGB pixels in a borrowed buffer
#[derive(Debug, Clone, Copy)]
pub struct SurfaceRef<'a> {
    pub(crate) format: PixelFormat,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pitch: usize,
    pub(crate) pixels: &'a [u8],
}

impl<'a> SurfaceRef<'a> {
    pub fn from_buffer(
        width: usize,
        height: usize,
        format: PixelFormat,
        pixels: &'a [u8],
        pitch: usize,
    ) -> Result<Self, BoundsCheckError> {
        bounds_check(format, width, height, pitch, pixels.len())?;

        Ok(Self {
            format,
            width,
            height,
            pitch,
            pixels,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }
}

/// Mutable view of RGB pixels in a borrowed buffer
#[derive(Debug)]
pub struct SurfaceMut<'a> {
    pub(crate) format: PixelFormat,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pitch: usize,
    pub(crate) pixels: &'a mut [u8],
}

impl<'a> SurfaceMut<'a> {
    pub fn from_buffer(
        width: usize,
        height: usize,
        format: PixelFormat,
        pixels: &'a mut [u8],
        pitch: usize,
    ) -> Result<Self, BoundsCheckError> {
        bounds_check(format, width, height, pitch, pixels.len())?;

        Ok(Self {
            format,
            width,
            height,
            pitch,
            pixels,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut *self.pixels
    }

    /// Split into the underlying buffer, releasing the view
    pub fn into_pixels(self) -> &'a mut [u8] {
        self.pixels
    }
}
