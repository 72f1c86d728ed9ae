//! Software YUV textures
//!
//! A [`YuvTexture`] owns every plane of a planar (`YV12`, `IYUV`), semi-planar (`NV12`, `NV21`)
//! or packed 4:2:2 (`YUY2`, `UYVY`, `YVYU`) image in one aligned buffer, accepts full frame and
//! sub-rectangle uploads and is presented into RGB buffers through a [`Blitter`].

pub use color::{ColorInfo, ColorSpace};
pub use convert::{ConvertError, Converter, SoftwareConverter, YuvSource};
pub use pixel_format::{PixelFormat, UnsupportedFormatError};
pub use planes::{PlaneGeometry, PlaneLayout, layout};
pub use present::{Blitter, Output};
#[cfg(feature = "resize")]
pub use resample::FirResampler;
pub use resample::{ResampleError, Resampler, ScaleMode};
pub use surface::{BoundsCheckError, Surface, SurfaceError, SurfaceMut, SurfaceRef};
pub use texture::{PlaneView, PlaneViewMut, TextureError, YuvTexture};
pub use util::SIMD_ALIGNMENT;

mod color;
mod convert;
mod pixel_format;
mod plane_decs;
mod planes;
mod present;
mod resample;
mod surface;
mod texture;
mod util;

/// Rectangle in luma pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect covering a whole `width` x `height` image
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn is_full(&self, width: usize, height: usize) -> bool {
        *self == Self::full(width, height)
    }

    /// Returns if the rect lies inside `[0, width) x [0, height)`
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);

        matches!((right, bottom), (Some(r), Some(b)) if r <= width && b <= height)
    }
}
