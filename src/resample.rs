use crate::{PixelFormat, Rect, SurfaceMut, SurfaceRef};

/// Filter used when a blit has to scale
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    #[default]
    Nearest,
    Linear,
}

/// Everything that can go wrong in a [`Resampler`]
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("source is {src:?} but destination is {dst:?}")]
    DifferentFormats { src: PixelFormat, dst: PixelFormat },

    #[error("cannot resample {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("rect {rect:?} is out of the {width}x{height} surface's bounds")]
    RectOutOfBounds {
        rect: Rect,
        width: usize,
        height: usize,
    },

    #[error("{width}x{height} exceeds the resampler's maximum dimensions")]
    DimensionsTooLarge { width: usize, height: usize },

    #[cfg(feature = "resize")]
    #[error(transparent)]
    Buffer(#[from] fir::ImageBufferError),

    #[cfg(feature = "resize")]
    #[error(transparent)]
    Resize(#[from] fir::ResizeError),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Stretch blit between two surfaces of the same pixel format
pub trait Resampler {
    /// Scale `src_rect` of `src` into `dst_rect` of `dst`
    ///
    /// A `dst_rect` of `None` covers all of `dst`.
    fn stretch(
        &mut self,
        src: SurfaceRef<'_>,
        src_rect: Rect,
        dst: SurfaceMut<'_>,
        dst_rect: Option<Rect>,
        mode: ScaleMode,
    ) -> Result<(), ResampleError>;
}

impl<T: Resampler + ?Sized> Resampler for &mut T {
    fn stretch(
        &mut self,
        src: SurfaceRef<'_>,
        src_rect: Rect,
        dst: SurfaceMut<'_>,
        dst_rect: Option<Rect>,
        mode: ScaleMode,
    ) -> Result<(), ResampleError> {
        (**self).stretch(src, src_rect, dst, dst_rect, mode)
    }
}

#[cfg(feature = "resize")]
fn check_rect(rect: Rect, width: usize, height: usize) -> Result<(), ResampleError> {
    if rect.is_empty() || !rect.fits_within(width, height) {
        return Err(ResampleError::RectOutOfBounds {
            rect,
            width,
            height,
        });
    }

    Ok(())
}

/// [`Resampler`] backed by [`fast_image_resize`](fir)
///
/// Reuses its intermediate buffers across calls.
#[cfg(feature = "resize")]
pub struct FirResampler {
    fir: fir::Resizer,
    packed_src: Vec<u8>,
    packed_dst: Vec<u8>,
}

#[cfg(feature = "resize")]
impl FirResampler {
    pub fn new() -> Self {
        Self {
            fir: fir::Resizer::new(),
            packed_src: Vec::new(),
            packed_dst: Vec::new(),
        }
    }
}

#[cfg(feature = "resize")]
impl Default for FirResampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "resize")]
impl Resampler for FirResampler {
    fn stretch(
        &mut self,
        src: SurfaceRef<'_>,
        src_rect: Rect,
        dst: SurfaceMut<'_>,
        dst_rect: Option<Rect>,
        mode: ScaleMode,
    ) -> Result<(), ResampleError> {
        if src.format != dst.format {
            return Err(ResampleError::DifferentFormats {
                src: src.format,
                dst: dst.format,
            });
        }

        let desc = src
            .format
            .rgb_desc()
            .map_err(|_| ResampleError::UnsupportedFormat(src.format))?;
        let bpp = desc.bytes_per_pixel;

        let dst_rect = dst_rect.unwrap_or(Rect::full(dst.width, dst.height));

        check_rect(src_rect, src.width, src.height)?;
        check_rect(dst_rect, dst.width, dst.height)?;

        // fir only understands tightly packed rows
        let src_row = src.width * bpp;
        let src_pixels = if src.pitch == src_row {
            &src.pixels[..src_row * src.height]
        } else {
            pack_rows(
                &mut self.packed_src,
                src.pixels,
                src.pitch,
                src_row,
                src.height,
            );
            &self.packed_src[..]
        };

        let (src_width, src_height) = fir_dimensions(src.width, src.height)?;
        let src_view =
            fir::images::ImageRef::new(src_width, src_height, src_pixels, desc.pixel_type)?;

        let dst_row = dst_rect.width * bpp;
        self.packed_dst.clear();
        self.packed_dst.resize(dst_row * dst_rect.height, 0);

        let (dst_width, dst_height) = fir_dimensions(dst_rect.width, dst_rect.height)?;
        let mut dst_view = fir::images::Image::from_slice_u8(
            dst_width,
            dst_height,
            &mut self.packed_dst[..],
            desc.pixel_type,
        )?;

        let alg = match mode {
            ScaleMode::Nearest => fir::ResizeAlg::Nearest,
            ScaleMode::Linear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
        };

        let options = fir::ResizeOptions::new()
            .resize_alg(alg)
            .crop(
                src_rect.x as f64,
                src_rect.y as f64,
                src_rect.width as f64,
                src_rect.height as f64,
            );

        self.fir.resize(&src_view, &mut dst_view, &options)?;

        let column = dst_rect.x * bpp;

        for (dst_line, packed_line) in dst
            .pixels
            .chunks_mut(dst.pitch)
            .skip(dst_rect.y)
            .zip(self.packed_dst.chunks_exact(dst_row))
        {
            dst_line[column..column + dst_row].copy_from_slice(packed_line);
        }

        Ok(())
    }
}

/// fir addresses pixels with `u32`
#[cfg(feature = "resize")]
fn fir_dimensions(width: usize, height: usize) -> Result<(u32, u32), ResampleError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ResampleError::DimensionsTooLarge { width, height }),
    }
}

#[cfg(feature = "resize")]
fn pack_rows(out: &mut Vec<u8>, pixels: &[u8], pitch: usize, row: usize, height: usize) {
    out.clear();

    for line in pixels.chunks(pitch).take(height) {
        out.extend_from_slice(&line[..row]);
    }
}
