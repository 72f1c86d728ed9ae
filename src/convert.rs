use crate::{
    ColorInfo, PixelFormat, SurfaceMut,
    color::YuvToRgb,
    plane_decs::{FormatDesc, RgbDesc, Sample},
};

/// Everything that can go wrong in a [`Converter`]
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot convert from {0:?}")]
    UnsupportedSource(PixelFormat),

    #[error("cannot convert to {0:?}")]
    UnsupportedDestination(PixelFormat),

    #[error("source is {src_width}x{src_height} but destination is {dst_width}x{dst_height}")]
    DimensionMismatch {
        src_width: usize,
        src_height: usize,
        dst_width: usize,
        dst_height: usize,
    },

    #[error("expected {expected} source planes, got {got}")]
    InvalidNumberOfPlanes { expected: usize, got: usize },

    #[error("source plane {plane} is too small, expected at least {minimum} bytes, got {got}")]
    InvalidPlaneSize {
        plane: usize,
        minimum: usize,
        got: usize,
    },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Maximum number of planes of a YUV image
pub(crate) const MAX_PLANES: usize = 3;

const NO_PLANE: (&[u8], usize) = (&[], 0);

/// Borrowed YUV image handed to a [`Converter`]
#[derive(Debug, Clone, Copy)]
pub struct YuvSource<'a> {
    pub format: PixelFormat,
    pub color: ColorInfo,
    pub width: usize,
    pub height: usize,

    planes: [(&'a [u8], usize); MAX_PLANES],
    plane_count: usize,
}

impl<'a> YuvSource<'a> {
    /// Wrap up to three planes, each paired with its pitch, in buffer order
    pub fn new(
        format: PixelFormat,
        color: ColorInfo,
        width: usize,
        height: usize,
        planes: &[(&'a [u8], usize)],
    ) -> Result<Self, ConvertError> {
        if planes.len() > MAX_PLANES {
            return Err(ConvertError::InvalidNumberOfPlanes {
                expected: MAX_PLANES,
                got: planes.len(),
            });
        }

        let mut array = [NO_PLANE; MAX_PLANES];
        array[..planes.len()].copy_from_slice(planes);

        Ok(Self::from_array(format, color, width, height, array, planes.len()))
    }

    pub(crate) fn from_array(
        format: PixelFormat,
        color: ColorInfo,
        width: usize,
        height: usize,
        planes: [(&'a [u8], usize); MAX_PLANES],
        plane_count: usize,
    ) -> Self {
        Self {
            format,
            color,
            width,
            height,
            planes,
            plane_count,
        }
    }

    /// Every plane in buffer order, paired with its pitch
    pub fn planes(&self) -> &[(&'a [u8], usize)] {
        &self.planes[..self.plane_count]
    }
}

/// Pixel format and color space conversion from a full YUV frame into an RGB surface of the
/// same size
///
/// Output is gamma encoded sRGB.
pub trait Converter {
    fn convert(&mut self, src: &YuvSource<'_>, dst: SurfaceMut<'_>) -> Result<(), ConvertError>;
}

impl<T: Converter + ?Sized> Converter for &mut T {
    fn convert(&mut self, src: &YuvSource<'_>, dst: SurfaceMut<'_>) -> Result<(), ConvertError> {
        (**self).convert(src, dst)
    }
}

/// Scalar [`Converter`] for every YUV texture format into every packed RGB format
///
/// Chroma is upsampled by repetition. With the `multi-thread` feature rows are spread across the
/// rayon thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareConverter;

impl SoftwareConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for SoftwareConverter {
    fn convert(&mut self, src: &YuvSource<'_>, dst: SurfaceMut<'_>) -> Result<(), ConvertError> {
        let desc = src
            .format
            .yuv_desc()
            .map_err(|_| ConvertError::UnsupportedSource(src.format))?;
        let rgb = dst
            .format
            .rgb_desc()
            .map_err(|_| ConvertError::UnsupportedDestination(dst.format))?;

        if src.width != dst.width || src.height != dst.height {
            return Err(ConvertError::DimensionMismatch {
                src_width: src.width,
                src_height: src.height,
                dst_width: dst.width,
                dst_height: dst.height,
            });
        }

        bounds_check(desc, src)?;

        let rows = RowConverter {
            desc,
            rgb,
            yuv_to_rgb: YuvToRgb::new(src.color),
            src,
        };

        let width = dst.width;
        let height = dst.height;
        let pitch = dst.pitch;

        #[cfg(feature = "multi-thread")]
        if height > 1 && num_cpus::get() > 1 {
            use rayon::prelude::*;

            dst.pixels
                .par_chunks_mut(pitch)
                .take(height)
                .enumerate()
                .for_each(|(y, row)| rows.convert_row(y, width, row));

            return Ok(());
        }

        dst.pixels
            .chunks_mut(pitch)
            .take(height)
            .enumerate()
            .for_each(|(y, row)| rows.convert_row(y, width, row));

        Ok(())
    }
}

/// Verify every sample the conversion will read is inside its plane
#[deny(clippy::arithmetic_side_effects)]
fn bounds_check(desc: &FormatDesc, src: &YuvSource<'_>) -> Result<(), ConvertError> {
    let planes = src.planes();

    if planes.len() != desc.planes.len() {
        return Err(ConvertError::InvalidNumberOfPlanes {
            expected: desc.planes.len(),
            got: planes.len(),
        });
    }

    for sample in &desc.samples {
        let (plane, pitch) = planes[sample.plane];

        let minimum = sample_index(
            sample,
            pitch,
            src.width.saturating_sub(1),
            src.height.saturating_sub(1),
        )
        .and_then(|last| last.checked_add(1))
        .unwrap_or(usize::MAX);

        if minimum > plane.len() {
            return Err(ConvertError::InvalidPlaneSize {
                plane: sample.plane,
                minimum,
                got: plane.len(),
            });
        }
    }

    Ok(())
}

#[inline(always)]
fn sample_index(sample: &Sample, pitch: usize, x: usize, y: usize) -> Option<usize> {
    (y >> sample.y_shift)
        .checked_mul(pitch)?
        .checked_add((x >> sample.x_shift).checked_mul(sample.step)?)?
        .checked_add(sample.offset)
}

struct RowConverter<'s, 'a> {
    desc: &'static FormatDesc,
    rgb: &'static RgbDesc,
    yuv_to_rgb: YuvToRgb,
    src: &'s YuvSource<'a>,
}

impl RowConverter<'_, '_> {
    fn convert_row(&self, y: usize, width: usize, row: &mut [u8]) {
        let [y_sample, u_sample, v_sample] = &self.desc.samples;

        let planes = self.src.planes();

        let (y_plane, y_pitch) = planes[y_sample.plane];
        let (u_plane, u_pitch) = planes[u_sample.plane];
        let (v_plane, v_pitch) = planes[v_sample.plane];

        // Row bases, every index below stays inside the bounds checked region
        let y_row = (y >> y_sample.y_shift) * y_pitch + y_sample.offset;
        let u_row = (y >> u_sample.y_shift) * u_pitch + u_sample.offset;
        let v_row = (y >> v_sample.y_shift) * v_pitch + v_sample.offset;

        let bpp = self.rgb.bytes_per_pixel;

        for (x, pixel) in row.chunks_exact_mut(bpp).take(width).enumerate() {
            let luma = y_plane[y_row + (x >> y_sample.x_shift) * y_sample.step];
            let cb = u_plane[u_row + (x >> u_sample.x_shift) * u_sample.step];
            let cr = v_plane[v_row + (x >> v_sample.x_shift) * v_sample.step];

            let [r, g, b] = self.yuv_to_rgb.convert(luma, cb, cr);

            pixel[self.rgb.r] = r;
            pixel[self.rgb.g] = g;
            pixel[self.rgb.b] = b;

            if let Some(a) = self.rgb.alpha {
                pixel[a] = u8::MAX;
            }
        }
    }
}
