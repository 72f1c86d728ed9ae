use crate::{
    BoundsCheckError, ColorInfo, ConvertError, PixelFormat, PlaneLayout, Rect, ResampleError,
    SurfaceError, UnsupportedFormatError, YuvSource, layout,
    plane_decs::{Family, FormatDesc, sample_idxs},
    planes::split_planes,
    present::PresentCache,
    util::AlignedBuf,
};

/// Everything that can go wrong with a [`YuvTexture`]
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    #[error("width and height must not be zero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("size of a {width}x{height} texture overflows")]
    SizeOverflow { width: usize, height: usize },

    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    #[error("region {rect:?} is empty or not inside the {width}x{height} texture")]
    InvalidRegion {
        rect: Rect,
        width: usize,
        height: usize,
    },

    #[error("{0:?} textures only support full surface locks")]
    PartialLock(PixelFormat),

    #[error("{format:?} textures cannot be updated from {planes} separate planes")]
    IncompatibleUpload { format: PixelFormat, planes: usize },

    #[error("invalid pitch at plane {plane}, expected it to be at least {minimum}, but got {got}")]
    InvalidStride {
        plane: usize,
        minimum: usize,
        got: usize,
    },

    #[error(
        "invalid plane size at plane {plane}, expected it to be at least {minimum}, but got {got}"
    )]
    InvalidPlaneSize {
        plane: usize,
        minimum: usize,
        got: usize,
    },

    #[error("invalid output buffer: {0}")]
    Output(#[from] BoundsCheckError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Conversion(#[from] ConvertError),

    #[error(transparent)]
    Resample(#[from] ResampleError),
}

/// Borrowed view into a texture's buffer, valid as long as the texture is borrowed
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    pub pixels: &'a [u8],
    pub pitch: usize,
}

/// Mutable borrowed view into a texture's buffer
///
/// Dropping the view is the unlock.
#[derive(Debug)]
pub struct PlaneViewMut<'a> {
    pub pixels: &'a mut [u8],
    pub pitch: usize,
}

/// Software YUV texture
///
/// Owns all planes of the image in a single [`SIMD_ALIGNMENT`](crate::SIMD_ALIGNMENT) aligned
/// buffer laid out as described by [`layout`], plus the cached surfaces used by
/// [`Blitter::present`](crate::Blitter::present). Everything is released on drop.
#[derive(Debug)]
pub struct YuvTexture {
    format: PixelFormat,
    color: ColorInfo,
    width: usize,
    height: usize,

    desc: &'static FormatDesc,
    layout: PlaneLayout,
    pixels: AlignedBuf,

    cache: PresentCache,
}

/// A validated row by row copy of one plane
struct PlaneCopy<'a> {
    src: &'a [u8],
    src_pitch: usize,
    dst_start: usize,
    dst_pitch: usize,
    rows: usize,
    row_bytes: usize,
}

impl YuvTexture {
    /// Create a zeroed `width` x `height` texture
    pub fn new(
        format: PixelFormat,
        color: ColorInfo,
        width: usize,
        height: usize,
    ) -> Result<Self, TextureError> {
        let desc = format.yuv_desc()?;
        let layout = layout(format, width, height)?;

        let pixels = AlignedBuf::zeroed(layout.total_size())
            .map_err(|e| TextureError::Allocation { bytes: e.bytes })?;

        tracing::debug!(
            ?format,
            width,
            height,
            bytes = pixels.len(),
            "created software YUV texture"
        );

        Ok(Self {
            format,
            color,
            width,
            height,
            desc,
            layout,
            pixels,
            cache: PresentCache::default(),
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn color(&self) -> ColorInfo {
        self.color
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    /// The whole buffer, every plane in layout order
    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_slice()
    }

    /// Every plane paired with its pitch
    pub fn planes(&self) -> Vec<(&[u8], usize)> {
        let planes = split_planes(&self.layout, self.pixels.as_slice());

        planes[..self.layout.planes().len()].to_vec()
    }

    /// Plane 0 (luma, or the packed plane) and its pitch
    pub fn primary_plane(&self) -> PlaneView<'_> {
        let primary = self.layout.primary();

        PlaneView {
            pixels: &self.pixels.as_slice()[primary.range()],
            pitch: primary.pitch,
        }
    }

    /// Plane 0 for direct writes, e.g. a decoder writing luma in place
    pub fn primary_plane_mut(&mut self) -> PlaneViewMut<'_> {
        let primary = self.layout.primary();

        PlaneViewMut {
            pixels: &mut self.pixels.as_mut_slice()[primary.range()],
            pitch: primary.pitch,
        }
    }

    /// Lock the texture for direct writes
    ///
    /// Planar and semi-planar formats can only be locked as a whole and return a view over the
    /// entire buffer. Packed formats can be locked at any `rect`, the view then starts at the
    /// rect's first macro pixel.
    pub fn lock(&mut self, rect: Option<Rect>) -> Result<PlaneViewMut<'_>, TextureError> {
        let primary = self.layout.primary();

        let start = match rect {
            None => 0,
            Some(rect) => {
                self.check_region(rect)?;

                if self.desc.family.full_surface_lock_only()
                    && !rect.is_full(self.width, self.height)
                {
                    return Err(TextureError::PartialLock(self.format));
                }

                let (column, row) = self.desc.planes[0]
                    .origin(rect.x, rect.y)
                    .ok_or_else(|| self.size_overflow())?;

                row * primary.pitch + column
            }
        };

        Ok(PlaneViewMut {
            pixels: &mut self.pixels.as_mut_slice()[start..],
            pitch: primary.pitch,
        })
    }

    /// Update `rect` from a single buffer holding all planes in the texture's plane order
    ///
    /// Plane 0 uses `pitch`, chroma planes use the pitch derived from it (`ceil(pitch / 2)` for
    /// planar, `2 * ceil(pitch / 2)` for semi-planar formats) and follow the previous plane's
    /// rows directly.
    pub fn update(&mut self, rect: Rect, pixels: &[u8], pitch: usize) -> Result<(), TextureError> {
        self.check_region(rect)?;

        if rect.is_full(self.width, self.height) && pitch == self.layout.primary().pitch {
            let total = self.layout.total_size();

            if pixels.len() < total {
                return Err(TextureError::InvalidPlaneSize {
                    plane: 0,
                    minimum: total,
                    got: pixels.len(),
                });
            }

            tracing::trace!(format = ?self.format, total, "full texture update");

            self.pixels.as_mut_slice().copy_from_slice(&pixels[..total]);

            return Ok(());
        }

        let mut copies = Vec::with_capacity(self.desc.planes.len());
        let mut src_offset = 0usize;

        for (plane, desc) in self.desc.planes.iter().enumerate() {
            let src_pitch = if plane == 0 {
                pitch
            } else {
                desc.row_bytes(pitch).ok_or_else(|| self.size_overflow())?
            };

            let src = pixels.get(src_offset..).unwrap_or_default();

            copies.push(self.plan_copy(rect, plane, src, src_pitch)?);

            src_offset = desc
                .rows(rect.height)
                .checked_mul(src_pitch)
                .and_then(|len| len.checked_add(src_offset))
                .ok_or_else(|| self.size_overflow())?;
        }

        self.apply(&copies);

        Ok(())
    }

    /// Update `rect` of a planar texture from separate Y, U and V planes
    ///
    /// U and V are always passed in that order, independent of the order the texture stores
    /// them in.
    pub fn update_planar(
        &mut self,
        rect: Rect,
        y: (&[u8], usize),
        u: (&[u8], usize),
        v: (&[u8], usize),
    ) -> Result<(), TextureError> {
        use sample_idxs::*;

        if self.desc.family != Family::Planar {
            return Err(TextureError::IncompatibleUpload {
                format: self.format,
                planes: 3,
            });
        }

        self.check_region(rect)?;

        let copies = [
            self.plan_copy(rect, self.desc.samples[Y].plane, y.0, y.1)?,
            self.plan_copy(rect, self.desc.samples[U].plane, u.0, u.1)?,
            self.plan_copy(rect, self.desc.samples[V].plane, v.0, v.1)?,
        ];

        self.apply(&copies);

        Ok(())
    }

    /// Update `rect` of a semi-planar texture from a Y plane and an interleaved chroma plane
    ///
    /// The chroma plane must already be in the texture's order (UV for NV12, VU for NV21).
    pub fn update_semi_planar(
        &mut self,
        rect: Rect,
        y: (&[u8], usize),
        uv: (&[u8], usize),
    ) -> Result<(), TextureError> {
        if self.desc.family != Family::SemiPlanar {
            return Err(TextureError::IncompatibleUpload {
                format: self.format,
                planes: 2,
            });
        }

        self.check_region(rect)?;

        let copies = [
            self.plan_copy(rect, 0, y.0, y.1)?,
            self.plan_copy(rect, 1, uv.0, uv.1)?,
        ];

        self.apply(&copies);

        Ok(())
    }

    pub(crate) fn present_parts(&mut self) -> (YuvSource<'_>, &mut PresentCache) {
        let source = YuvSource::from_array(
            self.format,
            self.color,
            self.width,
            self.height,
            split_planes(&self.layout, self.pixels.as_slice()),
            self.layout.planes().len(),
        );

        (source, &mut self.cache)
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &PresentCache {
        &self.cache
    }

    fn check_region(&self, rect: Rect) -> Result<(), TextureError> {
        if rect.is_empty() || !rect.fits_within(self.width, self.height) {
            return Err(TextureError::InvalidRegion {
                rect,
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }

    fn size_overflow(&self) -> TextureError {
        TextureError::SizeOverflow {
            width: self.width,
            height: self.height,
        }
    }

    /// Validate the copy of `rect` from `src` into `plane`, `rect` must already be checked
    fn plan_copy<'a>(
        &self,
        rect: Rect,
        plane: usize,
        src: &'a [u8],
        src_pitch: usize,
    ) -> Result<PlaneCopy<'a>, TextureError> {
        let geometry = self.layout.planes()[plane];
        let desc = &self.desc.planes[plane];

        let rows = desc.rows(rect.height);
        let row_bytes = desc
            .row_bytes(rect.width)
            .ok_or_else(|| self.size_overflow())?;
        let (column, row) = desc
            .origin(rect.x, rect.y)
            .ok_or_else(|| self.size_overflow())?;

        // Positions round down and lengths round up, a rect inside the texture therefore never
        // leaves its rows
        debug_assert!(column + row_bytes <= geometry.pitch);
        debug_assert!(row + rows <= geometry.rows());

        if rows > 1 && src_pitch < row_bytes {
            return Err(TextureError::InvalidStride {
                plane,
                minimum: row_bytes,
                got: src_pitch,
            });
        }

        let minimum = (rows - 1)
            .checked_mul(src_pitch)
            .and_then(|n| n.checked_add(row_bytes))
            .unwrap_or(usize::MAX);

        if src.len() < minimum {
            return Err(TextureError::InvalidPlaneSize {
                plane,
                minimum,
                got: src.len(),
            });
        }

        Ok(PlaneCopy {
            src,
            src_pitch,
            dst_start: geometry.offset + row * geometry.pitch + column,
            dst_pitch: geometry.pitch,
            rows,
            row_bytes,
        })
    }

    fn apply(&mut self, copies: &[PlaneCopy<'_>]) {
        let dst = self.pixels.as_mut_slice();

        for copy in copies {
            for row in 0..copy.rows {
                let src = row * copy.src_pitch;
                let dst_row = copy.dst_start + row * copy.dst_pitch;

                dst[dst_row..dst_row + copy.row_bytes]
                    .copy_from_slice(&copy.src[src..src + copy.row_bytes]);
            }
        }
    }
}
