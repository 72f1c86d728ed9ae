//! Per format tables: plane geometry, sample locations and RGB channel order.
//!
//! Every piece of format specific arithmetic lives here, the texture store, the converter and the
//! blit driver only ever interpret these records.

#[cfg(feature = "resize")]
use fir::PixelType::*;

/// How the planes of a format are arranged, decides which upload paths are valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    /// Y, U and V in separate planes
    Planar,
    /// Y plane followed by an interleaved chroma plane
    SemiPlanar,
    /// Single interleaved plane
    Packed,
}

impl Family {
    /// Sub sampled multi plane formats can only be locked as a whole
    pub(crate) fn full_surface_lock_only(self) -> bool {
        matches!(self, Family::Planar | Family::SemiPlanar)
    }
}

/// Description of a single plane in relation to the luma dimensions
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlaneDesc {
    pub(crate) width_op: Op,
    pub(crate) height_op: Op,

    /// Bytes per addressable sample: 1 for Y/U/V, 2 for a UV pair, 4 for a packed macro pixel
    pub(crate) bytes_per_sample: usize,
}

impl PlaneDesc {
    /// Number of bytes a row of `width` luma pixels occupies in this plane
    pub(crate) fn row_bytes(&self, width: usize) -> Option<usize> {
        self.width_op
            .extent(width)
            .checked_mul(self.bytes_per_sample)
    }

    /// Number of rows `height` luma rows occupy in this plane
    pub(crate) fn rows(&self, height: usize) -> usize {
        self.height_op.extent(height)
    }

    /// Byte column and row where luma position (`x`, `y`) starts in this plane
    pub(crate) fn origin(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        let column = self.width_op.origin(x).checked_mul(self.bytes_per_sample)?;

        Some((column, self.height_op.origin(y)))
    }
}

/// Plane's number of samples in relation to width / height
///
/// Sub sampled positions are rounded down and sub sampled lengths are rounded up, so an odd
/// sized rectangle always covers the chroma sample of its last pixel.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Op {
    Identity,
    Half,
}

impl Op {
    pub(crate) fn extent(self, len: usize) -> usize {
        match self {
            Op::Identity => len,
            Op::Half => len.div_ceil(2),
        }
    }

    pub(crate) fn origin(self, pos: usize) -> usize {
        match self {
            Op::Identity => pos,
            Op::Half => pos / 2,
        }
    }
}

/// Location of a single component's byte for luma position (x, y):
///
/// `planes[plane][(y >> y_shift) * pitch + (x >> x_shift) * step + offset]`
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sample {
    pub(crate) plane: usize,
    pub(crate) x_shift: u32,
    pub(crate) y_shift: u32,
    pub(crate) step: usize,
    pub(crate) offset: usize,
}

impl Sample {
    pub(crate) const fn new(
        plane: usize,
        x_shift: u32,
        y_shift: u32,
        step: usize,
        offset: usize,
    ) -> Self {
        Self {
            plane,
            x_shift,
            y_shift,
            step,
            offset,
        }
    }
}

pub(crate) mod sample_idxs {
    pub(crate) const Y: usize = 0;
    pub(crate) const U: usize = 1;
    pub(crate) const V: usize = 2;
}

/// Dispatch record of a YUV texture format
#[derive(Debug)]
pub(crate) struct FormatDesc {
    pub(crate) family: Family,
    pub(crate) planes: &'static [PlaneDesc],
    /// Y, U and V locations, indexed with [`sample_idxs`]
    pub(crate) samples: [Sample; 3],
}

const LUMA_PLANE: PlaneDesc = PlaneDesc {
    width_op: Op::Identity,
    height_op: Op::Identity,
    bytes_per_sample: 1,
};

const CHROMA_420_PLANE: PlaneDesc = PlaneDesc {
    width_op: Op::Half,
    height_op: Op::Half,
    bytes_per_sample: 1,
};

const CHROMA_420_PAIR_PLANE: PlaneDesc = PlaneDesc {
    width_op: Op::Half,
    height_op: Op::Half,
    bytes_per_sample: 2,
};

const PACKED_422_PLANE: PlaneDesc = PlaneDesc {
    width_op: Op::Half,
    height_op: Op::Identity,
    bytes_per_sample: 4,
};

pub(crate) const PLANAR_420_PLANES: [PlaneDesc; 3] =
    [LUMA_PLANE, CHROMA_420_PLANE, CHROMA_420_PLANE];

pub(crate) const SEMI_PLANAR_420_PLANES: [PlaneDesc; 2] = [LUMA_PLANE, CHROMA_420_PAIR_PLANE];

pub(crate) const PACKED_422_PLANES: [PlaneDesc; 1] = [PACKED_422_PLANE];

pub(crate) const YV12_DESC: FormatDesc = FormatDesc {
    family: Family::Planar,
    planes: &PLANAR_420_PLANES,
    samples: [
        Sample::new(0, 0, 0, 1, 0),
        Sample::new(2, 1, 1, 1, 0),
        Sample::new(1, 1, 1, 1, 0),
    ],
};

pub(crate) const IYUV_DESC: FormatDesc = FormatDesc {
    family: Family::Planar,
    planes: &PLANAR_420_PLANES,
    samples: [
        Sample::new(0, 0, 0, 1, 0),
        Sample::new(1, 1, 1, 1, 0),
        Sample::new(2, 1, 1, 1, 0),
    ],
};

pub(crate) const NV12_DESC: FormatDesc = FormatDesc {
    family: Family::SemiPlanar,
    planes: &SEMI_PLANAR_420_PLANES,
    samples: [
        Sample::new(0, 0, 0, 1, 0),
        Sample::new(1, 1, 1, 2, 0),
        Sample::new(1, 1, 1, 2, 1),
    ],
};

pub(crate) const NV21_DESC: FormatDesc = FormatDesc {
    family: Family::SemiPlanar,
    planes: &SEMI_PLANAR_420_PLANES,
    samples: [
        Sample::new(0, 0, 0, 1, 0),
        Sample::new(1, 1, 1, 2, 1),
        Sample::new(1, 1, 1, 2, 0),
    ],
};

// Packed luma sits at x * 2 (+ offset), chroma once per macro pixel at (x / 2) * 4 (+ offset)

pub(crate) const YUY2_DESC: FormatDesc = FormatDesc {
    family: Family::Packed,
    planes: &PACKED_422_PLANES,
    samples: [
        Sample::new(0, 0, 0, 2, 0),
        Sample::new(0, 1, 0, 4, 1),
        Sample::new(0, 1, 0, 4, 3),
    ],
};

pub(crate) const UYVY_DESC: FormatDesc = FormatDesc {
    family: Family::Packed,
    planes: &PACKED_422_PLANES,
    samples: [
        Sample::new(0, 0, 0, 2, 1),
        Sample::new(0, 1, 0, 4, 0),
        Sample::new(0, 1, 0, 4, 2),
    ],
};

pub(crate) const YVYU_DESC: FormatDesc = FormatDesc {
    family: Family::Packed,
    planes: &PACKED_422_PLANES,
    samples: [
        Sample::new(0, 0, 0, 2, 0),
        Sample::new(0, 1, 0, 4, 3),
        Sample::new(0, 1, 0, 4, 1),
    ],
};

/// Channel layout of a packed 8 bit RGB format
#[derive(Debug)]
pub(crate) struct RgbDesc {
    pub(crate) bytes_per_pixel: usize,
    pub(crate) r: usize,
    pub(crate) g: usize,
    pub(crate) b: usize,
    /// Opaque alpha byte written by conversions
    pub(crate) alpha: Option<usize>,

    #[cfg(feature = "resize")]
    pub(crate) pixel_type: fir::PixelType,
}

pub(crate) const RGB_DESC: RgbDesc = RgbDesc {
    bytes_per_pixel: 3,
    r: 0,
    g: 1,
    b: 2,
    alpha: None,
    #[cfg(feature = "resize")]
    pixel_type: U8x3,
};

pub(crate) const BGR_DESC: RgbDesc = RgbDesc {
    bytes_per_pixel: 3,
    r: 2,
    g: 1,
    b: 0,
    alpha: None,
    #[cfg(feature = "resize")]
    pixel_type: U8x3,
};

pub(crate) const RGBA_DESC: RgbDesc = RgbDesc {
    bytes_per_pixel: 4,
    r: 0,
    g: 1,
    b: 2,
    alpha: Some(3),
    #[cfg(feature = "resize")]
    pixel_type: U8x4,
};

pub(crate) const BGRA_DESC: RgbDesc = RgbDesc {
    bytes_per_pixel: 4,
    r: 2,
    g: 1,
    b: 0,
    alpha: Some(3),
    #[cfg(feature = "resize")]
    pixel_type: U8x4,
};
