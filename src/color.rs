/// YUV matrix coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// YUV Rec. ITU-R BT.601-7 625
    BT601,

    /// YUV Rec. ITU-R BT.709-6
    BT709,

    /// YUV Rec. ITU-R BT.2020-2
    BT2020,
}

/// Color description of a YUV texture's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorInfo {
    pub space: ColorSpace,

    /// If the image uses either full or standard range
    ///
    /// - full range (0 - 255)
    /// - standard range Y (16 - 235), U & V (16 - 240)
    pub full_range: bool,
}

impl ColorInfo {
    pub const BT601_LIMITED: Self = Self {
        space: ColorSpace::BT601,
        full_range: false,
    };

    pub const BT709_LIMITED: Self = Self {
        space: ColorSpace::BT709,
        full_range: false,
    };

    pub const BT601_FULL: Self = Self {
        space: ColorSpace::BT601,
        full_range: true,
    };
}

pub(crate) mod mat_idxs {
    pub(crate) const Y: usize = 0;
    pub(crate) const U: usize = 1;
    pub(crate) const V: usize = 2;

    pub(crate) const R: usize = 0;
    pub(crate) const G: usize = 1;
    pub(crate) const B: usize = 2;
}

#[rustfmt::skip]
macro_rules! make_matrices {
    ($($yuv_to_rgb:ident: $kr:expr, $kb:expr;)*) => {
        $(
        pub(crate) const $yuv_to_rgb: [[f32; 3]; 3] = {
            let kg = 1.0 - $kr - $kb;

            [
                // R                 G                                 B
                [1.0,                1.0,                              1.0            ], // Y
                [0.0,               (-($kb / kg)) * (2.0 - 2.0 * $kb), 2.0 - 2.0 * $kb], // U
                [(2.0 - 2.0 * $kr), (-($kr / kg)) * (2.0 - 2.0 * $kr), 0.0            ], // V
            ]
        };
        )*
    };
}

make_matrices! {
    BT601_YUV_TO_RGB: 0.299, 0.114;
    BT709_YUV_TO_RGB: 0.2126, 0.0722;
    BT2020_YUV_TO_RGB: 0.2627, 0.0593;
}

/// Converts 8 bit YUV triples into 8 bit gamma encoded RGB
#[derive(Debug, Clone, Copy)]
pub(crate) struct YuvToRgb {
    mat: &'static [[f32; 3]; 3],
    y_offset: f32,
    y_scale: f32,
    uv_scale: f32,
}

impl YuvToRgb {
    pub(crate) fn new(color: ColorInfo) -> Self {
        let mat = match color.space {
            ColorSpace::BT601 => &BT601_YUV_TO_RGB,
            ColorSpace::BT709 => &BT709_YUV_TO_RGB,
            ColorSpace::BT2020 => &BT2020_YUV_TO_RGB,
        };

        let (y_offset, y_range, uv_range) = if color.full_range {
            (0.0, 255.0, 255.0)
        } else {
            (16.0, 219.0, 224.0)
        };

        Self {
            mat,
            y_offset,
            y_scale: 1.0 / y_range,
            uv_scale: 1.0 / uv_range,
        }
    }

    #[inline(always)]
    pub(crate) fn convert(&self, y: u8, u: u8, v: u8) -> [u8; 3] {
        use mat_idxs::*;

        let mat = self.mat;

        // Convert to analog 0..=1.0 luma and -0.5..=0.5 chroma
        let y = (f32::from(y) - self.y_offset) * self.y_scale;
        let u = (f32::from(u) - 128.0) * self.uv_scale;
        let v = (f32::from(v) - 128.0) * self.uv_scale;

        let r = y * mat[Y][R] + v * mat[V][R];
        let g = y * mat[Y][G] + v * mat[V][G] + u * mat[U][G];
        let b = y * mat[Y][B] + u * mat[U][B];

        [quantize(r), quantize(g), quantize(b)]
    }
}

#[inline(always)]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
