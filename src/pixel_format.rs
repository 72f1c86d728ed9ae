use crate::plane_decs::*;

/// Pixel format tags
///
/// Only a subset is supported as software texture storage (see
/// [`PixelFormat::is_texture_format`]), and only the packed RGB formats can be presented to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PixelFormat {
    /// Y, V and U planes, 4:2:0 sub sampling
    YV12,

    /// Y, U and V planes, 4:2:0 sub sampling
    IYUV,

    /// Single Y0 U Y1 V interleaved plane, 4:2:2 sub sampling
    YUY2,

    /// Single U Y0 V Y1 interleaved plane, 4:2:2 sub sampling
    UYVY,

    /// Single Y0 V Y1 U interleaved plane, 4:2:2 sub sampling
    YVYU,

    /// Y and interleaved UV planes, 4:2:0 sub sampling
    NV12,

    /// Y and interleaved VU planes, 4:2:0 sub sampling
    NV21,

    /// Y, U and V planes, 4:2:2 sub sampling
    ///
    /// Recognized but never stored, creating a texture with it fails with
    /// [`UnsupportedFormatError`].
    I422,

    /// Y and interleaved UV planes, 4:2:0 sub sampling, 10 bits per sample
    ///
    /// Recognized but never stored, creating a texture with it fails with
    /// [`UnsupportedFormatError`].
    P010,

    /// Single RGB interleaved plane
    RGB,

    /// Single BGR interleaved plane
    BGR,

    /// Single RGBA interleaved plane
    RGBA,

    /// Single BGRA interleaved plane
    BGRA,
}

/// The format cannot be used for the requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported pixel format {0:?}")]
pub struct UnsupportedFormatError(pub PixelFormat);

impl PixelFormat {
    /// Returns if the format can be stored in a [`YuvTexture`](crate::YuvTexture)
    pub fn is_texture_format(self) -> bool {
        self.yuv_desc().is_ok()
    }

    /// Returns if the format can be used as a present target or [`Surface`](crate::Surface) format
    pub fn is_rgb(self) -> bool {
        self.rgb_desc().is_ok()
    }

    /// Bytes per pixel of the packed RGB formats
    pub fn bytes_per_pixel(self) -> Result<usize, UnsupportedFormatError> {
        self.rgb_desc().map(|desc| desc.bytes_per_pixel)
    }

    pub(crate) fn yuv_desc(self) -> Result<&'static FormatDesc, UnsupportedFormatError> {
        use PixelFormat::*;

        match self {
            YV12 => Ok(&YV12_DESC),
            IYUV => Ok(&IYUV_DESC),
            YUY2 => Ok(&YUY2_DESC),
            UYVY => Ok(&UYVY_DESC),
            YVYU => Ok(&YVYU_DESC),
            NV12 => Ok(&NV12_DESC),
            NV21 => Ok(&NV21_DESC),
            I422 | P010 | RGB | BGR | RGBA | BGRA => Err(UnsupportedFormatError(self)),
        }
    }

    pub(crate) fn rgb_desc(self) -> Result<&'static RgbDesc, UnsupportedFormatError> {
        use PixelFormat::*;

        match self {
            RGB => Ok(&RGB_DESC),
            BGR => Ok(&BGR_DESC),
            RGBA => Ok(&RGBA_DESC),
            BGRA => Ok(&BGRA_DESC),
            YV12 | IYUV | YUY2 | UYVY | YVYU | NV12 | NV21 | I422 | P010 => {
                Err(UnsupportedFormatError(self))
            }
        }
    }

    pub fn variants() -> impl IntoIterator<Item = Self> {
        use PixelFormat::*;

        [
            YV12, IYUV, YUY2, UYVY, YVYU, NV12, NV21, I422, P010, RGB, BGR, RGBA, BGRA,
        ]
    }

    /// All formats a [`YuvTexture`](crate::YuvTexture) can be created with
    pub fn texture_formats() -> impl IntoIterator<Item = Self> {
        Self::variants()
            .into_iter()
            .filter(|format| format.is_texture_format())
    }
}
