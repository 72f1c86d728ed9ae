use crate::{PixelFormat, TextureError, convert::MAX_PLANES, plane_decs::PlaneDesc};

/// Pitch and position of a single plane inside a texture's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneGeometry {
    /// Bytes per row
    pub pitch: usize,
    /// Byte offset of the plane's first row
    pub offset: usize,
    /// Total bytes of the plane (`pitch * rows`)
    pub len: usize,
}

impl PlaneGeometry {
    pub fn rows(&self) -> usize {
        self.len.checked_div(self.pitch).unwrap_or(0)
    }

    pub(crate) fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Layout of all planes of a YUV image inside one contiguous buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    planes: [PlaneGeometry; MAX_PLANES],
    len: usize,
}

impl PlaneLayout {
    /// The planes in buffer order
    pub fn planes(&self) -> &[PlaneGeometry] {
        &self.planes[..self.len]
    }

    /// Geometry of plane 0, the full resolution luma or packed plane
    pub fn primary(&self) -> PlaneGeometry {
        self.planes[0]
    }

    /// Size of the buffer required to hold every plane
    pub fn total_size(&self) -> usize {
        self.planes()
            .last()
            .map(|plane| plane.offset + plane.len)
            .unwrap_or(0)
    }
}

/// Calculate the plane layout of a `width` x `height` texture of `format`
///
/// Planes are stored back to back without padding: luma (or the packed plane) first, then the
/// chroma plane(s) in the format's own order.
#[deny(clippy::arithmetic_side_effects)]
pub fn layout(
    format: PixelFormat,
    width: usize,
    height: usize,
) -> Result<PlaneLayout, TextureError> {
    let desc = format.yuv_desc()?;

    if width == 0 || height == 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    layout_planes(desc.planes, width, height)
        .ok_or(TextureError::SizeOverflow { width, height })
}

#[deny(clippy::arithmetic_side_effects)]
fn layout_planes(descs: &[PlaneDesc], width: usize, height: usize) -> Option<PlaneLayout> {
    let empty = PlaneGeometry {
        pitch: 0,
        offset: 0,
        len: 0,
    };

    let mut planes = [empty; MAX_PLANES];
    let mut offset = 0usize;

    for (desc, out) in descs.iter().zip(planes.iter_mut()) {
        let pitch = desc.row_bytes(width)?;
        let len = pitch.checked_mul(desc.rows(height))?;

        *out = PlaneGeometry { pitch, offset, len };

        offset = offset.checked_add(len)?;
    }

    Some(PlaneLayout {
        planes,
        len: descs.len(),
    })
}

/// Split `buf` into the planes described by `layout`, paired with their pitch
///
/// Entries past `layout.planes().len()` are empty.
pub(crate) fn split_planes<'a>(
    layout: &PlaneLayout,
    buf: &'a [u8],
) -> [(&'a [u8], usize); MAX_PLANES] {
    let mut planes: [(&[u8], usize); MAX_PLANES] = [(&[], 0); MAX_PLANES];

    for (out, plane) in planes.iter_mut().zip(layout.planes()) {
        *out = (&buf[plane.range()], plane.pitch);
    }

    planes
}
