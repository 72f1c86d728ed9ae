use image::{Rgba, RgbaImage};
use yuv_texture::{
    Blitter, ColorInfo, ConvertError, Converter, Output, PixelFormat, Rect, ResampleError,
    Resampler, ScaleMode, SoftwareConverter, SurfaceMut, SurfaceRef, TextureError, YuvSource,
    YuvTexture,
};

const COLOR: ColorInfo = ColorInfo::BT601_FULL;

/// Resampler for blitters that must never reach the scratch path
struct NoResample;

impl Resampler for NoResample {
    fn stretch(
        &mut self,
        _: SurfaceRef<'_>,
        _: Rect,
        _: SurfaceMut<'_>,
        _: Option<Rect>,
        _: ScaleMode,
    ) -> Result<(), ResampleError> {
        Err(ResampleError::Other("unexpected stretch".into()))
    }
}

/// Upload a luma image with neutral chroma into a texture of any format
fn upload_luma(texture: &mut YuvTexture, luma: impl Fn(usize, usize) -> u8) {
    let (width, height) = (texture.width(), texture.height());
    let rect = Rect::full(width, height);

    let y: Vec<u8> = (0..height)
        .flat_map(|row| (0..width).map(move |x| (row, x)))
        .map(|(row, x)| luma(x, row))
        .collect();

    let chroma_width = width.div_ceil(2);
    let chroma_height = height.div_ceil(2);

    match texture.format() {
        PixelFormat::IYUV | PixelFormat::YV12 => {
            let uv = vec![128u8; chroma_width * chroma_height];

            texture
                .update_planar(
                    rect,
                    (&y[..], width),
                    (&uv[..], chroma_width),
                    (&uv[..], chroma_width),
                )
                .unwrap();
        }
        PixelFormat::NV12 | PixelFormat::NV21 => {
            let uv = vec![128u8; chroma_width * 2 * chroma_height];

            texture
                .update_semi_planar(rect, (&y[..], width), (&uv[..], chroma_width * 2))
                .unwrap();
        }
        format => {
            let pitch = chroma_width * 4;
            let mut packed = vec![128u8; pitch * height];

            let luma_offset = if format == PixelFormat::UYVY { 1 } else { 0 };

            for (row, line) in packed.chunks_exact_mut(pitch).enumerate() {
                for x in 0..width {
                    line[x * 2 + luma_offset] = y[row * width + x];
                }
            }

            texture.update(rect, &packed, pitch).unwrap();
        }
    }
}

fn present_rgba<C: Converter, R: Resampler>(
    blitter: &mut Blitter<C, R>,
    texture: &mut YuvTexture,
    src_rect: Rect,
    width: usize,
    height: usize,
) -> RgbaImage {
    let mut pixels = vec![0u8; width * height * 4];

    blitter
        .present(
            texture,
            src_rect,
            Output {
                format: PixelFormat::RGBA,
                width,
                height,
                pixels: &mut pixels,
                pitch: width * 4,
            },
        )
        .unwrap();

    RgbaImage::from_raw(width as u32, height as u32, pixels).unwrap()
}

#[test]
fn every_format_presents_the_same_image() {
    let mut blitter = Blitter::new(SoftwareConverter::new(), NoResample);
    let mut reference = None;

    for format in PixelFormat::texture_formats() {
        let mut texture = YuvTexture::new(format, COLOR, 10, 6).unwrap();
        upload_luma(&mut texture, |x, y| (x * 20 + y) as u8);

        let image = present_rgba(&mut blitter, &mut texture, Rect::full(10, 6), 10, 6);

        let gray = Rgba([62, 62, 62, 255]);
        assert_eq!(image.get_pixel(3, 2), &gray, "{format:?}");

        match &reference {
            None => reference = Some(image),
            Some(reference) => assert_eq!(reference, &image, "{format:?}"),
        }
    }
}

#[test]
fn partial_update_only_touches_its_rect() {
    let mut blitter = Blitter::new(SoftwareConverter::new(), NoResample);
    let mut texture = YuvTexture::new(PixelFormat::IYUV, COLOR, 8, 8).unwrap();
    upload_luma(&mut texture, |_, _| 0);

    // 3x3 at odd coordinates, chroma covers 2x2 samples
    texture
        .update_planar(
            Rect::new(3, 3, 3, 3),
            (&[255; 9][..], 3),
            (&[128; 4][..], 2),
            (&[128; 4][..], 2),
        )
        .unwrap();

    let image = present_rgba(&mut blitter, &mut texture, Rect::full(8, 8), 8, 8);

    for (x, y, pixel) in image.enumerate_pixels() {
        let inside = (3..6).contains(&x) && (3..6).contains(&y);
        let expected = if inside { 255 } else { 0 };

        assert_eq!(pixel, &Rgba([expected, expected, expected, 255]), "{x} {y}");
    }
}

#[test]
fn limited_range_black_and_white() {
    let mut blitter = Blitter::new(SoftwareConverter::new(), NoResample);
    let mut texture = YuvTexture::new(PixelFormat::NV21, ColorInfo::BT709_LIMITED, 4, 2).unwrap();
    upload_luma(&mut texture, |x, _| if x < 2 { 16 } else { 235 });

    let image = present_rgba(&mut blitter, &mut texture, Rect::full(4, 2), 4, 2);

    assert_eq!(image.get_pixel(0, 1), &Rgba([0, 0, 0, 255]));
    assert_eq!(image.get_pixel(3, 0), &Rgba([255, 255, 255, 255]));
}

#[test]
fn locked_writes_are_presented() {
    let mut blitter = Blitter::new(SoftwareConverter::new(), NoResample);
    let mut texture = YuvTexture::new(PixelFormat::YUY2, COLOR, 4, 2).unwrap();
    upload_luma(&mut texture, |_, _| 0);

    // Second macro pixel of the second row: Y0 U Y1 V
    let view = texture.lock(Some(Rect::new(2, 1, 2, 1))).unwrap();
    view.pixels[..4].copy_from_slice(&[200, 128, 200, 128]);

    let image = present_rgba(&mut blitter, &mut texture, Rect::full(4, 2), 4, 2);

    assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    assert_eq!(image.get_pixel(2, 1), &Rgba([200, 200, 200, 255]));
    assert_eq!(image.get_pixel(3, 1), &Rgba([200, 200, 200, 255]));
    assert_eq!(image.get_pixel(3, 0), &Rgba([0, 0, 0, 255]));
}

#[test]
fn scratch_path_errors_surface_unchanged() {
    let mut blitter = Blitter::new(SoftwareConverter::new(), NoResample);
    let mut texture = YuvTexture::new(PixelFormat::IYUV, COLOR, 4, 4).unwrap();
    let mut pixels = vec![0u8; 2 * 2 * 4];

    let result = blitter.present(
        &mut texture,
        Rect::new(0, 0, 2, 2),
        Output {
            format: PixelFormat::RGBA,
            width: 2,
            height: 2,
            pixels: &mut pixels,
            pitch: 8,
        },
    );

    assert!(matches!(
        result,
        Err(TextureError::Resample(ResampleError::Other(_)))
    ));
}

#[test]
fn converter_rejects_rgb_source() {
    let mut dst = vec![0u8; 4 * 3];

    let src = YuvSource::new(PixelFormat::RGB, COLOR, 2, 2, &[(&[0u8; 12][..], 6)]).unwrap();

    let result = SoftwareConverter::new().convert(
        &src,
        SurfaceMut::from_buffer(2, 2, PixelFormat::RGB, &mut dst, 6).unwrap(),
    );

    assert!(matches!(result, Err(ConvertError::UnsupportedSource(_))));
}

#[cfg(feature = "resize")]
mod software {
    use super::*;

    fn halves() -> YuvTexture {
        let mut texture = YuvTexture::new(PixelFormat::IYUV, COLOR, 4, 4).unwrap();
        upload_luma(&mut texture, |x, _| if x < 2 { 0 } else { 255 });
        texture
    }

    #[test]
    fn crop_right_half() {
        let mut blitter = Blitter::software();
        let mut texture = halves();

        let image = present_rgba(&mut blitter, &mut texture, Rect::new(2, 0, 2, 4), 2, 4);

        for pixel in image.pixels() {
            assert_eq!(pixel, &Rgba([255, 255, 255, 255]));
        }
    }

    #[test]
    fn nearest_upscale() {
        let mut blitter = Blitter::software().with_scale_mode(ScaleMode::Nearest);
        let mut texture = halves();

        let image = present_rgba(&mut blitter, &mut texture, Rect::full(4, 4), 8, 8);

        for (x, _, pixel) in image.enumerate_pixels() {
            let expected = if x < 4 { 0 } else { 255 };

            assert_eq!(pixel, &Rgba([expected, expected, expected, 255]), "{x}");
        }
    }

    #[test]
    fn linear_downscale_of_flat_image() {
        let mut blitter = Blitter::default().with_scale_mode(ScaleMode::Linear);
        let mut texture = YuvTexture::new(PixelFormat::NV12, COLOR, 16, 16).unwrap();
        upload_luma(&mut texture, |_, _| 90);

        let image = present_rgba(&mut blitter, &mut texture, Rect::new(4, 4, 8, 8), 3, 3);

        for pixel in image.pixels() {
            assert_eq!(pixel, &Rgba([90, 90, 90, 255]));
        }
    }

    #[test]
    fn alternating_targets() {
        let mut blitter = Blitter::software();
        let mut texture = halves();

        let rgba = present_rgba(&mut blitter, &mut texture, Rect::new(1, 0, 2, 2), 2, 2);
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(rgba.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));

        let mut bgr = vec![0u8; 2 * 2 * 3];
        blitter
            .present(
                &mut texture,
                Rect::new(1, 0, 2, 2),
                Output {
                    format: PixelFormat::BGR,
                    width: 2,
                    height: 2,
                    pixels: &mut bgr,
                    pitch: 6,
                },
            )
            .unwrap();

        assert_eq!(bgr, [0, 0, 0, 255, 255, 255, 0, 0, 0, 255, 255, 255]);
    }
}
