use crate::{
    BoundsCheckError, Converter, PixelFormat, Rect, Resampler, ScaleMode, Surface, SurfaceMut,
    TextureError, YuvTexture,
};
#[cfg(feature = "resize")]
use crate::{FirResampler, SoftwareConverter};

/// Caller owned RGB buffer a texture is presented into
#[derive(Debug)]
pub struct Output<'a> {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub pixels: &'a mut [u8],
    pub pitch: usize,
}

/// Optional value tagged with the key it was created for
#[derive(Debug)]
pub(crate) struct KeyedSlot<K, T> {
    entry: Option<(K, T)>,
}

impl<K, T> Default for KeyedSlot<K, T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: Copy + PartialEq, T> KeyedSlot<K, T> {
    pub(crate) fn key(&self) -> Option<K> {
        self.entry.as_ref().map(|(key, _)| *key)
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<&T> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    /// Drop the value if it was created for a different key, returns if something was dropped
    pub(crate) fn retain_key(&mut self, key: K) -> bool {
        if self.key().is_some_and(|k| k != key) {
            self.entry = None;
            return true;
        }

        false
    }

    /// Value for `key`, created with `create` if the slot is empty or holds another key
    pub(crate) fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        self.retain_key(key);

        let entry = match self.entry.take() {
            Some(entry) => entry,
            None => (key, create()?),
        };

        Ok(&mut self.entry.insert(entry).1)
    }
}

/// Geometry of the caller's buffer, re-bound to the buffer on every present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DisplayView {
    pub(crate) format: PixelFormat,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pitch: usize,
}

impl DisplayView {
    fn bind<'a>(&self, pixels: &'a mut [u8]) -> Result<SurfaceMut<'a>, BoundsCheckError> {
        SurfaceMut::from_buffer(self.width, self.height, self.format, pixels, self.pitch)
    }
}

/// Per texture state of [`Blitter::present`]
///
/// Both entries are keyed by the target format they were created for and dropped once a present
/// asks for another format.
#[derive(Debug, Default)]
pub(crate) struct PresentCache {
    pub(crate) display: KeyedSlot<PixelFormat, DisplayView>,
    /// Texture sized conversion target used when the blit has to crop or scale
    pub(crate) scratch: KeyedSlot<PixelFormat, Surface>,
}

impl PresentCache {
    fn retain_format(&mut self, format: PixelFormat) {
        let display = self.display.retain_key(format);
        let scratch = self.scratch.retain_key(format);

        if display || scratch {
            tracing::debug!(?format, "target format changed, dropped cached surfaces");
        }
    }
}

/// Presents [`YuvTexture`]s into RGB buffers
///
/// When the source rect is the whole texture and the output has the texture's size the texture is
/// converted straight into the output. Otherwise it is converted into a texture sized scratch
/// surface which is then stretched into the output with the configured [`ScaleMode`].
#[derive(Debug)]
pub struct Blitter<C, R> {
    converter: C,
    resampler: R,
    scale_mode: ScaleMode,
}

impl<C: Converter, R: Resampler> Blitter<C, R> {
    pub fn new(converter: C, resampler: R) -> Self {
        Self {
            converter,
            resampler,
            scale_mode: ScaleMode::default(),
        }
    }

    pub fn with_scale_mode(mut self, scale_mode: ScaleMode) -> Self {
        self.scale_mode = scale_mode;
        self
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn resampler(&self) -> &R {
        &self.resampler
    }

    pub fn into_inner(self) -> (C, R) {
        (self.converter, self.resampler)
    }

    /// Convert `src_rect` of `texture` into `output`, scaling it to the output's size
    pub fn present(
        &mut self,
        texture: &mut YuvTexture,
        src_rect: Rect,
        output: Output<'_>,
    ) -> Result<(), TextureError> {
        let Output {
            format,
            width,
            height,
            pixels,
            pitch,
        } = output;

        format.rgb_desc()?;

        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }

        let (tex_width, tex_height) = (texture.width(), texture.height());

        if src_rect.is_empty() || !src_rect.fits_within(tex_width, tex_height) {
            return Err(TextureError::InvalidRegion {
                rect: src_rect,
                width: tex_width,
                height: tex_height,
            });
        }

        let (source, cache) = texture.present_parts();

        cache.retain_format(format);

        let direct = src_rect.is_full(tex_width, tex_height)
            && width == tex_width
            && height == tex_height;

        if direct {
            tracing::trace!(?format, width, height, "converting directly into output");

            let dst = SurfaceMut::from_buffer(width, height, format, pixels, pitch)?;
            self.converter.convert(&source, dst)?;

            return Ok(());
        }

        let display = cache
            .display
            .get_or_try_insert_with(format, || {
                tracing::debug!(?format, "creating display view");

                Ok::<_, TextureError>(DisplayView {
                    format,
                    width,
                    height,
                    pitch,
                })
            })?;

        display.width = width;
        display.height = height;
        display.pitch = pitch;

        let dst = display.bind(pixels)?;

        let scratch = cache.scratch.get_or_try_insert_with(format, || {
            tracing::debug!(?format, tex_width, tex_height, "creating scratch surface");

            Surface::new(tex_width, tex_height, format)
        })?;

        tracing::trace!(
            ?src_rect,
            width,
            height,
            "converting and stretching into output"
        );

        self.converter.convert(&source, scratch.view_mut())?;
        self.resampler
            .stretch(scratch.view(), src_rect, dst, None, self.scale_mode)?;

        Ok(())
    }
}

#[cfg(feature = "resize")]
impl Blitter<SoftwareConverter, FirResampler> {
    /// [`SoftwareConverter`] and [`FirResampler`]
    pub fn software() -> Self {
        Self::new(SoftwareConverter::new(), FirResampler::new())
    }
}

#[cfg(feature = "resize")]
impl Default for Blitter<SoftwareConverter, FirResampler> {
    fn default() -> Self {
        Self::software()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorInfo, ConvertError, ResampleError, SurfaceRef, YuvSource};

    #[derive(Default)]
    struct CountingConverter {
        calls: usize,
        fail: bool,
    }

    impl Converter for CountingConverter {
        fn convert(
            &mut self,
            src: &YuvSource<'_>,
            mut dst: SurfaceMut<'_>,
        ) -> Result<(), ConvertError> {
            self.calls += 1;

            if self.fail {
                return Err(ConvertError::Other("converter failed".into()));
            }

            assert_eq!((src.width, src.height), (dst.width(), dst.height()));
            dst.pixels_mut().fill(7);

            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingResampler {
        calls: usize,
        last: Option<(PixelFormat, usize, usize, Rect)>,
        last_src_ptr: Option<usize>,
    }

    impl Resampler for CountingResampler {
        fn stretch(
            &mut self,
            src: SurfaceRef<'_>,
            src_rect: Rect,
            mut dst: SurfaceMut<'_>,
            dst_rect: Option<Rect>,
            _: ScaleMode,
        ) -> Result<(), ResampleError> {
            self.calls += 1;
            self.last = Some((src.format(), dst.width(), dst.height(), src_rect));
            self.last_src_ptr = Some(src.pixels().as_ptr() as usize);

            assert!(dst_rect.is_none());
            assert!(src.pixels().iter().all(|&b| b == 7));
            dst.pixels_mut().fill(9);

            Ok(())
        }
    }

    type TestBlitter = Blitter<CountingConverter, CountingResampler>;

    fn blitter() -> TestBlitter {
        Blitter::new(CountingConverter::default(), CountingResampler::default())
    }

    fn texture() -> YuvTexture {
        YuvTexture::new(PixelFormat::IYUV, ColorInfo::BT601_LIMITED, 4, 4).unwrap()
    }

    fn output(format: PixelFormat, width: usize, height: usize, buf: &mut [u8]) -> Output<'_> {
        let pitch = width * format.bytes_per_pixel().unwrap();

        Output {
            format,
            width,
            height,
            pixels: buf,
            pitch,
        }
    }

    #[test]
    fn full_rect_converts_directly() {
        let mut blitter = blitter();
        let mut texture = texture();
        let mut buf = vec![0u8; 4 * 4 * 4];

        blitter
            .present(
                &mut texture,
                Rect::full(4, 4),
                output(PixelFormat::RGBA, 4, 4, &mut buf),
            )
            .unwrap();

        assert_eq!(blitter.converter().calls, 1);
        assert_eq!(blitter.resampler().calls, 0);
        assert!(texture.cache().scratch.get().is_none());
        assert!(texture.cache().display.get().is_none());
        assert!(buf.iter().all(|&b| b == 7));
    }

    #[test]
    fn sub_rect_goes_through_one_reused_scratch_surface() {
        let mut blitter = blitter();
        let mut texture = texture();

        let mut small = vec![0u8; 2 * 2 * 3];
        blitter
            .present(
                &mut texture,
                Rect::new(1, 1, 2, 2),
                output(PixelFormat::RGB, 2, 2, &mut small),
            )
            .unwrap();

        assert!(small.iter().all(|&b| b == 9));

        let scratch = texture.cache().scratch.get().unwrap();
        assert_eq!((scratch.width(), scratch.height()), (4, 4));
        assert_eq!(scratch.format(), PixelFormat::RGB);
        let scratch_ptr = scratch.pixels().as_ptr() as usize;

        let mut large = vec![0u8; 8 * 6 * 3];
        blitter
            .present(
                &mut texture,
                Rect::new(0, 0, 3, 2),
                output(PixelFormat::RGB, 8, 6, &mut large),
            )
            .unwrap();

        assert_eq!(blitter.converter().calls, 2);
        assert_eq!(blitter.resampler().calls, 2);
        assert_eq!(
            blitter.resampler().last,
            Some((PixelFormat::RGB, 8, 6, Rect::new(0, 0, 3, 2)))
        );
        assert_eq!(blitter.resampler().last_src_ptr, Some(scratch_ptr));

        let display = texture.cache().display.get().unwrap();
        assert_eq!((display.width, display.height, display.pitch), (8, 6, 24));
    }

    #[test]
    fn scaling_the_full_texture_uses_the_scratch_surface() {
        let mut blitter = blitter();
        let mut texture = texture();
        let mut buf = vec![0u8; 8 * 8 * 4];

        blitter
            .present(
                &mut texture,
                Rect::full(4, 4),
                output(PixelFormat::BGRA, 8, 8, &mut buf),
            )
            .unwrap();

        assert_eq!(blitter.resampler().calls, 1);
        assert_eq!(texture.cache().scratch.key(), Some(PixelFormat::BGRA));
    }

    #[test]
    fn format_change_recreates_cached_surfaces() {
        let mut blitter = blitter();
        let mut texture = texture();
        let mut buf = vec![0u8; 2 * 2 * 4];

        blitter
            .present(
                &mut texture,
                Rect::new(0, 0, 2, 2),
                output(PixelFormat::RGBA, 2, 2, &mut buf),
            )
            .unwrap();
        blitter
            .present(
                &mut texture,
                Rect::new(0, 0, 2, 2),
                output(PixelFormat::BGRA, 2, 2, &mut buf),
            )
            .unwrap();

        assert_eq!(texture.cache().scratch.key(), Some(PixelFormat::BGRA));
        assert_eq!(texture.cache().display.key(), Some(PixelFormat::BGRA));
        assert_eq!(
            texture.cache().scratch.get().unwrap().format(),
            PixelFormat::BGRA
        );

        // A direct present in another format drops both
        let mut full = vec![0u8; 4 * 4 * 3];
        blitter
            .present(
                &mut texture,
                Rect::full(4, 4),
                output(PixelFormat::BGR, 4, 4, &mut full),
            )
            .unwrap();

        assert!(texture.cache().scratch.get().is_none());
        assert!(texture.cache().display.get().is_none());
    }

    #[test]
    fn invalid_requests() {
        let mut blitter = blitter();
        let mut texture = texture();
        let mut buf = vec![0u8; 4 * 4 * 4];

        assert!(matches!(
            blitter.present(
                &mut texture,
                Rect::full(4, 4),
                Output {
                    format: PixelFormat::NV12,
                    width: 4,
                    height: 4,
                    pixels: &mut buf,
                    pitch: 4,
                }
            ),
            Err(TextureError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            blitter.present(
                &mut texture,
                Rect::new(2, 2, 3, 1),
                output(PixelFormat::RGBA, 4, 4, &mut buf)
            ),
            Err(TextureError::InvalidRegion { .. })
        ));

        assert!(matches!(
            blitter.present(
                &mut texture,
                Rect::full(4, 4),
                output(PixelFormat::RGBA, 0, 4, &mut buf)
            ),
            Err(TextureError::InvalidDimensions { .. })
        ));

        assert!(matches!(
            blitter.present(
                &mut texture,
                Rect::full(4, 4),
                output(PixelFormat::RGBA, 5, 5, &mut buf)
            ),
            Err(TextureError::Output(BoundsCheckError::InvalidBufferSize { .. }))
        ));

        assert_eq!(blitter.converter().calls, 0);
    }

    #[test]
    fn converter_errors_propagate() {
        let mut blitter = Blitter::new(
            CountingConverter {
                fail: true,
                ..Default::default()
            },
            CountingResampler::default(),
        );
        let mut texture = texture();
        let mut buf = vec![0u8; 2 * 2 * 4];

        assert!(matches!(
            blitter.present(
                &mut texture,
                Rect::new(0, 0, 2, 2),
                output(PixelFormat::RGBA, 2, 2, &mut buf)
            ),
            Err(TextureError::Conversion(ConvertError::Other(_)))
        ));

        assert_eq!(blitter.resampler().calls, 0);
    }
}
