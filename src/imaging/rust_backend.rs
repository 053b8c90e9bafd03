//! Production backend built on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, BMP, GIF, WebP) | `image` crate decoders |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG / PNG | `image::codecs::{jpeg, png}` |
//! | Encode → WebP | `webp` crate (libwebp, lossy) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Rasterize PDF pages | `pdfium-render`, see [`pdf`](super::pdf) |
//!
//! CMYK JPEG and TIFF sources are converted to RGB by the decoders. Every
//! image is then brought into 8-bit RGB or RGBA before encoding; RGBA only
//! when the source has alpha and the target format can store it.

use super::backend::{BackendError, ConversionBackend, EncodedPage};
use super::calculations::{fit_to_width, pixel_count};
use super::capabilities::{Capabilities, Capability};
use super::params::{ImageSettings, OutputFormat, PdfSettings, Quality};
use super::pdf;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Limits, RgbImage, RgbaImage};
use pdfium_render::prelude::Pdfium;
use std::path::Path;
use tracing::debug;

/// Largest source accepted, in pixels. High enough for large scans, low
/// enough that a corrupt header cannot request an unbounded buffer.
pub const MAX_IMAGE_PIXELS: u64 = 300_000_000;

/// Source extensions the image pipeline can decode.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp", "gif", "webp"];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}

/// Backend using `image`, `webp` and (when bound) pdfium.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    pdfium: Option<Pdfium>,
}

impl RustBackend {
    /// Backend without PDF support.
    pub fn new() -> Self {
        Self { pdfium: None }
    }

    /// Backend that renders PDFs through an already bound pdfium library.
    pub fn with_pdfium(pdfium: Pdfium) -> Self {
        Self {
            pdfium: Some(pdfium),
        }
    }

    fn pdfium(&self) -> Result<&Pdfium, BackendError> {
        self.pdfium
            .as_ref()
            .ok_or(BackendError::MissingCapability(Capability::PdfRendering))
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        detail: err.to_string(),
    }
}

fn encode_error(format: OutputFormat, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        format,
        detail: err.to_string(),
    }
}

/// Decoder limits sized for [`MAX_IMAGE_PIXELS`].
fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = None;
    limits.max_image_height = None;
    // 16 bytes per pixel covers RGBA32F, the widest buffer a decoder produces
    limits.max_alloc = Some(MAX_IMAGE_PIXELS * 16);
    limits
}

/// Load an image and rotate/flip its pixels to match the EXIF orientation.
///
/// The orientation is consumed here; encoders never write it back, so
/// viewers do not rotate the output a second time.
fn load_oriented(path: &Path) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(decode_limits());
    let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;

    check_pixel_limit(path, decoder.dimensions())?;

    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Reject images whose header declares more than [`MAX_IMAGE_PIXELS`].
fn check_pixel_limit(path: &Path, dimensions: (u32, u32)) -> Result<(), BackendError> {
    let pixels = pixel_count(dimensions);
    if pixels > MAX_IMAGE_PIXELS {
        return Err(BackendError::TooLarge {
            path: path.to_path_buf(),
            pixels,
            limit: MAX_IMAGE_PIXELS,
        });
    }
    Ok(())
}

/// Downscale to the target width with Lanczos3; narrower images pass through.
pub(crate) fn resize_to_width(img: DynamicImage, target_width: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = fit_to_width((w, h), target_width);
    if (new_w, new_h) == (w, h) {
        return img;
    }
    debug!("resizing {w}x{h} → {new_w}x{new_h}");
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Composite RGBA over a white background.
fn flatten_on_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Bring an image into the 8-bit color layout the target format expects.
pub(crate) fn prepare_for_format(img: DynamicImage, format: OutputFormat) -> DynamicImage {
    if !img.color().has_alpha() {
        return match img {
            DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
    }
    if format.supports_alpha() {
        match img {
            DynamicImage::ImageRgba8(_) => img,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        }
    } else {
        DynamicImage::ImageRgb8(flatten_on_white(&img.to_rgba8()))
    }
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let encoder =
        webp::Encoder::from_image(img).map_err(|e| encode_error(OutputFormat::Webp, e))?;
    let memory = if quality.value() >= 100 {
        encoder.encode_lossless()
    } else {
        encoder.encode(f32::from(quality.value()))
    };
    Ok(memory.to_vec())
}

#[cfg(feature = "avif")]
fn encode_avif(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, quality.value().max(1));
    img.write_with_encoder(encoder)
        .map_err(|e| encode_error(OutputFormat::Avif, e))?;
    Ok(buf)
}

#[cfg(not(feature = "avif"))]
fn encode_avif(_img: &DynamicImage, _quality: Quality) -> Result<Vec<u8>, BackendError> {
    Err(BackendError::MissingCapability(Capability::AvifEncoding))
}

/// Encode an already prepared image into `format`.
pub(crate) fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    match format {
        OutputFormat::Jpg => {
            let mut buf = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value().max(1));
            img.write_with_encoder(encoder)
                .map_err(|e| encode_error(format, e))?;
            Ok(buf)
        }
        OutputFormat::Png => {
            let mut buf = Vec::new();
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Default, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| encode_error(format, e))?;
            Ok(buf)
        }
        OutputFormat::Webp => encode_webp(img, quality),
        OutputFormat::Avif => encode_avif(img, quality),
    }
}

/// Resize, prepare and encode a decoded image.
pub(crate) fn finish(img: DynamicImage, settings: &ImageSettings) -> Result<Vec<u8>, BackendError> {
    let resized = resize_to_width(img, settings.width);
    let prepared = prepare_for_format(resized, settings.format);
    encode(&prepared, settings.format, settings.quality)
}

impl ConversionBackend for RustBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pdf: self.pdfium.is_some(),
            ..Capabilities::compiled()
        }
    }

    fn convert_image(
        &self,
        path: &Path,
        settings: &ImageSettings,
    ) -> Result<Vec<u8>, BackendError> {
        if let Some(capability) = Capabilities::for_format(settings.format) {
            self.capabilities().require(capability)?;
        }
        let img = load_oriented(path)?;
        finish(img, settings)
    }

    fn convert_pdf(
        &self,
        path: &Path,
        settings: &PdfSettings,
    ) -> Result<Vec<EncodedPage>, BackendError> {
        let pdfium = self.pdfium()?;
        if let Some(capability) = Capabilities::for_format(settings.image.format) {
            self.capabilities().require(capability)?;
        }

        let mut pages = Vec::new();
        pdf::render_pages(pdfium, path, settings.zoom, |page, img| {
            let bytes = finish(img, &settings.image)?;
            pages.push(EncodedPage { page, bytes });
            Ok(())
        })?;
        Ok(pages)
    }

    fn pdf_page_count(&self, path: &Path) -> Result<u32, BackendError> {
        pdf::page_count(self.pdfium()?, path)
    }
}
