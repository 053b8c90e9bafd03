//! PDF rasterisation through pdfium.
//!
//! pdfium is a C++ library loaded at runtime, not linked at build time. The
//! binary therefore starts without it; [`bind_pdfium`] is called once at
//! startup and a failure there only disables PDF jobs.
//!
//! Pages are rendered one at a time at `zoom` × the PDF's 72 DPI user space
//! and handed to a callback, so only one page raster is alive at a time.

use super::backend::BackendError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bind the pdfium shared library.
///
/// `hint` may name the library file or a directory containing it. Without a
/// hint, the working directory is tried first, then the system library path.
pub fn bind_pdfium(hint: Option<&Path>) -> Result<Pdfium, PdfiumError> {
    let bindings = match hint {
        Some(dir) if dir.is_dir() => {
            Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(dir))?
        }
        Some(file) => Pdfium::bind_to_library(file)?,
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())?,
    };
    Ok(Pdfium::new(bindings))
}

fn load_error(path: &Path, err: PdfiumError) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        detail: format!("{err:?}"),
    }
}

fn render_error(path: &Path, page: u32, err: PdfiumError) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        detail: format!("page {page}: {err:?}"),
    }
}

/// Count the pages of `path` without rasterizing them.
pub fn page_count(pdfium: &Pdfium, path: &Path) -> Result<u32, BackendError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| load_error(path, e))?;
    Ok(u32::from(document.pages().len()))
}

/// Render every page of `path`, calling `on_page` with the 1-based page
/// number and its raster.
///
/// Pages that declare transparency are rendered onto a transparent
/// background and passed as RGBA; all others are rendered onto white and
/// passed as RGB.
pub fn render_pages(
    pdfium: &Pdfium,
    path: &Path,
    zoom: f32,
    mut on_page: impl FnMut(u32, DynamicImage) -> Result<(), BackendError>,
) -> Result<u32, BackendError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| load_error(path, e))?;

    let opaque = PdfRenderConfig::new().scale_page_by_factor(zoom);
    let transparent = PdfRenderConfig::new()
        .scale_page_by_factor(zoom)
        .set_clear_color(PdfColor::new(255, 255, 255, 0));

    let pages = document.pages();
    info!("{}: {} pages", path.display(), pages.len());

    let mut rendered = 0;
    for (index, page) in pages.iter().enumerate() {
        let number = index as u32 + 1;
        let has_alpha = page.has_transparency();
        let config = if has_alpha { &transparent } else { &opaque };
        let bitmap = page
            .render_with_config(config)
            .map_err(|e| render_error(path, number, e))?;

        let raster = bitmap.as_image();
        debug!(
            "rendered page {number} → {}x{} px{}",
            raster.width(),
            raster.height(),
            if has_alpha { " (transparent)" } else { "" }
        );
        let raster = if has_alpha {
            DynamicImage::ImageRgba8(raster.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(raster.to_rgb8())
        };
        on_page(number, raster)?;
        rendered += 1;
    }
    Ok(rendered)
}
