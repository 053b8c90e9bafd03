//! Image and PDF conversion.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orient** | `image` decoders, EXIF orientation applied to pixels |
//! | **Resize** | Lanczos3, width-bounded, no upscaling |
//! | **Encode** | `image` (JPEG, PNG, AVIF), `webp` (lossy WebP) |
//! | **Rasterize PDF** | `pdfium-render`, bound at runtime |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a conversion
//! - **Capabilities**: Optional features detected once at startup
//! - **Backend**: [`ConversionBackend`] trait + [`RustBackend`]
//! - **PDF**: pdfium binding and page rendering

pub mod backend;
mod calculations;
pub mod capabilities;
mod params;
pub mod pdf;
pub mod rust_backend;

pub use backend::{BackendError, ConversionBackend, EncodedPage};
pub use calculations::fit_to_width;
pub use capabilities::{Capabilities, Capability};
pub use params::{ImageSettings, OutputFormat, PdfSettings, Quality};
pub use rust_backend::{MAX_IMAGE_PIXELS, RustBackend, supported_input_extensions};
