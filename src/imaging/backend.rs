//! Conversion backend trait and shared types.
//!
//! The [`ConversionBackend`] trait defines the two pipelines every backend
//! must provide: one image in, one encoded image out; one PDF in, one
//! encoded image per page out. Both return bytes and leave naming and
//! writing to the caller, so an output name is only claimed once the
//! conversion has succeeded.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::capabilities::{Capabilities, Capability};
use super::params::{ImageSettings, OutputFormat, PdfSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {}: {detail}", path.display())]
    Decode { path: PathBuf, detail: String },
    #[error("failed to encode {format}: {detail}")]
    Encode {
        format: OutputFormat,
        detail: String,
    },
    #[error("{0} is not available")]
    MissingCapability(Capability),
    #[error("{} has {pixels} pixels, more than the limit of {limit}", path.display())]
    TooLarge {
        path: PathBuf,
        pixels: u64,
        limit: u64,
    },
}

/// One rendered and encoded PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPage {
    /// 1-based page number.
    pub page: u32,
    pub bytes: Vec<u8>,
}

/// Trait for conversion backends.
pub trait ConversionBackend {
    /// Optional capabilities this backend can serve.
    fn capabilities(&self) -> Capabilities;

    /// Decode, orient, resize and re-encode a single image.
    fn convert_image(&self, path: &Path, settings: &ImageSettings)
    -> Result<Vec<u8>, BackendError>;

    /// Rasterize every page of a PDF and encode each one.
    fn convert_pdf(
        &self,
        path: &Path,
        settings: &PdfSettings,
    ) -> Result<Vec<EncodedPage>, BackendError>;

    /// Number of pages in a PDF, without rendering any of them.
    fn pdf_page_count(&self, path: &Path) -> Result<u32, BackendError>;
}
