//! Parameter types for conversions.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between the dispatcher (which decides what to convert) and the
//! [`backend`](super::backend) (which does the pixel work), so the dispatcher
//! can be tested against a mock backend.
//!
//! ## Types
//!
//! - [`OutputFormat`]: target encoding (`avif`, `webp`, `png`, `jpg`).
//! - [`Quality`]: lossy encoding quality (0–100, default 80). Clamped on construction.
//! - [`ImageSettings`]: format, target width and quality for one conversion.
//! - [`PdfSettings`]: image settings plus the render zoom for PDF pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoded output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Avif,
    #[default]
    Webp,
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Avif, Self::Webp, Self::Png, Self::Jpg];

    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    /// JPEG has no alpha channel; transparent sources are flattened.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpg)
    }

    /// PNG is lossless and ignores the quality setting.
    pub fn uses_quality(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avif" => Ok(Self::Avif),
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            other => Err(format!(
                "unknown output format '{other}' (expected avif, webp, png or jpg)"
            )),
        }
    }
}

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// What a single image conversion should produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSettings {
    pub format: OutputFormat,
    /// Maximum output width. Narrower sources keep their size.
    pub width: u32,
    pub quality: Quality,
}

/// What a PDF conversion should produce, per page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfSettings {
    pub image: ImageSettings,
    /// Multiplier on the PDF's 72 DPI user space (2.0 ≈ 144 DPI).
    pub zoom: f32,
}
