//! Optional capabilities, detected once at startup.
//!
//! Two pieces of the pipeline may be absent without making the tool useless:
//!
//! | Capability | Present when |
//! |---|---|
//! | AVIF encoding | built with the `avif` cargo feature (default) |
//! | PDF rendering | a pdfium shared library could be bound |
//!
//! A missing capability is reported once as a warning. Jobs that need it
//! fail fast with [`BackendError::MissingCapability`] instead of attempting
//! the work.

use super::backend::BackendError;
use super::params::OutputFormat;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    AvifEncoding,
    PdfRendering,
}

impl Capability {
    /// What to do about it, shown next to the startup warning.
    pub fn hint(self) -> &'static str {
        match self {
            Self::AvifEncoding => "rebuild with the `avif` feature or pick another format",
            Self::PdfRendering => {
                "install the pdfium library or point --pdfium at it; PDF files will fail"
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AvifEncoding => f.write_str("AVIF encoding"),
            Self::PdfRendering => f.write_str("PDF rendering"),
        }
    }
}

/// The set of optional capabilities available to this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub avif: bool,
    pub pdf: bool,
}

impl Capabilities {
    /// Capabilities decided at compile time; PDF support is off until a
    /// renderer has been bound.
    pub fn compiled() -> Self {
        Self {
            avif: cfg!(feature = "avif"),
            pdf: false,
        }
    }

    pub fn all() -> Self {
        Self {
            avif: true,
            pdf: true,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::AvifEncoding => self.avif,
            Capability::PdfRendering => self.pdf,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), BackendError> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(BackendError::MissingCapability(capability))
        }
    }

    /// Capability needed to write `format`, if any.
    pub fn for_format(format: OutputFormat) -> Option<Capability> {
        match format {
            OutputFormat::Avif => Some(Capability::AvifEncoding),
            _ => None,
        }
    }

    pub fn missing(&self) -> Vec<Capability> {
        [Capability::AvifEncoding, Capability::PdfRendering]
            .into_iter()
            .filter(|c| !self.supports(*c))
            .collect()
    }
}
