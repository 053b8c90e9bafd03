//! # webprep
//!
//! Batch-convert images and PDFs into web-ready files with names a CMS will
//! accept unchanged. Point it at a directory of scans and exports; get back
//! one flat directory of resized WebP (or AVIF, PNG, JPEG) files named
//! `mein-bild-ue.webp`, `strasse-123.webp`, `broschuere-p001.webp`.
//!
//! # Pipeline
//!
//! ```text
//! source/ ──walk──▶ ConversionJob ──backend──▶ bytes ──name──▶ output-web/
//!                   (image | pdf)              (per page)  slug → prefix → unique
//! ```
//!
//! Every file is handled on its own, in file-name order. A broken file is
//! reported and skipped; the run carries on and exits non-zero at the end.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Source filename → lowercase ASCII slug; prefix handling; page segments |
//! | [`collision`] | Hands out each output name once per run (`-001`, `-002`, …) |
//! | [`convert`] | Walks the source directory and drives each file through backend, naming and write |
//! | [`imaging`] | Decode, orient, resize and encode images; rasterize PDF pages through pdfium |
//! | [`config`] | Layered settings: defaults, `webprep.toml`, flags, prompts → immutable [`config::RunConfig`] |
//! | [`prompt`] | The `--interactive` question loop |
//! | [`output`] | CLI output formatting for per-file events and the run summary |
//!
//! # Design Decisions
//!
//! ## Names Are Claimed After Conversion
//!
//! The backend returns encoded bytes instead of writing files. A name is
//! only reserved once a file has actually converted, so a corrupt source
//! never leaves a gap in the `-001`, `-002` sequence.
//!
//! ## Optional Capabilities Fail Per File
//!
//! AVIF encoding is a cargo feature and PDF rendering needs the pdfium shared
//! library at runtime. Neither is required: a missing one is reported once at
//! startup, and only the files that need it fail.
//!
//! ## Cross-Run Collisions
//!
//! Files already present in the output directory count as taken, so a second
//! run next to the first produces `photo-001.webp` instead of replacing
//! `photo.webp`. `--overwrite` turns that off.

pub mod collision;
pub mod config;
pub mod convert;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;
