//! Run configuration.
//!
//! Settings come from four layers, later layers overriding earlier ones:
//!
//! ```text
//! stock defaults  <  webprep.toml  <  command-line flags  <  interactive answers
//! ```
//!
//! The first three are merged as TOML values ([`merge_toml`]) and
//! deserialized into [`Settings`]; interactive answers are applied to that
//! struct directly. [`Settings::resolve`] then validates everything once and
//! produces the immutable [`RunConfig`] the converter works from.
//!
//! ## Config File
//!
//! `webprep.toml` in the source directory is read when present; `--config`
//! names another file. Every key is optional:
//!
//! ```toml
//! output = "/srv/site/uploads"  # default: <source>/output-web
//! prefix = ""                   # e.g. "ABC123" → abc123-photo.webp
//! extensions = ["tif", "jpg", "jpeg", "png", "pdf"]
//! format = "webp"               # avif | webp | png | jpg
//! width = 1920                  # maximum output width in pixels
//! quality = 80                  # 0-100, ignored for png
//! zoom = 2.0                    # PDF render zoom (1.0 = 72 DPI)
//! recursive = true              # descend into subdirectories
//! overwrite = false             # replace files left by earlier runs
//! ```
//!
//! A relative `output` is taken relative to the working directory, like the
//! `--output` flag, not relative to the source directory.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ImageSettings, OutputFormat, Quality};
use crate::naming::normalize_prefix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file picked up from the source directory.
pub const CONFIG_FILE_NAME: &str = "webprep.toml";

/// Output directory name used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output-web";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Source directory '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),
}

/// User-facing settings, before validation.
///
/// All fields have defaults matching the interactive tool's prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory scanned for source files.
    pub source: PathBuf,
    /// Flat output directory. `None` means `<source>/output-web`; a relative
    /// path resolves against the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Raw filename prefix; normalized during resolution.
    pub prefix: String,
    /// Source extensions to convert, without dots.
    pub extensions: Vec<String>,
    pub format: OutputFormat,
    /// Maximum output width in pixels.
    pub width: u32,
    /// Lossy encoding quality, 0-100.
    pub quality: u32,
    /// PDF render zoom relative to 72 DPI.
    pub zoom: f32,
    /// Descend into subdirectories of the source.
    pub recursive: bool,
    /// Replace files already present in the output directory instead of
    /// treating them as taken names.
    pub overwrite: bool,
    /// pdfium library file, or a directory containing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfium: Option<PathBuf>,
}

pub fn default_extensions() -> Vec<String> {
    ["tif", "jpg", "jpeg", "png", "pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            output: None,
            prefix: String::new(),
            extensions: default_extensions(),
            format: OutputFormat::default(),
            width: 1920,
            quality: 80,
            zoom: 2.0,
            recursive: true,
            overwrite: false,
            pdfium: None,
        }
    }
}

/// Fully resolved, validated configuration for one run.
///
/// Built once before any file is touched and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Prefix as typed, for reporting.
    pub raw_prefix: String,
    /// Normalized prefix (`abc123-`), empty when disabled.
    pub prefix: String,
    /// Lowercase extensions without dots.
    pub extensions: BTreeSet<String>,
    pub image: ImageSettings,
    pub zoom: f32,
    pub recursive: bool,
    pub overwrite: bool,
    pub dry_run: bool,
}

impl RunConfig {
    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e.to_ascii_lowercase()))
    }
}

/// Parse a comma-separated extension list such as `"TIF, .jpg,png"`.
///
/// Entries are trimmed, lowercased and stripped of leading dots; empty and
/// duplicate entries are dropped.
pub fn parse_extension_list(input: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Validation(
                "width must be a positive number of pixels".into(),
            ));
        }
        if self.quality > 100 {
            return Err(ConfigError::Validation("quality must be 0-100".into()));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(ConfigError::Validation(
                "zoom must be a positive number".into(),
            ));
        }
        let extensions = parse_extension_list(&self.extensions.join(","));
        if extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must name at least one file type".into(),
            ));
        }
        Ok(())
    }

    /// Validate and turn these settings into the run's [`RunConfig`].
    ///
    /// The source directory must exist; the output directory is only
    /// computed here and created later by the converter.
    pub fn resolve(self, dry_run: bool) -> Result<RunConfig, ConfigError> {
        self.validate()?;

        let source = expand_home(&self.source);
        if !source.is_dir() {
            return Err(ConfigError::SourceNotFound(source));
        }
        let source = fs::canonicalize(&source)?;
        let output = match &self.output {
            Some(out) => std::path::absolute(expand_home(out))?,
            None => source.join(DEFAULT_OUTPUT_DIR),
        };

        Ok(RunConfig {
            source,
            output,
            prefix: normalize_prefix(&self.prefix),
            raw_prefix: self.prefix,
            extensions: parse_extension_list(&self.extensions.join(","))
                .into_iter()
                .collect(),
            image: ImageSettings {
                format: self.format,
                width: self.width,
                quality: Quality::new(self.quality),
            },
            zoom: self.zoom,
            recursive: self.recursive,
            overwrite: self.overwrite,
            dry_run,
        })
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer that file and command-line overrides are merged
/// onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).unwrap_or(toml::Value::Table(toml::Table::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto the stock defaults and deserialize the result.
pub fn resolve_settings(
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let settings: Settings = merged.try_into()?;
    Ok(settings)
}

/// Returns a fully-commented stock `webprep.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# webprep configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Place this file as webprep.toml in the source directory, or pass
# --config <file>. Command-line flags override it.
# Unknown keys will cause an error.

# Directory scanned for source files.
source = "."

# Flat output directory. Defaults to <source>/output-web.
# A relative path is taken relative to the working directory.
# output = "/srv/site/uploads"

# Filename prefix. Lowercased, reduced to letters and digits, and joined
# with a hyphen: "ABC 123" -> abc123-photo.webp. Empty disables it.
prefix = ""

# Source file extensions to convert (case-insensitive).
extensions = ["tif", "jpg", "jpeg", "png", "pdf"]

# Output format: avif, webp, png or jpg.
format = "webp"

# Maximum output width in pixels. Height follows the aspect ratio.
# Narrower images are never upscaled.
width = 1920

# Encoding quality, 0-100. Ignored for png.
quality = 80

# PDF render zoom relative to 72 DPI (2.0 = 144 DPI).
zoom = 2.0

# Descend into subdirectories of the source. The output directory is
# always skipped.
recursive = true

# Replace files left in the output directory by earlier runs. When false,
# existing files count as taken and new outputs get -001, -002, ...
overwrite = false

# pdfium shared library, or the directory containing it. Without this the
# working directory and the system library path are searched.
# pdfium = "/opt/pdfium/lib"
"##
}
