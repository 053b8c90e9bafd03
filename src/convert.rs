//! Batch conversion of a source directory.
//!
//! [`run`] walks the source directory once, in file-name order, and handles
//! every file whose extension matches the filter:
//!
//! ```text
//! Mein Bild Ü.jpg ─┐
//!                  ├─ job ─ backend ─ slug ─ prefix ─ registry ─ write
//! Mein Bild Ü.png ─┘
//!
//! output-web/
//! ├── mein-bild-ue.webp
//! ├── mein-bild-ue-001.webp
//! ├── brochure-p001.webp       # one file per PDF page
//! └── brochure-p002.webp
//! ```
//!
//! A failing file is reported and the run moves on; only problems with the
//! output directory itself abort the run. Output names are claimed in the
//! [`NameRegistry`] only after the backend has produced bytes, so a failed
//! file never uses up a name.
//!
//! The output directory is never walked, and hidden files are skipped.

use crate::collision::NameRegistry;
use crate::config::RunConfig;
use crate::imaging::{
    BackendError, Capabilities, Capability, ConversionBackend, EncodedPage, ImageSettings,
    PdfSettings, supported_input_extensions,
};
use crate::naming::{apply_prefix, output_file_name, slugify};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Why a single file could not be converted.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported file type '.{0}'")]
    UnsupportedExtension(String),
    #[error("{0} is not available")]
    MissingCapability(Capability),
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Encode(String),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl From<BackendError> for ConvertError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => Self::Filesystem(e),
            BackendError::MissingCapability(c) => Self::MissingCapability(c),
            e @ BackendError::Encode { .. } => Self::Encode(e.to_string()),
            e @ (BackendError::Decode { .. } | BackendError::TooLarge { .. }) => {
                Self::Decode(e.to_string())
            }
        }
    }
}

/// Errors that stop the whole run before any file is converted.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputNotCreatable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("output directory {} is not writable: {source}", path.display())]
    OutputNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One source file and what to do with it, decided once from its extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionJob {
    Image {
        source: PathBuf,
        settings: ImageSettings,
    },
    Pdf {
        source: PathBuf,
        settings: PdfSettings,
    },
}

impl ConversionJob {
    pub fn new(source: &Path, config: &RunConfig) -> Result<Self, ConvertError> {
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            Ok(Self::Pdf {
                source: source.to_path_buf(),
                settings: PdfSettings {
                    image: config.image,
                    zoom: config.zoom,
                },
            })
        } else if supported_input_extensions().contains(&extension.as_str()) {
            Ok(Self::Image {
                source: source.to_path_buf(),
                settings: config.image,
            })
        } else {
            Err(ConvertError::UnsupportedExtension(extension))
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            Self::Image { source, .. } | Self::Pdf { source, .. } => source,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Self::Image { .. } => JobKind::Image,
            Self::Pdf { .. } => JobKind::Pdf,
        }
    }

    fn image_settings(&self) -> &ImageSettings {
        match self {
            Self::Image { settings, .. } => settings,
            Self::Pdf { settings, .. } => &settings.image,
        }
    }

    /// Capabilities this job cannot run without.
    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut needed = Vec::new();
        if matches!(self, Self::Pdf { .. }) {
            needed.push(Capability::PdfRendering);
        }
        needed.extend(Capabilities::for_format(self.image_settings().format));
        needed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Image,
    Pdf,
    Other,
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Written (or, in a dry run, named) output files, in page order.
    Converted { outputs: Vec<String> },
    Skipped { reason: String },
    Failed { error: String },
}

/// Progress report for one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertEvent {
    /// Source path relative to the source directory.
    pub source: PathBuf,
    pub kind: JobKind,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Totals and per-file outcomes of a run. Serialized as the JSON report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub source: PathBuf,
    pub output: PathBuf,
    pub dry_run: bool,
    /// Source files converted successfully.
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Output files produced (PDFs produce one per page).
    pub written: usize,
    pub events: Vec<ConvertEvent>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_report(&self, path: &Path) -> Result<(), RunError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn record(&mut self, event: ConvertEvent) {
        match &event.outcome {
            Outcome::Converted { outputs } => {
                self.converted += 1;
                self.written += outputs.len();
            }
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.events.push(event);
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Source files matching the extension filter, in walk order.
///
/// Directories are visited in file-name order; `excluded` (the output
/// directory) is pruned. Symlinks are followed, so a linked file counts like
/// the file itself. Unreadable entries and broken links are logged and
/// skipped.
pub fn collect_sources(config: &RunConfig, excluded: &Path) -> Vec<PathBuf> {
    let max_depth = if config.recursive { usize::MAX } else { 1 };
    WalkDir::new(&config.source)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && e.path() != excluded)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && config.matches_extension(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

/// Create the output directory and check that files can be written to it.
fn prepare_output_dir(output: &Path) -> Result<PathBuf, RunError> {
    fs::create_dir_all(output).map_err(|source| RunError::OutputNotCreatable {
        path: output.to_path_buf(),
        source,
    })?;

    let marker = output.join(".webprep-write-test");
    fs::write(&marker, b"")
        .and_then(|()| fs::remove_file(&marker))
        .map_err(|source| RunError::OutputNotWritable {
            path: output.to_path_buf(),
            source,
        })?;

    Ok(fs::canonicalize(output).unwrap_or_else(|_| output.to_path_buf()))
}

/// Per-run state threaded through the conversion of each file.
struct Converter<'a, B> {
    backend: &'a B,
    config: &'a RunConfig,
    capabilities: Capabilities,
    registry: NameRegistry,
}

impl<B: ConversionBackend> Converter<'_, B> {
    /// Claim a unique name. Files left in the output directory count as
    /// taken unless the run overwrites.
    fn claim(&mut self, candidate: &str) -> String {
        let config = self.config;
        self.registry.resolve_with(candidate, |name| {
            !config.overwrite && config.output.join(name).exists()
        })
    }

    /// Encode the job; in a dry run, only report which pages would exist.
    fn produce(&self, job: &ConversionJob) -> Result<Vec<(Option<u32>, Vec<u8>)>, ConvertError> {
        match job {
            ConversionJob::Image { source, settings } => {
                if self.config.dry_run {
                    return Ok(vec![(None, Vec::new())]);
                }
                let bytes = self.backend.convert_image(source, settings)?;
                Ok(vec![(None, bytes)])
            }
            ConversionJob::Pdf { source, settings } => {
                if self.config.dry_run {
                    let count = self.backend.pdf_page_count(source)?;
                    return Ok((1..=count).map(|page| (Some(page), Vec::new())).collect());
                }
                let pages = self.backend.convert_pdf(source, settings)?;
                Ok(pages
                    .into_iter()
                    .map(|EncodedPage { page, bytes }| (Some(page), bytes))
                    .collect())
            }
        }
    }

    fn convert(&mut self, job: &ConversionJob) -> Result<Vec<String>, ConvertError> {
        for capability in job.required_capabilities() {
            if !self.capabilities.supports(capability) {
                return Err(ConvertError::MissingCapability(capability));
            }
        }

        let produced = self.produce(job)?;

        let raw_name = job
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let base = apply_prefix(&slugify(&raw_name), &self.config.prefix);
        let extension = job.image_settings().format.extension();

        let mut outputs = Vec::with_capacity(produced.len());
        for (page, bytes) in produced {
            let name = self.claim(&output_file_name(&base, page, extension));
            if !self.config.dry_run {
                fs::write(self.config.output.join(&name), bytes)?;
                debug!("wrote {name}");
            }
            outputs.push(name);
        }
        Ok(outputs)
    }
}

/// Convert every matching file under `config.source` into `config.output`.
///
/// `on_event` is called once per source file, in processing order. In a dry
/// run nothing is decoded or written (PDFs are opened to count pages) and
/// the output directory is not created.
pub fn run(
    backend: &impl ConversionBackend,
    config: &RunConfig,
    mut on_event: impl FnMut(&ConvertEvent),
) -> Result<RunSummary, RunError> {
    let excluded = if config.dry_run {
        fs::canonicalize(&config.output).unwrap_or_else(|_| config.output.clone())
    } else {
        prepare_output_dir(&config.output)?
    };

    let sources = collect_sources(config, &excluded);
    info!(
        "{} matching files in {}",
        sources.len(),
        config.source.display()
    );

    let mut converter = Converter {
        backend,
        config,
        capabilities: backend.capabilities(),
        registry: NameRegistry::new(),
    };
    let mut summary = RunSummary {
        source: config.source.clone(),
        output: config.output.clone(),
        dry_run: config.dry_run,
        ..RunSummary::default()
    };

    for path in sources {
        let relative = path
            .strip_prefix(&config.source)
            .unwrap_or(&path)
            .to_path_buf();

        let event = match ConversionJob::new(&path, config) {
            Err(err) => ConvertEvent {
                source: relative,
                kind: JobKind::Other,
                outcome: Outcome::Skipped {
                    reason: err.to_string(),
                },
            },
            Ok(job) => {
                let outcome = match converter.convert(&job) {
                    Ok(outputs) => Outcome::Converted { outputs },
                    Err(err) => {
                        warn!("{}: {err}", relative.display());
                        Outcome::Failed {
                            error: err.to_string(),
                        }
                    }
                };
                ConvertEvent {
                    source: relative,
                    kind: job.kind(),
                    outcome,
                }
            }
        };

        on_event(&event);
        summary.record(event);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::imaging::OutputFormat;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"source").unwrap();
    }

    fn config_for(source: &Path, adjust: impl FnOnce(&mut Settings)) -> RunConfig {
        let mut settings = Settings {
            source: source.to_path_buf(),
            ..Settings::default()
        };
        adjust(&mut settings);
        settings.resolve(false).unwrap()
    }

    fn run_mock(backend: &MockBackend, config: &RunConfig) -> RunSummary {
        run(backend, config, |_| {}).unwrap()
    }

    fn output_names(config: &RunConfig) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&config.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn outputs_of(event: &ConvertEvent) -> Vec<String> {
        match &event.outcome {
            Outcome::Converted { outputs } => outputs.clone(),
            other => panic!("expected converted, got {other:?}"),
        }
    }

    // =========================================================================
    // Naming and collisions
    // =========================================================================

    #[test]
    fn same_slug_from_two_sources_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Mein Bild Ü.jpg");
        touch(tmp.path(), "Mein Bild Ü.png");
        let config = config_for(tmp.path(), |_| {});

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(summary.converted, 2);
        assert_eq!(outputs_of(&summary.events[0]), vec!["mein-bild-ue.webp"]);
        assert_eq!(outputs_of(&summary.events[1]), vec!["mein-bild-ue-001.webp"]);
        assert_eq!(
            output_names(&config),
            vec!["mein-bild-ue-001.webp", "mein-bild-ue.webp"]
        );
        // Mock bytes identify the source
        assert_eq!(
            fs::read(config.output.join("mein-bild-ue-001.webp")).unwrap(),
            b"Mein Bild \xc3\x9c.png"
        );
    }

    #[test]
    fn files_are_processed_in_name_order() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.jpg", "a.png", "b.tif"] {
            touch(tmp.path(), name);
        }
        let config = config_for(tmp.path(), |_| {});
        let backend = MockBackend::new();
        run_mock(&backend, &config);

        let sources: Vec<String> = backend
            .get_operations()
            .into_iter()
            .map(|op| match op {
                RecordedOp::Image { source, .. } => source,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(sources, vec!["a.png", "b.tif", "c.jpg"]);
    }

    #[test]
    fn prefix_is_applied_once() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Foo.jpg");
        touch(tmp.path(), "ABC123 Bar.jpg");
        let config = config_for(tmp.path(), |s| s.prefix = "ABC123".into());

        run_mock(&MockBackend::new(), &config);

        assert_eq!(
            output_names(&config),
            vec!["abc123-bar.webp", "abc123-foo.webp"]
        );
    }

    #[test]
    fn existing_outputs_are_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.jpg");
        let config = config_for(tmp.path(), |_| {});
        fs::create_dir_all(&config.output).unwrap();
        fs::write(config.output.join("photo.webp"), b"earlier run").unwrap();

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(outputs_of(&summary.events[0]), vec!["photo-001.webp"]);
        assert_eq!(
            fs::read(config.output.join("photo.webp")).unwrap(),
            b"earlier run"
        );
    }

    #[test]
    fn overwrite_replaces_existing_outputs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.jpg");
        let config = config_for(tmp.path(), |s| s.overwrite = true);
        fs::create_dir_all(&config.output).unwrap();
        fs::write(config.output.join("photo.webp"), b"earlier run").unwrap();

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(outputs_of(&summary.events[0]), vec!["photo.webp"]);
        assert_eq!(
            fs::read(config.output.join("photo.webp")).unwrap(),
            b"photo.jpg"
        );
    }

    // =========================================================================
    // Filtering and enumeration
    // =========================================================================

    #[test]
    fn extensions_outside_filter_are_ignored() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "keep.JPG");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "drop.png");
        let config = config_for(tmp.path(), |s| s.extensions = vec!["jpg".into()]);

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(summary.events.len(), 1);
        assert_eq!(output_names(&config), vec!["keep.webp"]);
    }

    #[test]
    fn unsupported_extension_in_filter_is_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "letter.docx");
        let config = config_for(tmp.path(), |s| s.extensions = vec!["docx".into()]);

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.events[0].kind, JobKind::Other);
        assert!(!summary.has_failures());
    }

    #[test]
    fn subdirectories_are_walked_unless_disabled() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.jpg");
        touch(tmp.path(), "nested/deep.jpg");

        let recursive = config_for(tmp.path(), |_| {});
        let summary = run_mock(&MockBackend::new(), &recursive);
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.events[0].source, PathBuf::from("nested/deep.jpg"));

        let flat = config_for(tmp.path(), |s| {
            s.recursive = false;
            s.output = Some(tmp.path().join("flat-out"));
        });
        let summary = run_mock(&MockBackend::new(), &flat);
        assert_eq!(summary.converted, 1);
    }

    #[test]
    fn output_directory_is_not_reconverted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.png");
        let config = config_for(tmp.path(), |s| s.format = OutputFormat::Png);

        run_mock(&MockBackend::new(), &config);
        let second = run_mock(&MockBackend::new(), &config);

        // Second run sees only photo.png, not output-web/photo.png
        assert_eq!(second.events.len(), 1);
        assert_eq!(
            output_names(&config),
            vec!["photo-001.png", "photo.png"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_sources_are_converted() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        touch(elsewhere.path(), "real.jpg");
        std::os::unix::fs::symlink(elsewhere.path().join("real.jpg"), tmp.path().join("Foto.jpg"))
            .unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("missing.jpg"), tmp.path().join("dangling.jpg"))
            .unwrap();
        let config = config_for(tmp.path(), |_| {});

        let summary = run_mock(&MockBackend::new(), &config);

        assert_eq!(summary.events.len(), 1);
        assert_eq!(summary.converted, 1);
        assert_eq!(output_names(&config), vec!["foto.webp"]);
    }

    #[test]
    fn hidden_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".hidden.jpg");
        touch(tmp.path(), "visible.jpg");
        let config = config_for(tmp.path(), |_| {});

        let summary = run_mock(&MockBackend::new(), &config);
        assert_eq!(summary.events.len(), 1);
    }

    // =========================================================================
    // PDFs
    // =========================================================================

    #[test]
    fn pdf_pages_get_page_segments() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Broschüre 2024.pdf");
        let config = config_for(tmp.path(), |s| s.format = OutputFormat::Jpg);
        let mut backend = MockBackend::new();
        backend.pdf_pages.insert("Broschüre 2024.pdf".into(), 5);

        let summary = run_mock(&backend, &config);

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.written, 5);
        assert_eq!(
            output_names(&config),
            (1..=5)
                .map(|n| format!("broschuere-2024-p{n:03}.jpg"))
                .collect::<Vec<_>>()
        );
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Pdf { zoom, format: OutputFormat::Jpg, .. } if *zoom == 2.0
        ));
    }

    #[test]
    fn pdf_without_renderer_fails_but_images_continue() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.pdf");
        touch(tmp.path(), "b.jpg");
        let config = config_for(tmp.path(), |_| {});
        let backend = MockBackend::with_capabilities(Capabilities {
            avif: true,
            pdf: false,
        });

        let summary = run_mock(&backend, &config);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.converted, 1);
        assert!(matches!(
            &summary.events[0].outcome,
            Outcome::Failed { error } if error.contains("PDF")
        ));
        // The PDF never reached the backend
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn avif_without_encoder_fails_each_job() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        let config = config_for(tmp.path(), |s| s.format = OutputFormat::Avif);
        let backend = MockBackend::with_capabilities(Capabilities {
            avif: false,
            pdf: true,
        });

        let summary = run_mock(&backend, &config);
        assert_eq!(summary.failed, 1);
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // Failures and dry runs
    // =========================================================================

    #[test]
    fn failure_does_not_stop_the_run_or_claim_a_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.bmp");
        touch(tmp.path(), "photo.jpg");
        let config = config_for(tmp.path(), |s| s.extensions = vec!["bmp".into(), "jpg".into()]);
        let backend = MockBackend {
            failing: vec!["photo.bmp".into()],
            ..MockBackend::default()
        };

        let mut seen = Vec::new();
        let summary = run(&backend, &config, |e| seen.push(e.source.clone())).unwrap();

        assert!(summary.has_failures());
        assert_eq!(seen.len(), 2);
        // photo.jpg gets the unsuffixed name because photo.bmp failed
        assert_eq!(output_names(&config), vec!["photo.webp"]);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "A.jpg");
        touch(tmp.path(), "a.png");
        touch(tmp.path(), "doc.pdf");
        let config = Settings {
            source: tmp.path().to_path_buf(),
            ..Settings::default()
        }
        .resolve(true)
        .unwrap();
        let mut backend = MockBackend::new();
        backend.pdf_pages.insert("doc.pdf".into(), 2);

        let summary = run_mock(&backend, &config);

        assert!(!config.output.exists());
        assert_eq!(summary.written, 4);
        assert_eq!(outputs_of(&summary.events[1]), vec!["a-001.webp"]);
        assert_eq!(
            outputs_of(&summary.events[2]),
            vec!["doc-p001.webp", "doc-p002.webp"]
        );
        assert!(
            backend
                .get_operations()
                .iter()
                .all(|op| matches!(op, RecordedOp::PageCount { .. }))
        );
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.jpg");
        // A regular file where the output directory should be
        fs::write(tmp.path().join("blocked"), b"").unwrap();
        let config = config_for(tmp.path(), |s| s.output = Some(tmp.path().join("blocked")));

        let result = run(&MockBackend::new(), &config, |_| {});
        assert!(matches!(result, Err(RunError::OutputNotCreatable { .. })));
    }

    // =========================================================================
    // Jobs and reports
    // =========================================================================

    #[test]
    fn job_kind_follows_extension() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(tmp.path(), |_| {});

        assert!(matches!(
            ConversionJob::new(Path::new("scan.TIFF"), &config),
            Ok(ConversionJob::Image { .. })
        ));
        let pdf = ConversionJob::new(Path::new("Doc.PDF"), &config).unwrap();
        assert_eq!(pdf.kind(), JobKind::Pdf);
        assert_eq!(pdf.required_capabilities(), vec![Capability::PdfRendering]);
        assert!(matches!(
            ConversionJob::new(Path::new("x.heic"), &config),
            Err(ConvertError::UnsupportedExtension(ext)) if ext == "heic"
        ));
    }

    #[test]
    fn report_lists_every_file() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        let config = config_for(tmp.path(), |_| {});
        let summary = run_mock(&MockBackend::new(), &config);

        let report = tmp.path().join("report.json");
        summary.write_report(&report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["converted"], 1);
        assert_eq!(json["events"][0]["status"], "converted");
        assert_eq!(json["events"][0]["kind"], "image");
        assert_eq!(json["events"][0]["outputs"][0], "a.webp");
    }

    #[test]
    fn backend_errors_map_to_job_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            ConvertError::from(BackendError::Io(io)),
            ConvertError::Filesystem(_)
        ));
        assert!(matches!(
            ConvertError::from(BackendError::TooLarge {
                path: PathBuf::from("x"),
                pixels: 1,
                limit: 0
            }),
            ConvertError::Decode(_)
        ));
    }
}
