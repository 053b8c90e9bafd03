use clap::{Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webprep::config::{self, CONFIG_FILE_NAME, Settings};
use webprep::imaging::{Capabilities, ConversionBackend, OutputFormat, RustBackend, pdf};
use webprep::{convert, output, prompt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    let hash = env!("GIT_HASH");
    if on_tag == "true" || hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "webprep")]
#[command(about = "Convert images and PDFs into web-ready files with clean names")]
#[command(long_about = "\
Convert images and PDFs into web-ready files with clean names

Every matching file in the source directory is resized to a maximum width,
re-encoded, and written to one flat output directory under a lowercase,
ASCII-only name that WordPress and other CMSs accept unchanged:

  scans/
  ├── Mein Bild Ü.jpg          → output-web/mein-bild-ue.webp
  ├── Mein Bild Ü.png          → output-web/mein-bild-ue-001.webp
  ├── Straße 123.tif           → output-web/strasse-123.webp
  └── Broschüre.pdf            → output-web/broschuere-p001.webp
                                 output-web/broschuere-p002.webp

Settings are read from webprep.toml in the source directory (or --config),
then from flags, then from the prompts of --interactive.

Run 'webprep gen-config' to generate a documented webprep.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,

    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock webprep.toml with all options documented
    GenConfig,
    /// Show which optional capabilities (AVIF, PDF) are available
    Capabilities {
        /// pdfium library file or directory
        #[arg(long)]
        pdfium: Option<PathBuf>,
    },
}

/// Flags for the conversion run. Unset flags leave config file values alone.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory with the source files [default: .]
    #[arg(long)]
    source: Option<PathBuf>,

    /// Flat output directory [default: <source>/output-web]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Filename prefix, e.g. a project number
    #[arg(long)]
    prefix: Option<String>,

    /// Comma-separated extensions to convert [default: tif,jpg,jpeg,png,pdf]
    #[arg(long)]
    extensions: Option<String>,

    /// Output format: avif, webp, png or jpg [default: webp]
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Maximum output width in pixels [default: 1920]
    #[arg(long)]
    width: Option<u32>,

    /// Encoding quality 0-100, ignored for png [default: 80]
    #[arg(long)]
    quality: Option<u32>,

    /// PDF render zoom, 1.0 = 72 DPI [default: 2.0]
    #[arg(long)]
    zoom: Option<f32>,

    /// Only convert files directly inside the source directory
    #[arg(long)]
    no_recursive: bool,

    /// Replace files left in the output directory by earlier runs
    #[arg(long)]
    overwrite: bool,

    /// pdfium library file or directory containing it
    #[arg(long)]
    pdfium: Option<PathBuf>,

    /// Config file [default: <source>/webprep.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ask for every setting before converting
    #[arg(short, long)]
    interactive: bool,

    /// Show the output names without converting anything
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON report of every file's outcome
    #[arg(long)]
    report: Option<PathBuf>,
}

impl ConvertArgs {
    /// Flags given on the command line, as a TOML overlay.
    fn overlay(&self) -> toml::Value {
        let mut table = toml::Table::new();
        let path = |p: &Path| toml::Value::from(p.display().to_string());

        if let Some(source) = &self.source {
            table.insert("source".into(), path(source));
        }
        if let Some(output) = &self.output {
            table.insert("output".into(), path(output));
        }
        if let Some(prefix) = &self.prefix {
            table.insert("prefix".into(), prefix.as_str().into());
        }
        if let Some(extensions) = &self.extensions {
            table.insert(
                "extensions".into(),
                config::parse_extension_list(extensions).into(),
            );
        }
        if let Some(format) = self.format {
            table.insert("format".into(), format.to_string().into());
        }
        if let Some(width) = self.width {
            table.insert("width".into(), width.into());
        }
        if let Some(quality) = self.quality {
            table.insert("quality".into(), quality.into());
        }
        if let Some(zoom) = self.zoom {
            table.insert("zoom".into(), zoom.into());
        }
        if self.no_recursive {
            table.insert("recursive".into(), false.into());
        }
        if self.overwrite {
            table.insert("overwrite".into(), true.into());
        }
        if let Some(pdfium) = &self.pdfium {
            table.insert("pdfium".into(), path(pdfium));
        }
        toml::Value::Table(table)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();
}

/// Bind pdfium if possible. Failure only disables PDF conversion.
fn build_backend(pdfium_hint: Option<&Path>) -> RustBackend {
    match pdf::bind_pdfium(pdfium_hint) {
        Ok(pdfium) => {
            info!("pdfium bound");
            RustBackend::with_pdfium(pdfium)
        }
        Err(e) => {
            info!("pdfium not available: {e:?}");
            RustBackend::new()
        }
    }
}

fn warn_missing(capabilities: &Capabilities) {
    for capability in capabilities.missing() {
        warn!("{capability} is not available: {}", capability.hint());
    }
}

/// Collect settings from the defaults, the config file and the flags.
fn load_settings(args: &ConvertArgs) -> Result<Settings, Box<dyn Error>> {
    let cli = args.overlay();

    let config_file = match &args.config {
        Some(path) if !path.is_file() => {
            return Err(format!("config file {} not found", path.display()).into());
        }
        Some(path) => path.clone(),
        None => args
            .source
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE_NAME),
    };

    let mut overlays = Vec::new();
    if let Some(file) = config::load_raw_config(&config_file)? {
        info!("using config {}", config_file.display());
        overlays.push(file);
    }
    overlays.push(cli);

    Ok(config::resolve_settings(overlays)?)
}

fn run_convert(args: ConvertArgs) -> Result<ExitCode, Box<dyn Error>> {
    let mut settings = load_settings(&args)?;
    let mut prompter = if args.interactive {
        let mut prompter = prompt::terminal()?;
        settings = prompter.ask_settings(settings)?;
        Some(prompter)
    } else {
        None
    };

    let backend = build_backend(settings.pdfium.as_deref());
    let capabilities = backend.capabilities();
    warn_missing(&capabilities);

    let unsupported = Capabilities::for_format(settings.format)
        .filter(|needed| !capabilities.supports(*needed));
    if let (Some(prompter), Some(needed)) = (prompter.as_mut(), unsupported) {
        if !prompter.confirm_missing(needed)? {
            println!("Cancelled, nothing converted.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let config = settings.resolve(args.dry_run)?;
    if let Some(notice) = output::format_prefix_notice(&config.raw_prefix, &config.prefix) {
        println!("{notice}");
    }
    for line in output::format_config(&config) {
        println!("{line}");
    }
    println!();

    let summary = convert::run(&backend, &config, output::print_event)?;
    output::print_summary(&summary);

    if let Some(report) = &args.report {
        summary.write_report(report)?;
        info!("report written to {}", report.display());
    }

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Some(Command::GenConfig) => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Capabilities { pdfium }) => {
            let backend = build_backend(pdfium.as_deref().or(cli.args.pdfium.as_deref()));
            output::print_capabilities(&backend.capabilities());
            Ok(ExitCode::SUCCESS)
        }
        None => run_convert(cli.args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
