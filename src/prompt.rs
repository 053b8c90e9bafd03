//! Interactive configuration questions.
//!
//! `webprep -i` asks for every run setting in turn, showing the value that
//! would be used as the default in brackets. An empty answer (or end of
//! input) keeps it; an invalid answer prints the reason and asks again.
//! Ctrl-C cancels the run.
//!
//! ```text
//! Source directory [.]: ~/scans
//! Output directory [~/scans/output-web]:
//! Filename prefix (letters and digits, - for none) []: ABC123
//! File extensions to convert [tif,jpg,jpeg,png,pdf]: jpg, png
//! Output format (avif, webp, png, jpg) [webp]: jpeg
//! Maximum width in pixels [1920]:
//! Quality 0-100 [80]: 85
//! PDF zoom (1.0 = 72 DPI) [2]:
//! ```
//!
//! On a terminal, answers are read through rustyline so the line can be
//! edited. Piped input and tests go through [`BufferedInput`], which reads
//! lines from any `BufRead` and writes prompts to any `Write`.

use crate::config::{DEFAULT_OUTPUT_DIR, Settings, parse_extension_list};
use crate::imaging::{Capability, OutputFormat};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt::Display;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Answer typed at the prefix question to clear a configured prefix.
pub const NO_PREFIX: &str = "-";

/// Outcome of reading one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Source of answer lines.
pub trait LineInput {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent>;

    /// Show a message between questions.
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

impl<T: LineInput + ?Sized> LineInput for Box<T> {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        (**self).read_line(prompt)
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        (**self).notice(message)
    }
}

/// Line input from a reader, prompts to a writer.
pub struct BufferedInput<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> BufferedInput<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LineInput for BufferedInput<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }
}

/// Line-editing terminal input.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    pub fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new().map_err(map_io_err)?;
        Ok(Self { editor })
    }
}

impl LineInput for EditorInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(err) => convert_readline_error(err),
        }
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        println!("{message}");
        Ok(())
    }
}

fn convert_readline_error(err: ReadlineError) -> io::Result<InputEvent> {
    match err {
        ReadlineError::Interrupted => Ok(InputEvent::Interrupted),
        ReadlineError::Eof => Ok(InputEvent::Eof),
        ReadlineError::Io(io_err) => Err(io_err),
        other => Err(io::Error::other(other)),
    }
}

fn map_io_err(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(io_err) => io_err,
        other => io::Error::other(other),
    }
}

pub struct Prompter<I> {
    input: I,
}

impl<R: BufRead, W: Write> Prompter<BufferedInput<R, W>> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_input(BufferedInput::new(input, output))
    }
}

/// Prompter on the process's terminal, or on plain stdin when it is piped.
pub fn terminal() -> io::Result<Prompter<Box<dyn LineInput>>> {
    let input: Box<dyn LineInput> = if io::stdin().is_terminal() {
        Box::new(EditorInput::new()?)
    } else {
        Box::new(BufferedInput::new(io::stdin().lock(), io::stdout()))
    };
    Ok(Prompter::with_input(input))
}

impl<I: LineInput> Prompter<I> {
    pub fn with_input(input: I) -> Self {
        Self { input }
    }

    /// Ask one question. `None` means keep the default.
    fn ask(&mut self, question: &str, default: &str) -> io::Result<Option<String>> {
        match self.input.read_line(&format!("{question} [{default}]: "))? {
            InputEvent::Line(line) => {
                let answer = line.trim();
                Ok((!answer.is_empty()).then(|| answer.to_string()))
            }
            InputEvent::Eof => Ok(None),
            InputEvent::Interrupted => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "cancelled at the prompt",
            )),
        }
    }

    /// Ask until the answer parses and passes `check`.
    fn ask_parsed<T>(
        &mut self,
        question: &str,
        current: T,
        check: impl Fn(&T) -> Result<(), String>,
    ) -> io::Result<T>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        loop {
            let Some(answer) = self.ask(question, &current.to_string())? else {
                return Ok(current);
            };
            match answer.parse::<T>() {
                Ok(value) => match check(&value) {
                    Ok(()) => return Ok(value),
                    Err(reason) => self.input.notice(&format!("  {reason}"))?,
                },
                Err(e) => self
                    .input
                    .notice(&format!("  invalid value '{answer}': {e}"))?,
            }
        }
    }

    /// Ask every run setting, starting from `settings` as defaults.
    pub fn ask_settings(&mut self, settings: Settings) -> io::Result<Settings> {
        let mut s = settings;

        if let Some(source) = self.ask("Source directory", &s.source.display().to_string())? {
            s.source = PathBuf::from(source);
        }

        let output_default = match &s.output {
            Some(out) => out.display().to_string(),
            None => s.source.join(DEFAULT_OUTPUT_DIR).display().to_string(),
        };
        if let Some(output) = self.ask("Output directory", &output_default)? {
            s.output = Some(PathBuf::from(output));
        }

        let prefix_question = "Filename prefix (letters and digits, - for none)";
        if let Some(prefix) = self.ask(prefix_question, &s.prefix)? {
            s.prefix = if prefix == NO_PREFIX {
                String::new()
            } else {
                prefix
            };
        }

        loop {
            let Some(answer) = self.ask("File extensions to convert", &s.extensions.join(","))?
            else {
                break;
            };
            let parsed = parse_extension_list(&answer);
            if parsed.is_empty() {
                self.input.notice("  enter at least one extension")?;
                continue;
            }
            s.extensions = parsed;
            break;
        }

        s.format = self.ask_parsed(
            "Output format (avif, webp, png, jpg)",
            s.format,
            |_: &OutputFormat| Ok(()),
        )?;
        s.width = self.ask_parsed("Maximum width in pixels", s.width, |w: &u32| {
            if *w == 0 {
                Err("width must be positive".to_string())
            } else {
                Ok(())
            }
        })?;
        s.quality = self.ask_parsed("Quality 0-100", s.quality, |q: &u32| {
            if *q > 100 {
                Err("quality must be between 0 and 100".to_string())
            } else {
                Ok(())
            }
        })?;
        s.zoom = self.ask_parsed("PDF zoom (1.0 = 72 DPI)", s.zoom, |z: &f32| {
            if z.is_finite() && *z > 0.0 {
                Ok(())
            } else {
                Err("zoom must be a positive number".to_string())
            }
        })?;

        Ok(s)
    }

    /// Ask whether to convert although `capability` is missing.
    ///
    /// Only `y`/`yes` proceeds; an empty answer or end of input declines.
    pub fn confirm_missing(&mut self, capability: Capability) -> io::Result<bool> {
        let question =
            format!("{capability} is not available, every file will fail. Proceed anyway (y/n)");
        loop {
            let Some(answer) = self.ask(&question, "n")? else {
                return Ok(false);
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.input.notice("  answer y or n")?,
            }
        }
    }
}
