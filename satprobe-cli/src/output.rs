//! Text and JSON rendering for command results
//!
//! Command handlers build a payload and hand it to [`OutputWriter`]; they never
//! look at `--output` themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads in the format chosen with `--output`.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write `payload` to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Write `payload` to `w`. JSON output is pretty-printed and newline-terminated.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        if self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut *w, payload)?;
            writeln!(w)?;
        } else {
            payload.render_text(w)?;
        }
        Ok(())
    }
}

/// Human-readable form of a payload; the JSON form comes from `Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
