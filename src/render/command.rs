//! Renderer backed by an external process.
//!
//! The default command is the `dbml-renderer` CLI reading DBML from stdin:
//!
//! ```text
//! dbml-renderer -i - -f svg  < schema.dbml  > schema.svg
//! ```

use std::path::PathBuf;

use super::{Render, RenderError, SvgMarkup};
use crate::utils::exec::Cmd;

/// Pipes DBML into a renderer command and reads SVG from its stdout.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandRenderer {
    /// `command[0]` is the program, the rest its arguments.
    pub fn new(command: Vec<String>) -> Self {
        Self { command, cwd: None }
    }

    /// Run the renderer from `dir` (so relative program paths resolve there).
    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }
}

impl Render for CommandRenderer {
    fn render(&self, source: &str) -> Result<SvgMarkup, RenderError> {
        let mut cmd = Cmd::from_slice(&self.command).stdin(source);
        if let Some(dir) = &self.cwd {
            cmd = cmd.cwd(dir);
        }

        let output = cmd.output().map_err(|source| RenderError::Spawn {
            program: self.program().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(first_error_line(&stderr)));
        }

        let svg = String::from_utf8(output.stdout).map_err(|_| RenderError::Encoding)?;
        if svg.trim().is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(SvgMarkup::new(svg))
    }
}

/// Reduce renderer stderr to the message worth showing.
///
/// Node-based renderers print the error message followed by a stack trace;
/// only the lines before the first `    at ` frame are kept.
fn first_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .take_while(|line| !line.trim_start().starts_with("at "))
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
