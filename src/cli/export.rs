//! `export` and `render` commands: one-shot conversions outside the live
//! preview.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::common::{read_source, renderer, source_path};
use crate::config::PreviewConfig;
use crate::export::{ExportOutcome, export_svg};
use crate::log;
use crate::notice::StatusNotifier;
use crate::render::Render;

/// Render `input` and save it as SVG, prompting for the destination when
/// `output` is not given.
pub fn run_export(input: &Path, output: Option<&Path>, config: &PreviewConfig) -> Result<()> {
    let path = source_path(input, config)?;
    let source = read_source(&path)?;
    let renderer = renderer(config);

    let choose = || match output {
        Some(dest) => Some(dest.to_path_buf()),
        None => prompt_destination(io::stdin().lock(), &mut io::stderr()).unwrap_or_else(|e| {
            log!("export"; "failed to read destination: {}", e);
            None
        }),
    };

    match export_svg(&renderer, &source, &StatusNotifier, choose)? {
        ExportOutcome::Saved(dest) => {
            log!("export"; "saved {}", dest.display());
            Ok(())
        }
        ExportOutcome::Cancelled => Ok(()),
        ExportOutcome::RenderFailed => bail!("failed to render `{}`", input.display()),
    }
}

/// Render `input` and write the SVG to stdout.
pub fn run_render(input: &Path, config: &PreviewConfig) -> Result<()> {
    let path = source_path(input, config)?;
    let source = read_source(&path)?;

    let svg = renderer(config)
        .render(&source)
        .with_context(|| format!("Error generating SVG for `{}`", input.display()))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(svg.as_str().as_bytes())?;
    if !svg.as_str().ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Ask where to save. An empty answer or end of input cancels.
fn prompt_destination(
    mut input: impl BufRead,
    prompt: &mut impl Write,
) -> io::Result<Option<PathBuf>> {
    write!(prompt, "Save SVG as (empty to cancel): ")?;
    prompt.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
}
