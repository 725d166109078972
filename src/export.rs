//! One-shot "save as SVG".
//!
//! Renders the source, asks for a destination only when rendering worked,
//! and writes the markup as UTF-8. Never touches the live preview.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::notice::Notifier;
use crate::render::{self, Render, RenderResult};

pub const SAVED_MESSAGE: &str = "SVG file saved successfully.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// No destination was chosen.
    Cancelled,
    /// Rendering failed; already reported through the notifier.
    RenderFailed,
}

/// Append `.svg` unless the destination already ends with it.
pub fn normalize_destination(dest: &Path) -> PathBuf {
    let has_svg = dest
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if has_svg {
        return dest.to_path_buf();
    }
    let mut name = OsString::from(dest.as_os_str());
    name.push(".svg");
    PathBuf::from(name)
}

/// Render `source` and save it where `choose_dest` says.
///
/// `choose_dest` runs only after a successful render; `None` or an empty
/// path cancels silently.
pub fn export_svg(
    renderer: &dyn Render,
    source: &str,
    notifier: &dyn Notifier,
    choose_dest: impl FnOnce() -> Option<PathBuf>,
) -> Result<ExportOutcome, ExportError> {
    let svg = match render::convert(renderer, source, notifier) {
        RenderResult::Success { svg } => svg,
        RenderResult::Failure { .. } => return Ok(ExportOutcome::RenderFailed),
    };

    let Some(dest) = choose_dest().filter(|p| !p.as_os_str().is_empty()) else {
        crate::debug!("export"; "save cancelled");
        return Ok(ExportOutcome::Cancelled);
    };
    let dest = normalize_destination(&dest);

    fs::write(&dest, svg.as_str().as_bytes()).map_err(|source| ExportError::Write {
        path: dest.clone(),
        source,
    })?;

    notifier.info(SAVED_MESSAGE);
    crate::debug!("export"; "wrote {}", dest.display());
    Ok(ExportOutcome::Saved(dest))
}
