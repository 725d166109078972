//! Common utilities shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::PreviewConfig;
use crate::render::CommandRenderer;
use crate::utils::path::normalize_path;

/// Renderer configured by `[render]`, run from the project root.
pub fn renderer(config: &PreviewConfig) -> CommandRenderer {
    CommandRenderer::new(config.render.command.clone()).with_cwd(&config.root)
}

/// Absolute path of a DBML file named on the command line.
pub fn source_path(input: &Path, config: &PreviewConfig) -> Result<PathBuf> {
    let path = normalize_path(input);
    if !path.is_file() {
        bail!("`{}` is not a file", input.display());
    }
    if !config.is_watched(&path) {
        crate::log!(
            "warning";
            "`{}` does not have a DBML extension ({})",
            input.display(),
            config.watch.extensions.join(", ")
        );
    }
    Ok(path)
}

pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read `{}`", path.display()))
}
