//! Preview surface backed by an HTML file on disk.
//!
//! The page is rewritten atomically (temp file + rename) on every update so
//! a browser reload never sees a half-written document. Deleting the file
//! counts as closing the preview; the watcher reports it and the pipeline
//! fires the session's close hook.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::surface::{CloseHook, PreviewSurface, SurfaceHost};
use crate::utils::exec::Cmd;

/// Creates [`FileSurface`]s writing to one fixed path.
#[derive(Debug, Clone)]
pub struct FileSurfaceHost {
    path: PathBuf,
    open_browser: bool,
}

impl FileSurfaceHost {
    pub fn new(path: impl Into<PathBuf>, open_browser: bool) -> Self {
        Self {
            path: path.into(),
            open_browser,
        }
    }
}

impl SurfaceHost for FileSurfaceHost {
    fn create(&mut self, title: &str, on_close: CloseHook) -> Result<Box<dyn PreviewSurface>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create `{}`", parent.display()))?;
        }
        crate::debug!("preview"; "opening '{}' at {}", title, self.path.display());
        Ok(Box::new(FileSurface {
            path: self.path.clone(),
            open_browser: self.open_browser,
            visible: false,
            _on_close: on_close,
        }))
    }
}

/// One preview page on disk.
struct FileSurface {
    path: PathBuf,
    open_browser: bool,
    visible: bool,
    /// Fired by the pipeline when the watcher sees the file removed.
    _on_close: CloseHook,
}

impl PreviewSurface for FileSurface {
    fn set_html(&mut self, html: &str) -> Result<()> {
        write_atomic(&self.path, html.as_bytes())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn reveal(&mut self, _preserve_focus: bool) -> Result<()> {
        self.visible = true;
        crate::log!("preview"; "file://{}", self.path.display());
        if self.open_browser {
            open_in_browser(&self.path)?;
        }
        Ok(())
    }
}

/// Write `data` next to `path` and rename over it.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview.html".to_string());
    // Dot-prefixed so the watcher treats it as a temp file.
    let tmp = path.with_file_name(format!(".{name}.tmp"));

    fs::write(&tmp, data).with_context(|| format!("Failed to write `{}`", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace `{}`", path.display()))
}

/// Hand the page to the platform's default opener.
fn open_in_browser(path: &Path) -> Result<()> {
    let cmd = if cfg!(target_os = "macos") {
        Cmd::new("open").arg(path)
    } else if cfg!(windows) {
        Cmd::from_slice(&["cmd", "/C", "start", ""]).arg(path)
    } else {
        Cmd::new("xdg-open").arg(path)
    };
    cmd.run().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".dbml-preview/preview.html");
        let mut host = FileSurfaceHost::new(&path, false);

        host.create("DBML Graph", CloseHook::new()).unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_set_html_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preview.html");
        let mut host = FileSurfaceHost::new(&path, false);
        let mut surface = host.create("DBML Graph", CloseHook::new()).unwrap();

        surface.set_html("<p>one</p>").unwrap();
        surface.set_html("<p>two</p>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>two</p>");
        assert!(!dir.path().join(".preview.html.tmp").exists());
    }

    #[test]
    fn test_reveal_marks_visible() {
        let dir = TempDir::new().unwrap();
        let mut host = FileSurfaceHost::new(dir.path().join("preview.html"), false);
        let mut surface = host.create("DBML Graph", CloseHook::new()).unwrap();

        assert!(!surface.is_visible());
        surface.reveal(true).unwrap();
        assert!(surface.is_visible());
    }
}
