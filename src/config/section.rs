//! Configuration sections.
//!
//! # Example
//!
//! ```toml
//! [preview]
//! debounce_ms = 200                      # Quiet period after in-editor edits
//! output = ".dbml-preview/preview.html"  # Preview page (relative to root)
//! title = "DBML Graph"                   # Page title
//! open = false                           # Open the page in a browser
//!
//! [render]
//! command = ["dbml-renderer", "-i", "-", "-f", "svg"]
//!
//! [watch]
//! extensions = ["dbml"]                  # Files that refresh the preview
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::preview::DEFAULT_TITLE;

/// `[preview]` - live preview surface and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSection {
    /// Quiet period before an in-editor edit triggers a render.
    pub debounce_ms: u64,

    /// Preview page path.
    pub output: PathBuf,

    /// Preview page title.
    pub title: String,

    /// Open the preview page in the default browser on first reveal.
    pub open: bool,
}

impl PreviewSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            output: PathBuf::from(".dbml-preview/preview.html"),
            title: DEFAULT_TITLE.to_string(),
            open: false,
        }
    }
}

/// `[render]` - external DBML-to-SVG renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Program and arguments; DBML goes to stdin, SVG is read from stdout.
    pub command: Vec<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            command: ["dbml-renderer", "-i", "-", "-f", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RenderSection {
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}

/// `[watch]` - which files refresh the preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// File extensions (without dot) treated as DBML sources.
    pub extensions: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            extensions: vec!["dbml".to_string()],
        }
    }
}
