//! Document identity.
//!
//! Editors identify documents by URI; the file watcher only knows paths.
//! `DocUri` is the common key: paths become percent-encoded `file://`
//! URIs, anything else (e.g. `untitled:Untitled-1`) is kept verbatim.
//! `file://` URIs from hosts are decoded and re-encoded on the way in so an
//! editor URI and a watcher path for the same file share one key.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

const FILE_SCHEME: &str = "file://";

/// URI of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocUri(Arc<str>);

impl DocUri {
    /// Wrap a URI string reported by a host.
    pub fn new(uri: &str) -> Self {
        let uri = uri.trim();
        if uri.starts_with(FILE_SCHEME)
            && let Some(path) = Url::parse(uri).ok().and_then(|url| url.to_file_path().ok())
        {
            return Self::from_path(&path);
        }
        Self(Arc::from(uri))
    }

    /// Build a `file://` URI from a file system path.
    ///
    /// Relative paths cannot be expressed as a URL and are kept verbatim
    /// under the `file://` scheme.
    pub fn from_path(path: &Path) -> Self {
        match Url::from_file_path(path) {
            Ok(url) => Self(Arc::from(String::from(url))),
            Err(()) => Self(Arc::from(format!("{FILE_SCHEME}{}", path.display()))),
        }
    }

    /// File system path for `file://` URIs, percent-decoded.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.0.starts_with(FILE_SCHEME) {
            return None;
        }
        Url::parse(&self.0).ok()?.to_file_path().ok()
    }

    /// Whether the URI names a document with one of `extensions`.
    ///
    /// Compared case-insensitively against the last path segment, ignoring
    /// any query or fragment.
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        let path = self.0.split(['?', '#']).next().unwrap_or(&self.0);
        let name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Short label for status lines (file name for paths, full URI otherwise).
    pub fn label(&self) -> String {
        match self.to_file_path() {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.0.to_string()),
            None => self.0.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for DocUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

impl fmt::Display for DocUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
