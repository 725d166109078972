//! Latest known content per document.
//!
//! Editors push text; the watcher only reports paths. Both are recorded
//! here and resolved to source text when a render actually starts.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::DocUri;
use crate::render::RenderError;

/// Where a document's current content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Buffer text reported by the editor (may be unsaved).
    Text(Arc<str>),
    /// File on disk, read on demand.
    Disk(PathBuf),
}

impl Snapshot {
    /// Resolve to source text. Blocking for [`Snapshot::Disk`].
    pub fn read(&self) -> Result<Arc<str>, RenderError> {
        match self {
            Self::Text(text) => Ok(Arc::clone(text)),
            Self::Disk(path) => fs::read_to_string(path)
                .map(Arc::from)
                .map_err(|source| RenderError::Read {
                    path: path.display().to_string(),
                    source,
                }),
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: FxHashMap<DocUri, Snapshot>,
}

impl DocumentStore {
    pub fn set_text(&mut self, uri: DocUri, text: impl Into<Arc<str>>) {
        self.docs.insert(uri, Snapshot::Text(text.into()));
    }

    pub fn set_disk(&mut self, uri: DocUri, path: PathBuf) {
        self.docs.insert(uri, Snapshot::Disk(path));
    }

    pub fn get(&self, uri: &DocUri) -> Option<&Snapshot> {
        self.docs.get(uri)
    }

    /// Snapshot for `uri`, falling back to its file for `file://` URIs the
    /// store has not seen yet.
    pub fn resolve(&mut self, uri: &DocUri) -> Option<Snapshot> {
        if let Some(snapshot) = self.get(uri) {
            return Some(snapshot.clone());
        }
        let path = uri.to_file_path()?;
        self.set_disk(uri.clone(), path.clone());
        Some(Snapshot::Disk(path))
    }
}
