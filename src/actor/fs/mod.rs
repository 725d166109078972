//! FileSystem Actor
//!
//! Watches the project root and reports DBML changes to the coordinator.
//!
//! ```text
//! notify ──thread──▶ Debouncer (timing, dedup) ──▶ route ──▶ PipelineMsg
//! ```
//!
//! Removing the preview page is how the user closes the preview, so that
//! path is watched too and reported as [`PipelineMsg::SurfaceClosed`].

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::messages::PipelineMsg;
use crate::utils::path::normalize_path;

mod debouncer;


use debouncer::{ChangeKind, Debouncer};

/// Which paths matter to the pipeline.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    extensions: Vec<String>,
    preview_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl WatchFilter {
    pub fn new(extensions: &[String], preview_path: &Path) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        // Parent is canonicalized so it matches notify paths even after
        // the file itself is gone.
        let preview_path = match (preview_path.parent(), preview_path.file_name()) {
            (Some(parent), Some(name)) => normalize_path(parent).join(name),
            _ => normalize_path(preview_path),
        };
        Self {
            extensions,
            preview_path,
            config_path: None,
        }
    }

    /// Also report edits of the config file (they need a restart).
    pub fn with_config(mut self, config_path: &Path) -> Self {
        if !config_path.as_os_str().is_empty() {
            self.config_path = Some(normalize_path(config_path));
        }
        self
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Turn one batch of changes into pipeline messages, sorted by path.
    fn route(&self, changes: FxHashMap<PathBuf, ChangeKind>) -> Vec<PipelineMsg> {
        let mut changes: Vec<_> = changes.into_iter().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut messages = Vec::new();
        for (path, kind) in changes {
            if path == self.preview_path {
                // Renames away show up as modify events; trust the disk.
                if kind == ChangeKind::Removed || !path.exists() {
                    messages.push(PipelineMsg::SurfaceClosed);
                }
                continue;
            }
            if self.config_path.as_ref() == Some(&path) {
                crate::log!("watch"; "config changed, restart to apply");
                continue;
            }
            if !self.is_source(&path) || kind == ChangeKind::Removed || !path.is_file() {
                continue;
            }
            messages.push(PipelineMsg::FileChanged { path });
        }
        messages
    }
}

/// FileSystem Actor - watches the project for DBML edits on disk
pub struct FsActor {
    /// Sync channel fed by notify
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Must stay alive for events to flow
    _watcher: RecommendedWatcher,
    tx: mpsc::Sender<PipelineMsg>,
    debouncer: Debouncer,
    filter: WatchFilter,
}

impl FsActor {
    /// Start watching `root` recursively. Events buffer until [`run`](Self::run).
    pub fn new(
        root: &Path,
        filter: WatchFilter,
        tx: mpsc::Sender<PipelineMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(&normalize_path(root), RecursiveMode::Recursive)?;
        crate::debug!("watch"; "watching {}", root.display());

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            tx,
            debouncer: Debouncer::new(),
            filter,
        })
    }

    /// Run until the coordinator goes away.
    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            tx,
            mut debouncer,
            filter,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    for msg in filter.route(changes) {
                        if tx.send(msg).await.is_err() {
                            crate::debug!("watch"; "pipeline closed, stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}
