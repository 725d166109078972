use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::utils::path::{is_temp_file, normalize_path};

/// Editors emit several notify events per save; collect them for this long
/// after the last one before routing.
pub(super) const COALESCE_MS: u64 = 50;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Pure timing and per-path dedup. No filtering beyond editor artifacts.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record a notify event.
    ///
    /// Per path, a later `Removed` overrides earlier changes and a later
    /// create/modify restores a removed file; otherwise the first kind wins.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // mtime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            let next = match (self.changes.get(&path).copied(), kind) {
                (None, kind) => kind,
                (Some(ChangeKind::Removed), ChangeKind::Created | ChangeKind::Modified) => kind,
                (Some(_), ChangeKind::Removed) => ChangeKind::Removed,
                (Some(existing), _) => existing,
            };
            crate::debug!("watch"; "{}: {}", next.label(), path.display());
            self.changes.insert(path, next);
            self.last_event = Some(Instant::now());
        }
    }

    /// Take collected changes once the coalescing window has passed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|t| t.elapsed() >= Duration::from_millis(COALESCE_MS))
            && !self.changes.is_empty()
    }

    /// Time until the window could close; long when nothing is buffered.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        Duration::from_millis(COALESCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
