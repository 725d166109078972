//! Render Pipeline Coordinator
//!
//! Single consumer of [`PipelineMsg`]. Owns every piece of engine state
//! (session, scheduler, snapshot store, queued request) so no locks are
//! needed; event sources only send messages.
//!
//! ```text
//!            DocumentChanged            Fire
//!   Idle ───────────────────▶ Pending ───────▶ Rendering ──RenderDone──▶ Idle
//!    │                          │                  ▲   │
//!    └── Opened/FileChanged/Generate ──────────────┘   └─ queued? render again
//! ```
//!
//! At most one render is in flight. Edits keep going through the debounce
//! window while rendering; only a trigger that is due (a fire, or an
//! immediate trigger) is queued, replacing any earlier one. When the
//! in-flight render finishes with a request queued, its result is dropped
//! in favor of rendering the queued request from a fresh snapshot.
//! Failures are only reported for results that reach the preview.

mod store;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::PipelineMsg;
use super::scheduler::{Scheduler, TriggerToken};
use crate::config::PreviewConfig;
use crate::core::DocUri;
use crate::export::{self, ExportOutcome};
use crate::notice::Notifier;
use crate::preview::{SessionManager, SurfaceHost};
use crate::render::{self, Render, RenderResult};

pub use store::{DocumentStore, Snapshot};

const CHANNEL_BUFFER: usize = 256;

pub const NO_ACTIVE_DOCUMENT: &str =
    "No active DBML document. Open a DBML file to render it.";

/// Coarse pipeline state, derived from what is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A debounced trigger is waiting for quiescence.
    Pending,
    /// A render is running.
    Rendering,
}

/// Event-source tasks owned by the pipeline, released together.
#[derive(Default)]
pub struct Subscriptions(Vec<JoinHandle<()>>);

impl Subscriptions {
    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.0.push(handle);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn release(&mut self) {
        for handle in self.0.drain(..) {
            handle.abort();
        }
    }
}

struct InFlight {
    id: u64,
    uri: DocUri,
}

pub struct Coordinator {
    rx: mpsc::Receiver<PipelineMsg>,
    tx: mpsc::Sender<PipelineMsg>,
    renderer: Arc<dyn Render>,
    notifier: Arc<dyn Notifier>,
    extensions: Vec<String>,

    session: SessionManager,
    scheduler: Scheduler<DocUri>,
    store: DocumentStore,
    /// Most recently opened or edited DBML document.
    active: Option<DocUri>,
    in_flight: Option<InFlight>,
    queued: Option<DocUri>,
    next_render_id: u64,
    subscriptions: Subscriptions,
}

impl Coordinator {
    pub fn new(
        config: &PreviewConfig,
        renderer: Arc<dyn Render>,
        host: Box<dyn SurfaceHost>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let extensions = config
            .watch
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();

        Self {
            rx,
            tx,
            renderer,
            notifier,
            extensions,
            session: SessionManager::new(host, config.preview.title.clone()),
            scheduler: Scheduler::new(config.preview.debounce()),
            store: DocumentStore::default(),
            active: None,
            in_flight: None,
            queued: None,
            next_render_id: 0,
            subscriptions: Subscriptions::default(),
        }
    }

    /// Channel for event sources.
    pub fn sender(&self) -> mpsc::Sender<PipelineMsg> {
        self.tx.clone()
    }

    /// Hand an event-source task to the pipeline; it is aborted on teardown.
    pub fn subscribe(&mut self, handle: JoinHandle<()>) {
        self.subscriptions.push(handle);
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Rendering
        } else if self.scheduler.is_pending() {
            Phase::Pending
        } else {
            Phase::Idle
        }
    }

    /// Process messages until [`PipelineMsg::Shutdown`].
    pub async fn run(mut self) {
        crate::debug!("pipeline"; "start");
        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, PipelineMsg::Shutdown) {
                crate::debug!("pipeline"; "shutdown requested");
                break;
            }
            let before = self.phase();
            self.handle(msg).await;
            let after = self.phase();
            if before != after {
                crate::debug!("pipeline"; "{:?} -> {:?}", before, after);
            }
        }
        self.teardown();
    }

    async fn handle(&mut self, msg: PipelineMsg) {
        match msg {
            PipelineMsg::DocumentChanged { uri, text } => {
                if !self.accepts(&uri) {
                    return;
                }
                self.store.set_text(uri.clone(), text);
                self.active = Some(uri.clone());
                self.trigger_debounced(uri);
            }
            PipelineMsg::DocumentOpened { uri, text } => {
                if !self.accepts(&uri) {
                    return;
                }
                self.store.set_text(uri.clone(), text);
                self.active = Some(uri.clone());
                self.trigger_now(uri);
            }
            PipelineMsg::FileChanged { path } => {
                let uri = DocUri::from_path(&path);
                if !self.accepts(&uri) {
                    return;
                }
                self.store.set_disk(uri.clone(), path);
                self.active = Some(uri.clone());
                self.trigger_now(uri);
            }
            PipelineMsg::GenerateGraph { uri } => {
                let Some(uri) = self.target(uri) else {
                    return;
                };
                self.active = Some(uri.clone());
                self.trigger_now(uri);
            }
            PipelineMsg::ExportSvg { uri, dest } => {
                if let Some(uri) = self.target(uri) {
                    self.export(uri, dest).await;
                }
            }
            PipelineMsg::SurfaceClosed => {
                if self.session.is_open() {
                    crate::log!("preview"; "closed, reopens on the next change");
                }
                self.session.on_surface_closed();
            }
            PipelineMsg::Fire(token) => self.on_fire(token),
            PipelineMsg::RenderDone { id, result } => self.on_render_done(id, result),
            PipelineMsg::Shutdown => self.teardown(),
        }
    }

    fn accepts(&self, uri: &DocUri) -> bool {
        let ok = uri.has_extension(&self.extensions);
        if !ok {
            crate::debug!("pipeline"; "ignoring non-DBML document {}", uri);
        }
        ok
    }

    /// Document a manual command applies to. Notifies and returns `None`
    /// when there is nothing to act on.
    fn target(&mut self, requested: Option<DocUri>) -> Option<DocUri> {
        let uri = requested.or_else(|| self.active.clone());
        match uri {
            Some(uri) if self.store.resolve(&uri).is_some() => Some(uri),
            _ => {
                self.notifier.warning(NO_ACTIVE_DOCUMENT);
                None
            }
        }
    }

    /// Restart the quiet period, even while a render is running.
    fn trigger_debounced(&mut self, uri: DocUri) {
        self.scheduler.schedule(uri, &self.tx, PipelineMsg::Fire);
    }

    fn trigger_now(&mut self, uri: DocUri) {
        self.scheduler.cancel();
        if self.in_flight.is_some() {
            self.queue(uri);
            return;
        }
        self.start_render(uri);
    }

    fn queue(&mut self, uri: DocUri) {
        crate::debug!("pipeline"; "render in flight, queueing {}", uri.label());
        self.queued = Some(uri);
    }

    fn on_fire(&mut self, token: TriggerToken) {
        let Some(uri) = self.scheduler.accept(token) else {
            return;
        };
        if self.in_flight.is_some() {
            self.queue(uri);
            return;
        }
        self.start_render(uri);
    }

    /// Snapshot `uri` now and render it off the loop.
    fn start_render(&mut self, uri: DocUri) {
        let id = self.next_render_id;
        self.next_render_id += 1;

        let snapshot = self.store.resolve(&uri);
        let renderer = Arc::clone(&self.renderer);
        let tx = self.tx.clone();
        let label = uri.label();

        crate::debug!("render"; "#{} {}", id, label);
        self.in_flight = Some(InFlight { id, uri });

        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || render_snapshot(snapshot, renderer.as_ref()))
                    .await
                    .unwrap_or_else(|e| render::failure(&format!("render of {label} aborted: {e}")));

            // Receiver gone means the pipeline stopped.
            let _ = tx.send(PipelineMsg::RenderDone { id, result }).await;
        });
    }

    fn on_render_done(&mut self, id: u64, result: RenderResult) {
        let uri = match self.in_flight.take() {
            Some(current) if current.id == id => current.uri,
            other => {
                self.in_flight = other;
                crate::debug!("render"; "dropping result of #{}", id);
                return;
            }
        };

        if let Some(next) = self.queued.take() {
            crate::debug!("render"; "#{} superseded, rendering {}", id, next.label());
            self.start_render(next);
            return;
        }
        self.apply(uri, result);
    }

    /// Push a finished render into the preview.
    fn apply(&mut self, uri: DocUri, result: RenderResult) {
        render::report(&result, self.notifier.as_ref());
        let success = result.is_success();
        if self.session.ensure_open().is_none() {
            return;
        }
        if self.session.trigger_source() != Some(&uri) {
            crate::debug!("preview"; "now showing {}", uri);
        }
        self.session.set_trigger_source(uri.clone());
        self.session.display_last_good_or(result.svg_or_empty());
        self.session.reveal();

        if success {
            self.notifier.info(&format!("rendered {}", uri.label()));
        }
    }

    async fn export(&mut self, uri: DocUri, dest: Option<PathBuf>) {
        let snapshot = self.store.resolve(&uri);
        let renderer = Arc::clone(&self.renderer);
        let notifier = Arc::clone(&self.notifier);

        let joined = tokio::task::spawn_blocking(move || {
            let source = match read_snapshot(snapshot) {
                Ok(source) => source,
                Err(e) => {
                    render::report(&render::failure(&e.to_string()), notifier.as_ref());
                    return Ok(ExportOutcome::RenderFailed);
                }
            };
            export::export_svg(renderer.as_ref(), &source, notifier.as_ref(), || dest)
        })
        .await;

        let err = match joined {
            Ok(Ok(outcome)) => {
                crate::debug!("export"; "{}: {:?}", uri.label(), outcome);
                return;
            }
            Ok(Err(e)) => anyhow::Error::from(e),
            Err(e) => anyhow::Error::from(e),
        };
        self.notifier.error(&format!("Failed to save SVG: {err:#}"));
    }

    fn teardown(&mut self) {
        self.scheduler.cancel();
        self.queued = None;
        if !self.subscriptions.is_empty() {
            crate::debug!("pipeline"; "releasing {} subscriptions", self.subscriptions.len());
        }
        self.subscriptions.release();
        crate::debug!("pipeline"; "stopped");
    }
}

fn read_snapshot(snapshot: Option<Snapshot>) -> Result<Arc<str>, render::RenderError> {
    match snapshot {
        Some(snapshot) => snapshot.read(),
        None => Err(render::RenderError::Failed(
            "document content is not available".into(),
        )),
    }
}

fn render_snapshot(snapshot: Option<Snapshot>, renderer: &dyn Render) -> RenderResult {
    match read_snapshot(snapshot) {
        Ok(source) => render::try_convert(renderer, &source),
        Err(e) => render::failure(&e.to_string()),
    }
}
