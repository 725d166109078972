use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use super::*;
use crate::config::test_parse_config;
use crate::notice::testing::RecordingNotifier;
use crate::preview::testing::{FakeHost, FakeHostState};
use crate::render::testing::FakeRenderer;

const VALID: &str = "Table users { id integer }";
const INVALID: &str = "Table users {";

struct Harness {
    coordinator: Coordinator,
    renderer: Arc<FakeRenderer>,
    notifier: Arc<RecordingNotifier>,
    host: FakeHostState,
}

impl Harness {
    fn new() -> Self {
        let config = test_parse_config("");
        let renderer = Arc::new(FakeRenderer::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let host = FakeHost::default();
        let state = host.state.clone();
        let coordinator = Coordinator::new(
            &config,
            renderer.clone(),
            Box::new(host),
            notifier.clone(),
        );
        Self {
            coordinator,
            renderer,
            notifier,
            host: state,
        }
    }

    async fn push(&mut self, msg: PipelineMsg) {
        self.coordinator.handle(msg).await;
    }

    /// Drain messages until nothing is pending or rendering.
    async fn settle(&mut self) {
        loop {
            match self.coordinator.rx.try_recv() {
                Ok(msg) => self.coordinator.handle(msg).await,
                Err(_) if self.coordinator.phase() == Phase::Idle => break,
                Err(_) => {
                    let msg = self.coordinator.rx.recv().await.unwrap();
                    self.coordinator.handle(msg).await;
                }
            }
        }
    }

    fn html(&self) -> String {
        self.host.latest_html().unwrap_or_default()
    }

    fn writes(&self) -> usize {
        self.host.latest_log(|log| log.writes).unwrap_or(0)
    }
}

fn uri(name: &str) -> DocUri {
    DocUri::new(&format!("file:///project/{name}"))
}

fn changed(name: &str, text: &str) -> PipelineMsg {
    PipelineMsg::DocumentChanged {
        uri: uri(name),
        text: text.to_string(),
    }
}

fn opened(name: &str, text: &str) -> PipelineMsg {
    PipelineMsg::DocumentOpened {
        uri: uri(name),
        text: text.to_string(),
    }
}

// ============================================================================
// debouncing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_renders_once_with_last_snapshot() {
    let mut h = Harness::new();

    // 10 keystrokes within 150ms
    for i in 0..10 {
        h.push(changed("a.dbml", &format!("Table t{i} {{ id integer }}")))
            .await;
        assert_eq!(h.coordinator.phase(), Phase::Pending);
        if i < 9 {
            sleep(Duration::from_millis(15)).await;
        }
    }
    let last_edit = Instant::now();

    h.settle().await;

    assert!(last_edit.elapsed() >= Duration::from_millis(200));
    assert_eq!(h.renderer.calls(), vec!["Table t9 { id integer }".to_string()]);
    assert!(h.html().contains("<text>t9</text>"));
    assert_eq!(h.host.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_then_valid_within_burst() {
    let mut h = Harness::new();

    h.push(changed("a.dbml", INVALID)).await;
    sleep(Duration::from_millis(50)).await;
    h.push(changed("a.dbml", VALID)).await;
    h.settle().await;

    assert_eq!(h.renderer.calls(), vec![VALID.to_string()]);
    assert!(h.notifier.errors().is_empty());
    assert!(h.html().contains("<text>users</text>"));
}

#[tokio::test(start_paused = true)]
async fn test_edits_after_quiet_period_render_again() {
    let mut h = Harness::new();

    h.push(changed("a.dbml", "Table one { id int }")).await;
    h.settle().await;
    h.push(changed("a.dbml", "Table two { id int }")).await;
    h.settle().await;

    assert_eq!(h.renderer.calls().len(), 2);
    assert!(h.html().contains("<text>two</text>"));
    assert_eq!(h.host.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_opened_bypasses_debounce() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    assert_eq!(h.coordinator.phase(), Phase::Rendering);

    let start = Instant::now();
    h.settle().await;
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(h.renderer.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_generate_cancels_pending_edit() {
    let mut h = Harness::new();

    h.push(changed("a.dbml", VALID)).await;
    assert_eq!(h.coordinator.phase(), Phase::Pending);

    h.push(PipelineMsg::GenerateGraph { uri: None }).await;
    assert_eq!(h.coordinator.phase(), Phase::Rendering);
    h.settle().await;

    sleep(Duration::from_secs(1)).await;
    assert!(h.coordinator.rx.try_recv().is_err());
    assert_eq!(h.renderer.calls(), vec![VALID.to_string()]);
}

// ============================================================================
// failure handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failure_after_success_keeps_prior_diagram() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;
    let good = h.html();
    assert!(good.contains("<text>users</text>"));

    h.push(changed("a.dbml", INVALID)).await;
    h.settle().await;

    assert!(h.html().contains("<text>users</text>"));
    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Error generating SVG: "));
    assert_eq!(
        h.coordinator.session.last_rendered_svg().unwrap().as_str(),
        "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>users</text></svg>"
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_failure_shows_empty_canvas() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", INVALID)).await;
    h.settle().await;

    assert_eq!(h.host.created(), 1);
    assert!(!h.html().contains("<svg"));
    assert_eq!(h.notifier.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_after_failure() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", "Table v1 { id int }")).await;
    h.settle().await;
    h.push(changed("a.dbml", INVALID)).await;
    h.settle().await;
    h.push(changed("a.dbml", "Table v2 { id int }")).await;
    h.settle().await;

    let html = h.html();
    assert!(html.contains("<text>v2</text>"));
    assert!(!html.contains("<text>v1</text>"));
}

// ============================================================================
// session lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_session_reused() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;
    h.push(opened("b.dbml", "Table orders { id int }")).await;
    h.settle().await;

    assert_eq!(h.host.created(), 1);
    assert_eq!(h.coordinator.session.trigger_source(), Some(&uri("b.dbml")));
    // revealed once, focus preserved
    assert_eq!(h.host.latest_log(|l| l.reveals.clone()).unwrap(), vec![true]);
}

#[tokio::test(start_paused = true)]
async fn test_closed_surface_recreated_on_next_trigger() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;
    h.push(PipelineMsg::SurfaceClosed).await;
    assert!(!h.coordinator.session.is_open());

    // Nothing happens until the next trigger.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.host.created(), 1);

    h.push(changed("a.dbml", INVALID)).await;
    h.settle().await;

    assert_eq!(h.host.created(), 2);
    // last good belongs to the closed session
    assert!(!h.html().contains("<svg"));
}

#[tokio::test(start_paused = true)]
async fn test_surface_closed_by_user_is_detected() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;
    h.host.close_latest();

    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;
    assert_eq!(h.host.created(), 2);
}

// ============================================================================
// serialization of renders
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_trigger_during_render_is_queued() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", "Table first { id int }")).await;
    assert_eq!(h.coordinator.phase(), Phase::Rendering);

    h.push(opened("a.dbml", "Table second { id int }")).await;
    h.push(opened("a.dbml", "Table third { id int }")).await;
    assert_eq!(h.coordinator.queued, Some(uri("a.dbml")));

    h.settle().await;

    // stale result dropped, queued request rendered from a fresh snapshot
    assert_eq!(
        h.renderer.calls(),
        vec![
            "Table first { id int }".to_string(),
            "Table third { id int }".to_string()
        ]
    );
    assert_eq!(h.writes(), 1);
    assert!(h.html().contains("<text>third</text>"));
}

#[tokio::test(start_paused = true)]
async fn test_edits_during_render_still_debounced() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", VALID)).await;
    h.push(changed("a.dbml", INVALID)).await;
    assert_eq!(h.coordinator.phase(), Phase::Rendering);
    assert!(h.coordinator.queued.is_none());

    // the first render finishes while the user is still typing
    let msg = h.coordinator.rx.recv().await.unwrap();
    assert!(matches!(msg, PipelineMsg::RenderDone { .. }));
    h.push(msg).await;
    assert_eq!(h.coordinator.phase(), Phase::Pending);

    sleep(Duration::from_millis(20)).await;
    h.push(changed("a.dbml", "Table fixed { id int }")).await;
    h.settle().await;

    assert_eq!(
        h.renderer.calls(),
        vec![VALID.to_string(), "Table fixed { id int }".to_string()]
    );
    assert!(h.notifier.errors().is_empty());
    assert!(h.html().contains("<text>fixed</text>"));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_failure_is_not_reported() {
    let mut h = Harness::new();

    h.push(opened("a.dbml", INVALID)).await;
    h.push(opened("a.dbml", VALID)).await;
    h.settle().await;

    assert_eq!(h.renderer.calls(), vec![INVALID.to_string(), VALID.to_string()]);
    assert!(h.notifier.errors().is_empty());
    assert_eq!(h.writes(), 1);
    assert!(h.html().contains("<text>users</text>"));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_render_id_ignored() {
    let mut h = Harness::new();

    h.push(PipelineMsg::RenderDone {
        id: 42,
        result: RenderResult::Failure {
            reason: "late".into(),
        },
    })
    .await;

    assert_eq!(h.host.created(), 0);
    assert_eq!(h.coordinator.phase(), Phase::Idle);
}

// ============================================================================
// inputs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_generate_without_active_document() {
    let mut h = Harness::new();

    h.push(PipelineMsg::GenerateGraph { uri: None }).await;

    assert_eq!(h.coordinator.phase(), Phase::Idle);
    assert_eq!(h.host.created(), 0);
    assert_eq!(h.notifier.warnings(), vec![NO_ACTIVE_DOCUMENT.to_string()]);
    assert!(h.notifier.infos().is_empty());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_non_dbml_documents_ignored() {
    let mut h = Harness::new();

    h.push(opened("notes.md", "# hi")).await;
    h.push(changed("main.rs", "fn main() {}")).await;

    assert_eq!(h.coordinator.phase(), Phase::Idle);
    assert!(h.coordinator.active.is_none());
    assert!(h.renderer.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_file_changed_reads_disk_at_render_time() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.dbml");
    fs::write(&path, "Table disk { id int }").unwrap();

    let mut h = Harness::new();
    h.push(PipelineMsg::FileChanged { path: path.clone() }).await;
    h.settle().await;

    assert_eq!(h.renderer.calls(), vec!["Table disk { id int }".to_string()]);
    assert_eq!(
        h.coordinator.session.trigger_source(),
        Some(&DocUri::from_path(&path))
    );
}

#[tokio::test(start_paused = true)]
async fn test_generate_for_unseen_file_uri() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.dbml");
    fs::write(&path, VALID).unwrap();

    let mut h = Harness::new();
    h.push(PipelineMsg::GenerateGraph {
        uri: Some(DocUri::from_path(&path)),
    })
    .await;
    h.settle().await;

    assert!(h.html().contains("<text>users</text>"));
}

#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn test_generate_for_percent_encoded_uri() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("my schemas")).unwrap();
    let path = dir.path().join("my schemas/a.dbml");
    fs::write(&path, VALID).unwrap();

    let mut h = Harness::new();
    let encoded = format!("file://{}/my%20schemas/a.dbml", dir.path().display());
    h.push(PipelineMsg::GenerateGraph {
        uri: Some(DocUri::new(&encoded)),
    })
    .await;
    h.settle().await;

    assert!(h.notifier.errors().is_empty());
    assert!(h.html().contains("<text>users</text>"));
    // a later disk change for the same file updates the same document
    assert_eq!(
        h.coordinator.session.trigger_source(),
        Some(&DocUri::from_path(&path))
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_file_reports_failure() {
    let mut h = Harness::new();
    h.push(PipelineMsg::FileChanged {
        path: "/definitely/missing/schema.dbml".into(),
    })
    .await;
    h.settle().await;

    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("missing"));
}

// ============================================================================
// export
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_export_does_not_touch_session() {
    let dir = TempDir::new().unwrap();
    let mut h = Harness::new();

    h.push(changed("a.dbml", VALID)).await;
    h.push(PipelineMsg::ExportSvg {
        uri: None,
        dest: Some(dir.path().join("out")),
    })
    .await;

    let saved = fs::read_to_string(dir.path().join("out.svg")).unwrap();
    assert!(saved.contains("<text>users</text>"));
    assert_eq!(h.host.created(), 0);
    assert!(h.notifier.infos().contains(&export::SAVED_MESSAGE.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_export_without_destination_is_cancelled() {
    let mut h = Harness::new();

    h.push(changed("a.dbml", VALID)).await;
    h.push(PipelineMsg::ExportSvg {
        uri: None,
        dest: None,
    })
    .await;

    assert!(h.notifier.infos().is_empty());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_export_write_failure_notifies() {
    let dir = TempDir::new().unwrap();
    let mut h = Harness::new();

    h.push(changed("a.dbml", VALID)).await;
    h.push(PipelineMsg::ExportSvg {
        uri: Some(uri("a.dbml")),
        dest: Some(dir.path().join("no/such/dir/out.svg")),
    })
    .await;

    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to save SVG: "));
}

// ============================================================================
// lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_subscriptions() {
    let mut h = Harness::new();
    let (alive_tx, mut alive_rx) = mpsc::channel::<()>(1);
    h.coordinator.subscribe(tokio::spawn(async move {
        let _alive = alive_tx;
        std::future::pending::<()>().await;
    }));
    assert_eq!(h.coordinator.subscriptions.len(), 1);

    h.push(changed("a.dbml", VALID)).await;
    let tx = h.coordinator.sender();
    let pipeline = tokio::spawn(h.coordinator.run());
    tx.send(PipelineMsg::Shutdown).await.unwrap();
    pipeline.await.unwrap();

    // subscription task aborted, its sender dropped
    assert!(alive_rx.recv().await.is_none());
    // pending edit never rendered
    assert!(h.renderer.calls().is_empty());
}
