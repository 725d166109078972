//! `preview` command: keep the diagram of the current DBML file live.
//!
//! Wires the event sources into the coordinator and runs it on a tokio
//! runtime until Ctrl+C or, with `--stdin`, until the editor disconnects.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::PreviewArgs;
use super::common::{renderer, source_path};
use crate::actor::Coordinator;
use crate::actor::fs::{FsActor, WatchFilter};
use crate::actor::host::HostActor;
use crate::actor::messages::PipelineMsg;
use crate::config::PreviewConfig;
use crate::core::{DocUri, is_shutdown, register_shutdown};
use crate::log;
use crate::notice::StatusNotifier;
use crate::preview::FileSurfaceHost;

pub fn run_preview(args: &PreviewArgs, config: &PreviewConfig) -> Result<()> {
    if args.no_watch && !args.stdin && args.file.is_none() {
        bail!("nothing to preview: pass a DBML file, use --stdin, or drop --no-watch");
    }
    // Validate the initial file before spinning anything up.
    let initial = args
        .file
        .as_deref()
        .map(|file| source_path(file, config))
        .transpose()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let output = config.output_path();
        let host = FileSurfaceHost::new(&output, config.preview.open);
        let mut coordinator = Coordinator::new(
            config,
            Arc::new(renderer(config)),
            Box::new(host),
            Arc::new(StatusNotifier),
        );
        let tx = coordinator.sender();

        if !args.no_watch {
            let filter = WatchFilter::new(&config.watch.extensions, &output)
                .with_config(&config.config_path);
            let fs = FsActor::new(&config.root, filter, tx.clone())
                .context("Failed to start file watcher")?;
            coordinator.subscribe(tokio::spawn(fs.run()));
            log!(
                "watch";
                "watching {} for *.{} changes",
                config.root.display(),
                config.watch.extensions.join(", *.")
            );
        }
        if args.stdin {
            coordinator.subscribe(tokio::spawn(HostActor::stdin(tx.clone()).run()));
            crate::debug!("host"; "reading editor events from stdin");
        }
        coordinator.subscribe(forward_shutdown(tx.clone()));

        if let Some(path) = initial {
            let uri = DocUri::from_path(&path);
            tx.send(PipelineMsg::GenerateGraph { uri: Some(uri) })
                .await
                .context("preview pipeline stopped")?;
        }

        coordinator.run().await;
        Ok::<(), anyhow::Error>(())
    })
}

/// Bridge the Ctrl+C channel into the pipeline.
fn forward_shutdown(tx: mpsc::Sender<PipelineMsg>) -> JoinHandle<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    register_shutdown(shutdown_tx);

    tokio::spawn(async move {
        loop {
            if shutdown_rx.try_recv().is_ok() || is_shutdown() {
                crate::debug!("preview"; "shutdown signal received");
                let _ = tx.send(PipelineMsg::Shutdown).await;
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
}
