//! Host Actor
//!
//! Reads editor events as line-delimited JSON and forwards them to the
//! coordinator:
//!
//! ```text
//! {"event":"opened","uri":"file:///a.dbml","text":"Table t { id integer }"}
//! {"event":"changed","uri":"file:///a.dbml","text":"..."}
//! {"event":"generate"}
//! {"event":"export","uri":"file:///a.dbml","dest":"/tmp/a.svg"}
//! {"event":"closed"}
//! ```
//!
//! Malformed lines are logged and skipped. End of input shuts the
//! pipeline down.

use std::path::PathBuf;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc;

use super::messages::PipelineMsg;
use crate::core::DocUri;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum HostEvent {
    Opened {
        uri: DocUri,
        text: String,
    },
    Changed {
        uri: DocUri,
        text: String,
    },
    Generate {
        #[serde(default)]
        uri: Option<DocUri>,
    },
    Export {
        #[serde(default)]
        uri: Option<DocUri>,
        #[serde(default)]
        dest: Option<PathBuf>,
    },
    /// The editor closed the preview.
    Closed,
}

impl From<HostEvent> for PipelineMsg {
    fn from(event: HostEvent) -> Self {
        match event {
            HostEvent::Opened { uri, text } => Self::DocumentOpened { uri, text },
            HostEvent::Changed { uri, text } => Self::DocumentChanged { uri, text },
            HostEvent::Generate { uri } => Self::GenerateGraph { uri },
            HostEvent::Export { uri, dest } => Self::ExportSvg { uri, dest },
            HostEvent::Closed => Self::SurfaceClosed,
        }
    }
}

/// Parse one protocol line. Blank lines yield `None` silently.
pub fn parse_line(line: &str) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            crate::log!("host"; "skipping malformed event: {}", e);
            None
        }
    }
}

pub struct HostActor<R> {
    reader: R,
    tx: mpsc::Sender<PipelineMsg>,
}

impl HostActor<BufReader<Stdin>> {
    pub fn stdin(tx: mpsc::Sender<PipelineMsg>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tx)
    }
}

impl<R: AsyncBufRead + Unpin> HostActor<R> {
    pub fn new(reader: R, tx: mpsc::Sender<PipelineMsg>) -> Self {
        Self { reader, tx }
    }

    pub async fn run(self) {
        let mut lines = self.reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    crate::log!("host"; "failed to read input: {}", e);
                    break;
                }
            };
            let Some(event) = parse_line(&line) else {
                continue;
            };
            crate::debug!("host"; "{:?}", event);
            if self.tx.send(event.into()).await.is_err() {
                return;
            }
        }
        crate::debug!("host"; "input closed");
        let _ = self.tx.send(PipelineMsg::Shutdown).await;
    }
}
