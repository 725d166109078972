//! Pipeline Message Definitions
//!
//! Every event source talks to the coordinator through one channel:
//!
//! ```text
//! FsActor ──FileChanged/SurfaceClosed──┐
//! HostActor ──Document*/Generate/Export─┼──▶ Coordinator
//! Scheduler ──Fire──────────────────────┤
//! render task ──RenderDone──────────────┘
//! ```

use std::path::PathBuf;

use super::scheduler::TriggerToken;
use crate::core::DocUri;
use crate::render::RenderResult;

/// Messages to the Coordinator
#[derive(Debug)]
pub enum PipelineMsg {
    /// In-editor edit (debounced)
    DocumentChanged { uri: DocUri, text: String },
    /// A document became active in the editor (immediate)
    DocumentOpened { uri: DocUri, text: String },
    /// Watched file changed on disk (immediate)
    FileChanged { path: PathBuf },
    /// Explicit "generate graph"; `None` means the active document
    GenerateGraph { uri: Option<DocUri> },
    /// Explicit "save as SVG"; a missing `dest` is a cancelled save
    ExportSvg {
        uri: Option<DocUri>,
        dest: Option<PathBuf>,
    },
    /// The preview surface was closed by the user
    SurfaceClosed,
    /// Debounce window elapsed
    Fire(TriggerToken),
    /// Background render finished
    RenderDone { id: u64, result: RenderResult },
    /// Tear down the pipeline
    Shutdown,
}
