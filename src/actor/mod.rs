//! Actor System for the live preview
//!
//! Message-passing around a single coordinator:
//!
//! ```text
//! FsActor ───┐
//!            ├──▶ Coordinator ──▶ render task ──▶ Coordinator ──▶ preview
//! HostActor ─┘        │
//!                 Scheduler (debounce)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for the coordinator
//! - `scheduler` - Cancellable debounce timer
//! - `coordinator` - Owns engine state and serializes renders
//! - `fs` - File system watcher
//! - `host` - Line-delimited JSON editor events on stdin

pub mod coordinator;
pub mod fs;
pub mod host;
pub mod messages;
pub mod scheduler;

pub use coordinator::Coordinator;
