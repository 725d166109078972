//! Core types - pure abstractions shared across the codebase.

mod state;
mod uri;

pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};
pub use uri::DocUri;
