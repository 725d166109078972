//! Command-line interface module.

mod args;
pub mod common;
pub mod export;
pub mod preview;

pub use args::{Cli, Commands, PreviewArgs};
