//! Shared helpers: external commands and path handling.

pub mod exec;
pub mod path;
