//! dbml-preview - live SVG preview for DBML schemas.

mod actor;
mod cli;
mod config;
mod core;
mod export;
mod logger;
mod notice;
mod preview;
mod render;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PreviewConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PreviewConfig::load(&cli)?;

    match &cli.command {
        Commands::Preview { args } => cli::preview::run_preview(args, &config),
        Commands::Export { input, output } => {
            cli::export::run_export(input, output.as_deref(), &config)
        }
        Commands::Render { input } => cli::export::run_render(input, &config),
    }
}
