//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live SVG preview for DBML schemas
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: dbml-preview.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "dbml-preview.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the live preview and keep it updated ("generate graph")
    #[command(visible_alias = "p")]
    Preview {
        #[command(flatten)]
        args: PreviewArgs,
    },

    /// Render a DBML file once and save it as SVG
    #[command(visible_alias = "e")]
    Export {
        /// DBML file to render
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Destination file; prompts when omitted (`.svg` is appended if missing)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Render a DBML file and write the SVG to stdout
    #[command(visible_alias = "r")]
    Render {
        /// DBML file to render
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },
}

/// Live preview arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct PreviewArgs {
    /// DBML file to preview first; later changes to any watched file switch
    /// the preview to that file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Read editor events (line-delimited JSON) from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Do not watch the project directory for changes on disk
    #[arg(long)]
    pub no_watch: bool,

    /// Quiet period before re-rendering after an in-editor edit
    #[arg(short, long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Preview page path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Open the preview page in the default browser
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub open: Option<bool>,
}

impl Cli {
    pub fn preview_args(&self) -> Option<&PreviewArgs> {
        match &self.command {
            Commands::Preview { args } => Some(args),
            _ => None,
        }
    }
}
