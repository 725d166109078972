//! Preview configuration for `dbml-preview.toml`.
//!
//! ```text
//! config/
//! ├── section   # [preview], [render], [watch]
//! ├── error     # ConfigError
//! ├── util      # config file lookup
//! └── mod.rs    # PreviewConfig (this file)
//! ```
//!
//! The config file is optional. When none is found upward from the current
//! directory, defaults apply and the current directory is the project root.

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{PreviewSection, RenderSection, WatchSection};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, PreviewArgs};
use crate::log;
use crate::utils::path::{normalize_path, resolve_against};
use util::find_config_file;

/// Root configuration, mirrors `dbml-preview.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Absolute path to the config file; empty when running on defaults.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: parent of the config file, or the cwd.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub preview: PreviewSection,

    #[serde(default)]
    pub render: RenderSection,

    #[serde(default)]
    pub watch: WatchSection,
}

impl PreviewConfig {
    /// Load configuration for `cli`, applying `preview` overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                crate::debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        if let Some(args) = cli.preview_args() {
            config.apply_args(args);
        }
        config.root = normalize_path(&config.root);
        config.validate()?;
        config.check_renderer();
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", name, ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn apply_args(&mut self, args: &PreviewArgs) {
        if let Some(ms) = args.debounce_ms {
            self.preview.debounce_ms = ms;
        }
        if let Some(output) = &args.output {
            self.preview.output = output.clone();
        }
        if let Some(open) = args.open {
            self.preview.open = open;
        }
    }

    /// Absolute path of the preview page.
    pub fn output_path(&self) -> PathBuf {
        resolve_against(&self.preview.output, &self.root)
    }

    /// Whether `path` has one of the watched extensions.
    pub fn is_watched(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.watch
                    .extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.render.command.iter().all(|part| part.trim().is_empty()) {
            bail!(ConfigError::Validation("render.command is empty".into()));
        }
        if self.watch.extensions.is_empty() {
            bail!(ConfigError::Validation("watch.extensions is empty".into()));
        }
        if self.preview.output.as_os_str().is_empty() {
            bail!(ConfigError::Validation("preview.output is empty".into()));
        }
        Ok(())
    }

    /// Warn early when the renderer is not on `PATH`; every render would
    /// otherwise fail with a spawn error.
    fn check_renderer(&self) {
        let Some(program) = self.render.program() else {
            return;
        };
        if which::which(program).is_ok() {
            return;
        }
        let is_package_runner = ["npx", "bunx", "pnpx", "yarn"].contains(&program);
        if is_package_runner {
            crate::debug!("config"; "renderer runs through `{}`", program);
        } else {
            log!(
                "warning";
                "`{}` not found, install it with `npm install -g @softwaretechnik/dbml-renderer` or update render.command",
                program
            );
        }
    }
}

/// Parse config from TOML, panicking on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
