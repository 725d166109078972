//! Configuration lookup helpers.

use std::path::{Path, PathBuf};

/// Locate `config_name` starting at `start` and walking up to the filesystem
/// root. An absolute `config_name` is returned as-is when it exists.
///
/// ```text
/// /home/user/schema/db/       ← start
/// /home/user/schema/dbml-preview.toml ← found
/// ```
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

/// [`find_config_file_from`] starting at the current directory.
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}
