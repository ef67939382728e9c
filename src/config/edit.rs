use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use super::DEFAULT_CONFIG;

/// CLI command: open `config.toml` in `$EDITOR` (default `vim`).
///
/// A commented default file is written first if none exists.
pub fn cmd_config_edit(config_path: &Path) -> Result<()> {
    ensure_default_config(config_path)?;

    let editor_env = env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    let mut cmd = Command::new(&editor_env);
    cmd.arg(config_path);

    // vim: skip the swap file
    let is_vim = Path::new(&editor_env)
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains("vim"))
        .unwrap_or(false);

    if is_vim {
        cmd.arg("-n");
    }

    let err = cmd.exec();
    Err(err).context(format!("failed to launch editor: {}", editor_env))
}

/// Write [`DEFAULT_CONFIG`] to `path` unless the file already exists.
/// Returns whether a file was written.
pub fn ensure_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_written_once() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested").join("config.toml");

        assert!(ensure_default_config(&path).unwrap());
        fs::write(&path, "[push]\nbranch = \"art\"\n").unwrap();
        assert!(!ensure_default_config(&path).unwrap());

        let kept = fs::read_to_string(&path).unwrap();
        assert!(kept.contains("art"));
    }
}
