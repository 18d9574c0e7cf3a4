use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub const BASE_DIR: &str = ".terminal-secrets";
pub const CONFIG_FILE: &str = "config.json";
pub const PROJECTS_DIR: &str = "projects";
pub const LOGS_DIR: &str = "logs";
pub const AUDIT_FILE: &str = "audit.log";
pub const DIAGNOSTIC_FILE: &str = "tsec.log";

pub fn default_base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(BASE_DIR))
}

pub fn config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn projects_dir(base: &Path) -> PathBuf {
    base.join(PROJECTS_DIR)
}

pub fn default_audit_path(base: &Path) -> PathBuf {
    base.join(LOGS_DIR).join(AUDIT_FILE)
}

pub fn diagnostic_log_path(base: &Path) -> PathBuf {
    base.join(LOGS_DIR).join(DIAGNOSTIC_FILE)
}

pub fn ensure_private_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    restrict_dir(path)
}

/// Writes through a temp file in the same directory, fsyncs, then renames over `path`.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("invalid target path"))?;
    ensure_private_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    restrict_file(path)
}

pub fn restrict_file(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
    }
    // On non-Unix platforms we skip explicit chmod; rely on platform defaults.
    Ok(())
}

pub fn restrict_dir(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}
