//! Append-only audit journal.
//!
//! Every security-relevant action is written as one JSON object per line and
//! synced before [`AuditLog::log`] returns. Once the active file reaches the
//! configured size it is renamed to `<path>.<UTC timestamp>` and a fresh file
//! is opened; rotated files older than the retention window are swept on a
//! background thread. Local I/O problems never reach the caller: they are
//! reported through `tracing` and logging degrades to a no-op.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuditSettings;
use crate::storage::{ensure_private_dir, restrict_file};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const ROTATION_SUFFIX_FORMAT: &str = "%Y%m%d-%H%M%S";
const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    SecretList,
    SecretReveal,
    SecretCopy,
    SecretCreate,
    SecretDelete,
    VersionAdd,
    VersionList,
    ConfigChange,
    ProjectSwitch,
    SessionStart,
    SessionEnd,
    SessionLock,
    SessionUnlock,
    ClipboardClear,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::SecretList => "SECRET_LIST",
            EventType::SecretReveal => "SECRET_REVEAL",
            EventType::SecretCopy => "SECRET_COPY",
            EventType::SecretCreate => "SECRET_CREATE",
            EventType::SecretDelete => "SECRET_DELETE",
            EventType::VersionAdd => "VERSION_ADD",
            EventType::VersionList => "VERSION_LIST",
            EventType::ConfigChange => "CONFIG_CHANGE",
            EventType::ProjectSwitch => "PROJECT_SWITCH",
            EventType::SessionStart => "SESSION_START",
            EventType::SessionEnd => "SESSION_END",
            EventType::SessionLock => "SESSION_LOCK",
            EventType::SessionUnlock => "SESSION_UNLOCK",
            EventType::ClipboardClear => "CLIPBOARD_CLEAR",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventResult {
    Success,
    Failure,
}

impl EventResult {
    fn from_error(error: Option<&str>) -> Self {
        if error.is_some() {
            EventResult::Failure
        } else {
            EventResult::Success
        }
    }
}

/// One immutable journal record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    #[serde(default)]
    pub timestamp: String,
    pub event_type: EventType,
    pub result: EventResult,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl AuditEvent {
    pub fn new(event_type: EventType, result: EventResult) -> Self {
        Self {
            timestamp: String::new(),
            event_type,
            result,
            user: String::new(),
            project_id: String::new(),
            secret_name: String::new(),
            version: String::new(),
            details: BTreeMap::new(),
            error: String::new(),
        }
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.project_id = project_id.to_string();
        self
    }

    pub fn secret(mut self, name: &str) -> Self {
        self.secret_name = name.to_string();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn error(mut self, error: Option<&str>) -> Self {
        if let Some(error) = error {
            self.error = error.to_string();
        }
        self
    }
}

/// Resolved log parameters. Built from [`AuditSettings`] by the app; tests
/// construct it directly to use byte-sized thresholds.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_bytes: u64,
    pub max_age: Duration,
}

impl AuditOptions {
    pub fn from_settings(settings: &AuditSettings, default_path: &Path) -> Self {
        let path = settings
            .file_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_path.to_path_buf());
        Self {
            enabled: settings.enabled,
            path,
            max_bytes: u64::from(settings.max_size_mb).saturating_mul(BYTES_PER_MB),
            max_age: Duration::from_secs(u64::from(settings.max_age_days) * SECS_PER_DAY),
        }
    }
}

pub struct AuditLog {
    options: AuditOptions,
    file: Option<File>,
    user: String,
}

impl AuditLog {
    /// Opens the journal for appending. Never fails: an unusable file leaves
    /// the log disabled and is reported as a diagnostic.
    pub fn open(options: AuditOptions) -> Self {
        let mut log = Self {
            options,
            file: None,
            user: String::new(),
        };
        if !log.options.enabled {
            return log;
        }
        match open_append(&log.options.path) {
            Ok(file) => {
                log.file = Some(file);
                if let Err(err) = log.rotate_if_needed() {
                    warn!(error = %err, "audit rotation check failed");
                }
            }
            Err(err) => {
                warn!(path = %log.options.path.display(), error = %err, "audit log unavailable, logging disabled");
            }
        }
        log
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled && self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.options.path
    }

    pub fn set_user(&mut self, user: &str) {
        self.user = user.to_string();
    }

    /// Reconfigures the log in place, reopening the file when the target or
    /// the enabled flag changed.
    pub fn reconfigure(&mut self, options: AuditOptions) {
        let reopen = options.enabled != self.options.enabled || options.path != self.options.path;
        if !reopen {
            self.options = options;
            return;
        }
        let user = std::mem::take(&mut self.user);
        self.close();
        *self = Self::open(options);
        self.user = user;
    }

    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.sync_all() {
                warn!(error = %err, "audit log sync on close failed");
            }
        }
    }

    pub fn log(&mut self, mut event: AuditEvent) {
        if !self.options.enabled || self.file.is_none() {
            return;
        }
        if event.timestamp.is_empty() {
            event.timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        }
        if event.user.is_empty() {
            event.user = self.user.clone();
        }
        if let Err(err) = self.append(&event) {
            warn!(event = event.event_type.as_str(), error = %err, "audit write failed");
            return;
        }
        if let Err(err) = self.rotate_if_needed() {
            warn!(error = %err, "audit rotation failed");
        }
    }

    fn append(&mut self, event: &AuditEvent) -> io::Result<()> {
        let mut line = serde_json::to_vec(event).map_err(io::Error::other)?;
        line.push(b'\n');
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("audit file not open"))?;
        file.write_all(&line)?;
        file.sync_data()
    }

    fn rotate_if_needed(&mut self) -> io::Result<()> {
        let Some(file) = self.file.as_ref() else {
            return Ok(());
        };
        if self.options.max_bytes == 0 || file.metadata()?.len() < self.options.max_bytes {
            return Ok(());
        }
        self.rotate()
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        let path = self.options.path.clone();
        let rotated = rotated_name(&path);
        let renamed = fs::rename(&path, &rotated);
        // Whatever happened to the rename, keep journaling into the original path.
        self.file = Some(open_append(&path)?);
        renamed?;
        debug!(rotated = %rotated.display(), "audit log rotated");

        let max_age = self.options.max_age;
        std::thread::spawn(move || {
            let Some(dir) = path.parent() else { return };
            let Some(base) = path.file_name().and_then(|n| n.to_str()) else {
                return;
            };
            let removed = cleanup_rotated(dir, base, max_age, SystemTime::now());
            if removed > 0 {
                debug!(removed, "expired audit logs removed");
            }
        });
        Ok(())
    }

    /// The `max` most recent raw lines, newest first. A missing file is empty.
    pub fn read_recent(&self, max: usize) -> io::Result<Vec<String>> {
        read_recent(&self.options.path, max)
    }

    pub fn secret_list(&mut self, project: &str, count: usize, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::SecretList, EventResult::from_error(error))
                .project(project)
                .detail("count", count.to_string())
                .error(error),
        );
    }

    pub fn secret_reveal(&mut self, project: &str, secret: &str, version: &str, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::SecretReveal, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .version(version)
                .error(error),
        );
    }

    pub fn secret_copy(&mut self, project: &str, secret: &str, version: &str, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::SecretCopy, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .version(version)
                .error(error),
        );
    }

    pub fn secret_create(&mut self, project: &str, secret: &str, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::SecretCreate, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .error(error),
        );
    }

    pub fn secret_delete(&mut self, project: &str, secret: &str, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::SecretDelete, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .error(error),
        );
    }

    pub fn version_add(&mut self, project: &str, secret: &str, version: &str, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::VersionAdd, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .version(version)
                .error(error),
        );
    }

    pub fn version_list(&mut self, project: &str, secret: &str, count: usize, error: Option<&str>) {
        self.log(
            AuditEvent::new(EventType::VersionList, EventResult::from_error(error))
                .project(project)
                .secret(secret)
                .detail("count", count.to_string())
                .error(error),
        );
    }

    pub fn config_change(&mut self, setting: &str, old_value: &str, new_value: &str) {
        self.log(
            AuditEvent::new(EventType::ConfigChange, EventResult::Success)
                .detail("setting", setting)
                .detail("old_value", old_value)
                .detail("new_value", new_value),
        );
    }

    pub fn project_switch(&mut self, previous: &str, project: &str) {
        self.log(
            AuditEvent::new(EventType::ProjectSwitch, EventResult::Success)
                .project(project)
                .detail("previous_project", previous),
        );
    }

    pub fn session_start(&mut self, project: &str) {
        self.log(AuditEvent::new(EventType::SessionStart, EventResult::Success).project(project));
    }

    pub fn session_end(&mut self, project: &str) {
        self.log(AuditEvent::new(EventType::SessionEnd, EventResult::Success).project(project));
    }

    pub fn session_lock(&mut self, project: &str, reason: &str) {
        self.log(
            AuditEvent::new(EventType::SessionLock, EventResult::Success)
                .project(project)
                .detail("reason", reason),
        );
    }

    pub fn session_unlock(&mut self, project: &str) {
        self.log(AuditEvent::new(EventType::SessionUnlock, EventResult::Success).project(project));
    }

    pub fn clipboard_clear(&mut self, error: Option<&str>) {
        self.log(AuditEvent::new(EventType::ClipboardClear, EventResult::from_error(error)).error(error));
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("path", &self.options.path)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_private_dir(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    restrict_file(path)?;
    Ok(file)
}

fn rotated_name(path: &Path) -> PathBuf {
    let stamp = Utc::now().format(ROTATION_SUFFIX_FORMAT).to_string();
    let base = path.as_os_str().to_string_lossy().into_owned();
    let candidate = PathBuf::from(format!("{base}.{stamp}"));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| PathBuf::from(format!("{base}.{stamp}-{n}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Removes rotated siblings of `base` in `dir` last modified before
/// `now - max_age`. Returns how many files were deleted.
pub fn cleanup_rotated(dir: &Path, base: &str, max_age: Duration, now: SystemTime) -> usize {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return 0;
    };
    let prefix = format!("{base}.");
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "audit retention scan failed");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&prefix) || name.len() <= prefix.len() {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else { continue };
        if modified < cutoff {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => warn!(file = name, error = %err, "failed to remove expired audit log"),
            }
        }
    }
    removed
}

pub fn read_recent(path: &Path, max: usize) -> io::Result<Vec<String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let lines: Vec<&str> = raw.lines().collect();
    let start = lines.len().saturating_sub(max);
    Ok(lines[start..].iter().rev().map(|l| l.to_string()).collect())
}

fn truncate(value: &str, max: usize) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max - 3).collect();
    format!("{kept}...")
}

/// Renders one raw line for the in-app viewer. Lines that are not audit
/// records are shown unchanged.
pub fn format_entry(line: &str) -> String {
    let Ok(event) = serde_json::from_str::<AuditEvent>(line) else {
        return line.to_string();
    };
    let timestamp: String = event
        .timestamp
        .chars()
        .take(19)
        .collect::<String>()
        .replacen('T', " ", 1);
    let result = match event.result {
        EventResult::Success => "✓",
        EventResult::Failure => "✗",
    };
    format!(
        "{} {} {:<14} {:<25} {:<30}",
        timestamp,
        result,
        event.event_type.as_str(),
        truncate(&event.user, 25),
        truncate(&event.secret_name, 30),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path, max_bytes: u64) -> AuditOptions {
        AuditOptions {
            enabled: true,
            path: dir.join("audit.log"),
            max_bytes,
            max_age: Duration::from_secs(90 * SECS_PER_DAY),
        }
    }

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AuditLog::open(options(dir.path(), 0));
        log.set_user("alice@example.com");
        log.secret_reveal("proj", "team/api", "3", None);
        log.secret_create("proj", "team/db", Some("permission denied"));

        let entries = lines(&log.options.path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["event_type"], "SECRET_REVEAL");
        assert_eq!(entries[0]["result"], "SUCCESS");
        assert_eq!(entries[0]["user"], "alice@example.com");
        assert_eq!(entries[0]["version"], "3");
        assert!(entries[0].get("error").is_none());
        assert!(entries[0].get("details").is_none());
        assert_eq!(entries[1]["result"], "FAILURE");
        assert_eq!(entries[1]["error"], "permission denied");

        let ts = entries[0]["timestamp"].as_str().unwrap();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), 0);
        opts.enabled = false;
        let mut log = AuditLog::open(opts);
        log.session_start("proj");
        assert!(!log.is_enabled());
        assert!(!dir.path().join("audit.log").exists());
    }

    #[test]
    fn unopenable_path_degrades_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let mut opts = options(dir.path(), 0);
        opts.path = blocker.join("audit.log");
        let mut log = AuditLog::open(opts);
        assert!(!log.is_enabled());
        log.session_end("proj");
    }

    #[test]
    fn config_change_details() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AuditLog::open(options(dir.path(), 0));
        log.config_change("clipboard_timeout", "30", "60");
        let entries = lines(&log.options.path);
        assert_eq!(entries[0]["details"]["setting"], "clipboard_timeout");
        assert_eq!(entries[0]["details"]["old_value"], "30");
        assert_eq!(entries[0]["details"]["new_value"], "60");
    }

    #[test]
    fn read_recent_is_newest_first_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AuditLog::open(options(dir.path(), 0));
        for project in ["one", "two", "three"] {
            log.session_start(project);
        }
        let recent = log.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].contains("three"));
        assert!(recent[1].contains("two"));
    }

    #[test]
    fn read_recent_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_recent(&dir.path().join("absent.log"), 10).unwrap().is_empty());
    }

    #[test]
    fn format_entry_truncates_and_marks_result() {
        let line = r#"{"timestamp":"2024-03-01T10:20:30Z","event_type":"SECRET_COPY","result":"FAILURE","user":"someone.with.a.very.long.name@example.com","secret_name":"a/really/long/secret/name/that/keeps/going"}"#;
        let out = format_entry(line);
        assert!(out.starts_with("2024-03-01 10:20:30 ✗ SECRET_COPY"));
        assert!(out.contains("someone.with.a.very.lo..."));
        assert!(out.contains("a/really/long/secret/name/t..."));
    }

    #[test]
    fn format_entry_falls_back_to_raw_line() {
        assert_eq!(format_entry("not json at all"), "not json at all");
    }

    #[test]
    fn format_entry_fills_blanks() {
        let line = r#"{"timestamp":"2024-03-01T10:20:30Z","event_type":"CLIPBOARD_CLEAR","result":"SUCCESS"}"#;
        let out = format_entry(line);
        assert!(out.contains("✓ CLIPBOARD_CLEAR"));
        assert!(out.contains(" - "));
    }
}
