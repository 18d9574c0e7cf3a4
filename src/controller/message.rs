use std::time::Duration;

use crossterm::event::KeyEvent;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::models::{Secret, SecretVersion};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Clipboard(String),
    #[error("{0}")]
    Config(String),
}

/// What ended up on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOrigin {
    Secret { name: String, version: String },
    GeneratedCode,
}

/// Everything the controller reacts to, delivered one at a time in arrival order.
pub enum Msg {
    Key(KeyEvent),
    Mouse,
    Resize {
        width: u16,
        height: u16,
    },
    Connected {
        project: String,
        result: Result<String, TaskError>,
    },
    SecretsLoaded {
        project: String,
        result: Result<Vec<Secret>, TaskError>,
    },
    VersionsLoaded {
        secret: String,
        result: Result<Vec<SecretVersion>, TaskError>,
    },
    ValueAccessed {
        secret: String,
        version: String,
        result: Result<Zeroizing<Vec<u8>>, TaskError>,
    },
    SecretCreated {
        project: String,
        name: String,
        result: Result<(), TaskError>,
    },
    SecretDeleted {
        project: String,
        name: String,
        result: Result<(), TaskError>,
    },
    VersionAdded {
        project: String,
        secret: String,
        result: Result<SecretVersion, TaskError>,
    },
    ClipboardCopied {
        origin: CopyOrigin,
        result: Result<(), TaskError>,
    },
    ClipboardCleared {
        result: Result<(), TaskError>,
    },
    ConfigSaved {
        result: Result<(), TaskError>,
    },
    ClipboardTick {
        generation: u64,
    },
    SessionTick,
}

/// Side effects requested by the controller. The runtime performs each one
/// and reports back with exactly one [`Msg`] where a completion exists.
pub enum Task {
    Connect {
        project: String,
    },
    LoadSecrets {
        project: String,
    },
    LoadVersions {
        project: String,
        secret: String,
    },
    AccessVersion {
        project: String,
        secret: String,
        version: String,
    },
    /// Access and copy in one step; the bytes never pass through the controller.
    CopyVersion {
        project: String,
        secret: String,
        version: String,
    },
    WriteClipboard {
        text: Zeroizing<String>,
        origin: CopyOrigin,
    },
    ClearClipboard,
    CreateSecret {
        project: String,
        name: String,
        value: Zeroizing<Vec<u8>>,
        location: Option<String>,
    },
    AddVersion {
        project: String,
        secret: String,
        value: Zeroizing<Vec<u8>>,
    },
    DeleteSecret {
        project: String,
        secret: String,
    },
    SaveConfig(Settings),
    Schedule {
        after: Duration,
        msg: Msg,
    },
    Quit,
}

impl Task {
    /// Short label for diagnostics. Never includes payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Task::Connect { .. } => "connect",
            Task::LoadSecrets { .. } => "load_secrets",
            Task::LoadVersions { .. } => "load_versions",
            Task::AccessVersion { .. } => "access_version",
            Task::CopyVersion { .. } => "copy_version",
            Task::WriteClipboard { .. } => "write_clipboard",
            Task::ClearClipboard => "clear_clipboard",
            Task::CreateSecret { .. } => "create_secret",
            Task::AddVersion { .. } => "add_version",
            Task::DeleteSecret { .. } => "delete_secret",
            Task::SaveConfig(_) => "save_config",
            Task::Schedule { .. } => "schedule",
            Task::Quit => "quit",
        }
    }
}
