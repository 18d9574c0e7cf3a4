use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::atomic_write;

pub const CLIPBOARD_TIMEOUTS: [u32; 4] = [15, 30, 60, 120];
pub const RETENTION_DAYS: [u32; 5] = [30, 60, 90, 180, 365];
pub const INACTIVITY_MINUTES: [u32; 6] = [0, 5, 10, 15, 30, 60];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub title: String,
    pub code: String,
}

impl Template {
    pub fn new(title: &str, code: &str) -> Self {
        Self {
            title: title.to_string(),
            code: code.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClipboardSettings {
    pub auto_clear: bool,
    pub timeout_seconds: u32,
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            auto_clear: true,
            timeout_seconds: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuditSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub max_size_mb: u32,
    pub max_age_days: u32,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: None,
            max_size_mb: 10,
            max_age_days: 90,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    /// Minutes without input before the session locks. 0 disables locking.
    pub inactivity_timeout_minutes: u32,
    pub lock_on_timeout: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_minutes: 15,
            lock_on_timeout: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub project_id: String,
    pub folder_separator: String,
    pub templates: Vec<Template>,
    /// Most recently used first.
    pub recent_projects: Vec<String>,
    /// Saved replication regions offered by the create form.
    pub secret_locations: Vec<String>,
    pub clipboard: ClipboardSettings,
    pub audit: AuditSettings,
    pub session: SessionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            folder_separator: "/".to_string(),
            templates: default_templates(),
            recent_projects: Vec::new(),
            secret_locations: Vec::new(),
            clipboard: ClipboardSettings::default(),
            audit: AuditSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

pub fn default_templates() -> Vec<Template> {
    vec![
        Template::new(
            "Bash Export",
            r#"export {{.SecretName}}=$(gcloud secrets versions access latest --secret="{{.FullSecretName}}" --project="{{.ProjectID}}")"#,
        ),
        Template::new(
            "Helmfile secretRef",
            "- secretRef:\n    name: {{.SecretName}}\n    key: {{.FullSecretName}}",
        ),
        Template::new(
            "Kyverno Policy",
            r#"apiVersion: kyverno.io/v1
kind: ClusterPolicy
metadata:
  name: require-secret-{{.SecretName}}
spec:
  validationFailureAction: enforce
  rules:
  - name: check-secret
    match:
      resources:
        kinds:
        - Pod
    validate:
      message: "Secret {{.FullSecretName}} must be referenced"
      pattern:
        spec:
          containers:
          - env:
            - valueFrom:
                secretKeyRef:
                  name: "{{.SecretName}}""#,
        ),
        Template::new(
            "Rust Client",
            r#"let name = "projects/{{.ProjectID}}/secrets/{{.FullSecretName}}/versions/latest";
let response = client.access_secret_version().set_name(name).send().await?;
let {{.SecretName}} = response.payload.map(|p| p.data).unwrap_or_default();"#,
        ),
    ]
}

impl Settings {
    pub fn add_recent_project(&mut self, project: &str) {
        if project.is_empty() {
            return;
        }
        self.recent_projects.retain(|p| p != project);
        self.recent_projects.insert(0, project.to_string());
    }

    pub fn remove_recent_project(&mut self, project: &str) {
        self.recent_projects.retain(|p| p != project);
    }

    /// Appends a region unless it is blank or already saved. Returns whether it was added.
    pub fn add_location(&mut self, location: &str) -> bool {
        let location = location.trim();
        if location.is_empty() || self.secret_locations.iter().any(|l| l == location) {
            return false;
        }
        self.secret_locations.push(location.to_string());
        true
    }
}

/// Next value after `current` in `cycle`, wrapping. A value outside the cycle
/// restarts at the entry after the first.
pub fn next_in_cycle(current: u32, cycle: &[u32]) -> u32 {
    match cycle.iter().position(|v| *v == current) {
        Some(idx) => cycle[(idx + 1) % cycle.len()],
        None => cycle.get(1).or(cycle.first()).copied().unwrap_or(current),
    }
}

pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings as pretty JSON in a single private file.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let mut settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        if settings.folder_separator.is_empty() {
            settings.folder_separator = "/".to_string();
        }
        if settings.templates.is_empty() {
            settings.templates = default_templates();
        }
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let data = serde_json::to_string_pretty(settings)?;
        atomic_write(&self.path, data.as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
