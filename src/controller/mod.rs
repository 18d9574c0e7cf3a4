//! The view state machine.
//!
//! [`Controller::handle`] consumes one [`Msg`] at a time, mutates the single
//! controller value and returns the [`Task`]s the runtime must perform. Time is
//! passed in, so every timer decision can be driven from tests.

use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::audit::{AuditEvent, AuditLog, AuditOptions, EventResult, EventType};
use crate::config::Settings;
use crate::guard::clipboard::display_secs;
use crate::guard::{ClipboardGuard, Countdown, SessionGuard, CLIPBOARD_TICK, SESSION_CHECK_INTERVAL};
use crate::models::{Secret, SecretVersion};
use crate::secret::SecretVault;
use crate::tree::{NamespaceNode, NamespaceTree};

mod forms;
pub mod message;
mod navigation;
mod settings;
pub mod view;

pub use message::{CopyOrigin, Msg, Task, TaskError};
pub use view::View;
use view::{BasicForm, CreateForm, GenerateState, Input, SwitchState, TemplateForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

pub struct Controller {
    pub(crate) settings: Settings,
    pub(crate) audit: AuditLog,
    audit_default_path: PathBuf,
    /// Project the store tasks and audit records refer to.
    pub(crate) active_project: String,
    pub(crate) actor: String,

    pub(crate) view: View,
    pub(crate) delete_return: View,
    pub(crate) switch_return: View,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) status: Status,
    pub(crate) loading: Option<String>,

    pub(crate) secrets: Vec<Secret>,
    pub(crate) tree: NamespaceTree,
    pub(crate) path: Vec<String>,
    pub(crate) filter: Input,
    pub(crate) cursor: usize,
    pub(crate) offset: usize,

    pub(crate) selected: Option<Secret>,
    pub(crate) versions: Vec<SecretVersion>,
    pub(crate) version_cursor: usize,
    pub(crate) revealed_version: String,
    pub(crate) vault: SecretVault,
    pub(crate) clipboard: ClipboardGuard,
    pub(crate) session: SessionGuard,

    pub(crate) create: CreateForm,
    pub(crate) new_version: Input,
    pub(crate) project_input: Input,
    pub(crate) switch: SwitchState,
    pub(crate) generate: GenerateState,
    pub(crate) menu_cursor: usize,
    pub(crate) basic: BasicForm,
    pub(crate) template_cursor: usize,
    pub(crate) template_form: TemplateForm,
    pub(crate) recent_cursor: usize,
    pub(crate) security_cursor: usize,
    pub(crate) audit_lines: Vec<String>,
    pub(crate) audit_offset: usize,
}

impl Controller {
    /// Builds the controller and opens the audit log described by `settings`.
    /// `audit_default_path` is used when no explicit audit file is configured.
    pub fn new(settings: Settings, audit_default_path: PathBuf, now: Instant) -> Self {
        let audit = AuditLog::open(AuditOptions::from_settings(&settings.audit, &audit_default_path));
        let active_project = settings.project_id.clone();
        let view = if active_project.is_empty() {
            View::ProjectPrompt
        } else {
            View::List
        };
        let tree = NamespaceTree::build(&[], &settings.folder_separator);
        Self {
            settings,
            audit,
            audit_default_path,
            active_project,
            actor: String::new(),
            view,
            delete_return: View::List,
            switch_return: View::List,
            width: 80,
            height: 24,
            status: Status::default(),
            loading: None,
            secrets: Vec::new(),
            tree,
            path: Vec::new(),
            filter: Input::default(),
            cursor: 0,
            offset: 0,
            selected: None,
            versions: Vec::new(),
            version_cursor: 0,
            revealed_version: String::new(),
            vault: SecretVault::new(),
            clipboard: ClipboardGuard::new(),
            session: SessionGuard::new(now),
            create: CreateForm::default(),
            new_version: Input::default(),
            project_input: Input::default(),
            switch: SwitchState::default(),
            generate: GenerateState::default(),
            menu_cursor: 0,
            basic: BasicForm::default(),
            template_cursor: 0,
            template_form: TemplateForm::default(),
            recent_cursor: 0,
            security_cursor: 0,
            audit_lines: Vec::new(),
            audit_offset: 0,
        }
    }

    /// Tasks to run before the first message: the inactivity check and, when a
    /// project is already known, the store connection.
    pub fn start(&mut self) -> Vec<Task> {
        let mut tasks = vec![Task::Schedule {
            after: SESSION_CHECK_INTERVAL,
            msg: Msg::SessionTick,
        }];
        if !self.active_project.is_empty() {
            self.loading = Some("Connecting...".into());
            tasks.push(Task::Connect {
                project: self.active_project.clone(),
            });
        }
        tasks
    }

    /// Wipes the vault and closes the session. Returns whether a clipboard
    /// clear is still owed and must be performed before exit.
    pub fn shutdown(&mut self) -> bool {
        self.vault.clear();
        let pending = self.clipboard.disarm();
        if !self.actor.is_empty() {
            self.audit.session_end(&self.active_project);
        }
        self.audit.close();
        pending
    }

    pub fn handle(&mut self, msg: Msg, now: Instant) -> Vec<Task> {
        match msg {
            Msg::Key(key) => {
                self.session.touch(now);
                self.on_key(key, now)
            }
            Msg::Mouse => {
                self.session.touch(now);
                Vec::new()
            }
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
                Vec::new()
            }
            Msg::Connected { project, result } => self.on_connected(project, result),
            Msg::SecretsLoaded { project, result } => self.on_secrets_loaded(project, result),
            Msg::VersionsLoaded { secret, result } => self.on_versions_loaded(secret, result),
            Msg::ValueAccessed {
                secret,
                version,
                result,
            } => self.on_value_accessed(secret, version, result),
            Msg::SecretCreated {
                project,
                name,
                result,
            } => self.on_secret_created(project, name, result),
            Msg::SecretDeleted {
                project,
                name,
                result,
            } => self.on_secret_deleted(project, name, result),
            Msg::VersionAdded {
                project,
                secret,
                result,
            } => self.on_version_added(project, secret, result),
            Msg::ClipboardCopied { origin, result } => self.on_clipboard_copied(origin, result, now),
            Msg::ClipboardCleared { result } => self.on_clipboard_cleared(result),
            Msg::ConfigSaved { result } => {
                if let Err(err) = result {
                    self.set_error(format!("Failed to save configuration: {err}"));
                }
                Vec::new()
            }
            Msg::ClipboardTick { generation } => self.on_clipboard_tick(generation, now),
            Msg::SessionTick => self.on_session_tick(now),
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Task> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c')) {
            return vec![Task::Quit];
        }
        if self.session.is_locked() {
            return self.on_locked_key(key, now);
        }
        if ctrl
            && matches!(key.code, KeyCode::Char('p'))
            && !matches!(self.view, View::ProjectPrompt | View::ProjectSwitch | View::Locked)
        {
            self.open_project_switch();
            return Vec::new();
        }

        match self.view {
            View::ProjectPrompt => self.on_project_prompt_key(key),
            View::List => self.on_list_key(key),
            View::Detail => self.on_detail_key(key),
            View::Create => self.on_create_key(key),
            View::AddVersion => self.on_add_version_key(key),
            View::DeleteConfirm => self.on_delete_key(key),
            View::GenerateCode => self.on_generate_key(key),
            View::ConfigMenu => self.on_config_menu_key(key),
            View::ConfigBasic => self.on_config_basic_key(key),
            View::ConfigTemplates => self.on_config_templates_key(key),
            View::ConfigTemplateEdit => self.on_template_edit_key(key),
            View::ConfigRecentProjects => self.on_recent_projects_key(key),
            View::ConfigSecurity => self.on_security_key(key),
            View::AuditLog => self.on_audit_log_key(key),
            View::Filter => self.on_filter_key(key),
            View::Reveal => self.on_reveal_key(key),
            View::ProjectSwitch => self.on_project_switch_key(key),
            View::Locked => self.on_locked_key(key, now),
        }
    }

    fn on_locked_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Task> {
        if !matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            return Vec::new();
        }
        if let Some(resume) = self.session.unlock(now) {
            self.view = resume;
            self.audit.session_unlock(&self.active_project);
            self.set_success("Session unlocked");
            info!("session unlocked");
        }
        Vec::new()
    }

    /// Every view change goes through here so the vault is wiped whenever the
    /// detail family is left. While locked the lock screen stays up and the
    /// change only moves the view restored on unlock.
    pub(crate) fn set_view(&mut self, next: View) {
        let locked = self.session.is_locked();
        let shown = if locked { self.session.resume_view() } else { self.view };
        if shown.holds_secret() && next != View::Reveal {
            self.vault.clear();
            self.revealed_version.clear();
        }
        if locked {
            self.session.resume_on(next);
        } else {
            self.view = next;
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Status {
            text: text.into(),
            kind,
        };
    }

    pub(crate) fn set_info(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Info);
    }

    pub(crate) fn set_success(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Success);
    }

    pub(crate) fn set_error(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Error);
    }

    pub(crate) fn visible_height(&self) -> usize {
        usize::from(self.height).saturating_sub(10).max(5)
    }

    pub(crate) fn save_config_task(&self) -> Task {
        Task::SaveConfig(self.settings.clone())
    }

    pub(crate) fn reconfigure_audit(&mut self) {
        let options = AuditOptions::from_settings(&self.settings.audit, &self.audit_default_path);
        self.audit.reconfigure(options);
    }

    pub(crate) fn rebuild_tree(&mut self) {
        self.tree = NamespaceTree::build(&self.secrets, &self.settings.folder_separator);
        while !self.path.is_empty() && self.tree.node(&self.path).is_none_or(|n| !n.is_folder) {
            self.path.pop();
        }
        self.clamp_cursor();
    }

    pub(crate) fn clamp_cursor(&mut self) {
        let len = self.items().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
        if self.offset > self.cursor {
            self.offset = self.cursor;
        }
    }

    /// Clears everything tied to the previous project's listing.
    pub(crate) fn reset_listing(&mut self) {
        self.secrets.clear();
        self.tree = NamespaceTree::build(&[], &self.settings.folder_separator);
        self.path.clear();
        self.filter.clear();
        self.cursor = 0;
        self.offset = 0;
        self.selected = None;
        self.versions.clear();
        self.version_cursor = 0;
    }

    /// The view whose context a late completion should be judged against.
    fn context_view(&self) -> View {
        match self.view {
            View::Locked => self.session.resume_view(),
            View::ProjectSwitch => self.switch_return,
            other => other,
        }
    }

    fn in_detail_family(&self, view: View) -> bool {
        match view {
            View::Detail | View::Reveal | View::AddVersion | View::GenerateCode => true,
            View::DeleteConfirm => self.delete_return == View::Detail,
            _ => false,
        }
    }

    fn selected_is(&self, name: &str) -> bool {
        self.selected.as_ref().is_some_and(|s| s.name == name)
    }

    fn on_connected(&mut self, project: String, result: Result<String, TaskError>) -> Vec<Task> {
        if project != self.active_project {
            debug!(project = %project, "ignoring connection for inactive project");
            return Vec::new();
        }
        match result {
            Err(err) => {
                self.loading = None;
                self.set_error(format!("Error: {err}"));
                Vec::new()
            }
            Ok(actor) => {
                self.actor = actor;
                self.audit.set_user(&self.actor);
                self.audit.session_start(&project);
                info!(project = %project, actor = %self.actor, "session started");
                self.loading = Some("Loading secrets...".into());
                vec![Task::LoadSecrets { project }]
            }
        }
    }

    fn on_secrets_loaded(&mut self, project: String, result: Result<Vec<Secret>, TaskError>) -> Vec<Task> {
        if project != self.active_project {
            return Vec::new();
        }
        self.loading = None;
        match result {
            Err(err) => {
                let text = err.to_string();
                self.audit.secret_list(&project, 0, Some(&text));
                self.set_error(format!("Error loading secrets: {text}"));
            }
            Ok(secrets) => {
                self.secrets = secrets;
                self.rebuild_tree();
                let count = self.secrets.len();
                self.audit.secret_list(&project, count, None);
                let shadowed = self.tree.collisions();
                if shadowed.is_empty() {
                    self.set_info(format!("Loaded {count} secrets"));
                } else {
                    let text = format!(
                        "Loaded {count} secrets; hidden behind folders of the same name: {}",
                        shadowed.join(", ")
                    );
                    self.set_status(text, StatusKind::Warning);
                }
            }
        }
        Vec::new()
    }

    fn on_versions_loaded(
        &mut self,
        secret: String,
        result: Result<Vec<SecretVersion>, TaskError>,
    ) -> Vec<Task> {
        if !self.selected_is(&secret) || !self.in_detail_family(self.context_view()) {
            debug!(secret = %secret, "discarding stale version list");
            return Vec::new();
        }
        self.loading = None;
        match result {
            Err(err) => {
                let text = err.to_string();
                self.audit.version_list(&self.active_project, &secret, 0, Some(&text));
                self.set_error(format!("Error loading versions: {text}"));
            }
            Ok(versions) => {
                self.audit
                    .version_list(&self.active_project, &secret, versions.len(), None);
                self.versions = versions;
                if self.version_cursor >= self.versions.len() {
                    self.version_cursor = self.versions.len().saturating_sub(1);
                }
            }
        }
        Vec::new()
    }

    fn on_value_accessed(
        &mut self,
        secret: String,
        version: String,
        result: Result<Zeroizing<Vec<u8>>, TaskError>,
    ) -> Vec<Task> {
        let current = self.view == View::Detail && self.selected_is(&secret);
        if self.selected_is(&secret) && self.in_detail_family(self.context_view()) {
            self.loading = None;
        }
        match result {
            Err(err) => {
                let text = err.to_string();
                self.audit
                    .secret_reveal(&self.active_project, &secret, &version, Some(&text));
                if current {
                    self.set_error(format!("Error accessing secret: {text}"));
                }
            }
            Ok(bytes) if !current => {
                drop(bytes);
                debug!(secret = %secret, "discarding stale secret value");
                self.audit.log(
                    AuditEvent::new(EventType::SecretReveal, EventResult::Success)
                        .project(&self.active_project)
                        .secret(&secret)
                        .version(&version)
                        .detail("discarded", "stale"),
                );
            }
            Ok(bytes) => {
                self.vault.set(&bytes);
                drop(bytes);
                self.revealed_version = version;
                self.set_view(View::Reveal);
                self.audit
                    .secret_reveal(&self.active_project, &secret, &self.revealed_version, None);
            }
        }
        Vec::new()
    }

    fn on_secret_created(&mut self, project: String, name: String, result: Result<(), TaskError>) -> Vec<Task> {
        let error = result.err().map(|e| e.to_string());
        self.audit.secret_create(&project, &name, error.as_deref());
        if project != self.active_project {
            debug!(project = %project, secret = %name, "create finished for an inactive project");
            return Vec::new();
        }
        self.loading = None;
        if let Some(text) = error {
            self.set_error(format!("Error creating secret: {text}"));
            return Vec::new();
        }
        self.set_success("Secret created successfully");
        self.set_view(View::List);
        self.reload_secrets()
    }

    fn on_secret_deleted(&mut self, project: String, name: String, result: Result<(), TaskError>) -> Vec<Task> {
        let error = result.err().map(|e| e.to_string());
        self.audit.secret_delete(&project, &name, error.as_deref());
        if project != self.active_project {
            debug!(project = %project, secret = %name, "delete finished for an inactive project");
            return Vec::new();
        }
        self.loading = None;
        if let Some(text) = error {
            self.set_error(format!("Error deleting secret: {text}"));
            return Vec::new();
        }
        self.set_success("Secret deleted successfully");
        self.set_view(View::List);
        self.selected = None;
        self.versions.clear();
        self.reload_secrets()
    }

    fn on_version_added(
        &mut self,
        project: String,
        secret: String,
        result: Result<SecretVersion, TaskError>,
    ) -> Vec<Task> {
        let version = match result {
            Ok(version) => version,
            Err(err) => {
                let text = err.to_string();
                self.audit.version_add(&project, &secret, "", Some(&text));
                if project == self.active_project {
                    self.loading = None;
                    self.set_error(format!("Error adding version: {text}"));
                }
                return Vec::new();
            }
        };
        self.audit.version_add(&project, &secret, &version.name, None);
        if project != self.active_project {
            debug!(project = %project, secret = %secret, "version added for an inactive project");
            return Vec::new();
        }
        self.loading = None;
        self.set_success(format!("Version {} added successfully", version.name));
        if !self.selected_is(&secret) {
            return Vec::new();
        }
        self.set_view(View::Detail);
        self.version_cursor = 0;
        self.loading = Some("Loading versions...".into());
        vec![Task::LoadVersions { project, secret }]
    }

    pub(crate) fn reload_secrets(&mut self) -> Vec<Task> {
        self.loading = Some("Loading secrets...".into());
        vec![Task::LoadSecrets {
            project: self.active_project.clone(),
        }]
    }

    fn on_clipboard_copied(
        &mut self,
        origin: CopyOrigin,
        result: Result<(), TaskError>,
        now: Instant,
    ) -> Vec<Task> {
        self.loading = None;
        if let Err(err) = result {
            let text = err.to_string();
            if let CopyOrigin::Secret { name, version } = &origin {
                self.audit
                    .secret_copy(&self.active_project, name, version, Some(&text));
            }
            self.set_error(format!("Error copying: {text}"));
            return Vec::new();
        }

        if let CopyOrigin::Secret { name, version } = &origin {
            self.audit.secret_copy(&self.active_project, name, version, None);
        }
        match self.clipboard.arm(now, &self.settings.clipboard) {
            Some(generation) => {
                let secs = self.settings.clipboard.timeout_seconds;
                self.set_success(format!("Copied! Auto-clear in {secs}s"));
                vec![Task::Schedule {
                    after: CLIPBOARD_TICK,
                    msg: Msg::ClipboardTick { generation },
                }]
            }
            None => {
                let text = match origin {
                    CopyOrigin::Secret { .. } => "Secret value copied to clipboard",
                    CopyOrigin::GeneratedCode => "Code copied to clipboard",
                };
                self.set_success(text);
                Vec::new()
            }
        }
    }

    fn on_clipboard_tick(&mut self, generation: u64, now: Instant) -> Vec<Task> {
        match self.clipboard.tick(generation, now) {
            Countdown::Stale => Vec::new(),
            Countdown::Pending(remaining) => {
                self.set_info(format!("Clipboard will clear in {}s", display_secs(remaining)));
                vec![Task::Schedule {
                    after: CLIPBOARD_TICK,
                    msg: Msg::ClipboardTick { generation },
                }]
            }
            Countdown::Expired => vec![Task::ClearClipboard],
        }
    }

    fn on_clipboard_cleared(&mut self, result: Result<(), TaskError>) -> Vec<Task> {
        match result {
            Err(err) => {
                let text = err.to_string();
                self.audit.clipboard_clear(Some(&text));
                self.set_error(format!("Failed to clear clipboard: {text}"));
            }
            Ok(()) => {
                self.audit.clipboard_clear(None);
                if !self.session.is_locked() {
                    self.set_success("Clipboard cleared");
                }
            }
        }
        Vec::new()
    }

    fn on_session_tick(&mut self, now: Instant) -> Vec<Task> {
        let mut tasks = vec![Task::Schedule {
            after: SESSION_CHECK_INTERVAL,
            msg: Msg::SessionTick,
        }];
        let locked = self.session.check(
            now,
            &self.settings.session,
            self.view,
            &mut self.vault,
            &mut self.clipboard,
        );
        if let Some(locked) = locked {
            self.revealed_version.clear();
            self.view = View::Locked;
            self.audit.session_lock(&self.active_project, "inactivity");
            self.set_info("Session locked due to inactivity");
            if locked.clear_clipboard {
                tasks.push(Task::ClearClipboard);
            }
        }
        tasks
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_project(&self) -> &str {
        &self.active_project
    }

    pub fn items(&self) -> Vec<&NamespaceNode> {
        self.tree.list(&self.path, self.filter.value())
    }

    pub fn current_path(&self) -> &[String] {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Secret> {
        self.selected.as_ref()
    }

    pub fn versions(&self) -> &[SecretVersion] {
        &self.versions
    }

    pub fn revealed_len(&self) -> usize {
        self.vault.len()
    }

    /// Text of the revealed value for one render pass.
    pub fn revealed_text(&self) -> Zeroizing<String> {
        self.vault.as_display_string()
    }

    pub fn is_locked(&self) -> bool {
        self.session.is_locked()
    }

    pub fn clipboard_pending(&self) -> bool {
        self.clipboard.is_pending()
    }

    pub fn audit_path(&self) -> &std::path::Path {
        self.audit.path()
    }
}
