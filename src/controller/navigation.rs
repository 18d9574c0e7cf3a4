use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use zeroize::Zeroizing;

use super::view::MAX_SWITCH_PROJECTS;
use super::{Controller, CopyOrigin, StatusKind, Task, View};
use crate::store::LATEST;
use crate::template::{render, TemplateContext};

impl Controller {
    pub(super) fn on_list_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if self.loading.is_some() {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('r') => {
                    self.set_info("Refreshing...");
                    self.reload_secrets()
                }
                KeyCode::Char('s') => {
                    self.menu_cursor = 0;
                    self.set_view(View::ConfigMenu);
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        let len = self.items().len();
        let visible = self.visible_height();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    if self.cursor < self.offset {
                        self.offset = self.cursor;
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                    if self.cursor >= self.offset + visible {
                        self.offset = self.cursor + 1 - visible;
                    }
                }
            }
            KeyCode::Char('g') => {
                self.cursor = 0;
                self.offset = 0;
            }
            KeyCode::Char('G') => {
                if len > 0 {
                    self.cursor = len - 1;
                    self.offset = (self.cursor + 1).saturating_sub(visible);
                }
            }
            KeyCode::Enter | KeyCode::Char('l') => return self.open_selected(),
            KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Esc => {
                if self.path.pop().is_some() {
                    self.cursor = 0;
                    self.offset = 0;
                } else if !self.filter.is_empty() {
                    self.filter.clear();
                    self.cursor = 0;
                    self.offset = 0;
                }
            }
            KeyCode::Char('/') => self.set_view(View::Filter),
            KeyCode::Char('n') => self.open_create(),
            KeyCode::Char('d') => {
                let leaf = self
                    .items()
                    .get(self.cursor)
                    .and_then(|node| node.secret.clone());
                if let Some(secret) = leaf {
                    self.selected = Some(secret);
                    self.delete_return = View::List;
                    self.set_view(View::DeleteConfirm);
                }
            }
            KeyCode::Char('q') => return vec![Task::Quit],
            _ => {}
        }
        Vec::new()
    }

    fn open_selected(&mut self) -> Vec<Task> {
        let Some(node) = self.items().get(self.cursor).copied() else {
            return Vec::new();
        };
        if node.is_folder {
            let name = node.name.clone();
            self.path.push(name);
            self.cursor = 0;
            self.offset = 0;
            return Vec::new();
        }
        let Some(secret) = node.secret.clone() else {
            return Vec::new();
        };
        let name = secret.name.clone();
        self.selected = Some(secret);
        self.versions.clear();
        self.version_cursor = 0;
        self.set_view(View::Detail);
        self.loading = Some("Loading versions...".into());
        vec![Task::LoadVersions {
            project: self.active_project.clone(),
            secret: name,
        }]
    }

    fn open_create(&mut self) {
        self.create.reset();
        if !self.path.is_empty() {
            let sep = &self.settings.folder_separator;
            let prefix = format!("{}{sep}", self.path.join(sep));
            self.create.name.set(&prefix);
        }
        self.create.location = if self.settings.secret_locations.is_empty() {
            0
        } else {
            1
        };
        self.set_view(View::Create);
    }

    pub(super) fn on_filter_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.cursor = 0;
                self.offset = 0;
                self.set_view(View::List);
            }
            _ => {
                if self.filter.handle(&key, false) {
                    self.cursor = 0;
                    self.offset = 0;
                }
            }
        }
        Vec::new()
    }

    /// Version addressed by the detail cursor, or `latest` before the list arrives.
    fn cursor_version(&self) -> String {
        self.versions
            .get(self.version_cursor)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| LATEST.to_string())
    }

    pub(super) fn on_detail_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if self.loading.is_some() {
            return Vec::new();
        }
        let Some(secret) = self.selected.as_ref().map(|s| s.name.clone()) else {
            self.set_view(View::List);
            return Vec::new();
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.version_cursor = self.version_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.version_cursor + 1 < self.versions.len() {
                    self.version_cursor += 1;
                }
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
                self.selected = None;
                self.versions.clear();
                self.set_view(View::List);
            }
            KeyCode::Char('r') => {
                self.loading = Some("Accessing secret...".into());
                return vec![Task::AccessVersion {
                    project: self.active_project.clone(),
                    secret,
                    version: self.cursor_version(),
                }];
            }
            KeyCode::Char('c') | KeyCode::Char('y') => {
                self.loading = Some("Copying to clipboard...".into());
                return vec![Task::CopyVersion {
                    project: self.active_project.clone(),
                    secret,
                    version: self.cursor_version(),
                }];
            }
            KeyCode::Char('a') => {
                self.new_version.clear();
                self.set_view(View::AddVersion);
            }
            KeyCode::Char('g') => {
                self.generate.cursor = 0;
                self.generate.output = None;
                self.set_view(View::GenerateCode);
            }
            KeyCode::Char('d') => {
                self.delete_return = View::Detail;
                self.set_view(View::DeleteConfirm);
            }
            KeyCode::Char('q') => return vec![Task::Quit],
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn on_reveal_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter | KeyCode::Char('r') => {
                self.set_view(View::Detail);
                Vec::new()
            }
            KeyCode::Char('c') | KeyCode::Char('y') => {
                let Some(secret) = self.selected.as_ref() else {
                    return Vec::new();
                };
                if self.vault.is_empty() {
                    return Vec::new();
                }
                vec![Task::WriteClipboard {
                    text: self.vault.as_display_string(),
                    origin: CopyOrigin::Secret {
                        name: secret.name.clone(),
                        version: self.revealed_version.clone(),
                    },
                }]
            }
            _ => Vec::new(),
        }
    }

    pub(super) fn on_delete_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if self.loading.is_some() {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Some(secret) = self.selected.as_ref().map(|s| s.name.clone()) else {
                    self.set_view(self.delete_return);
                    return Vec::new();
                };
                self.loading = Some("Deleting secret...".into());
                vec![Task::DeleteSecret {
                    project: self.active_project.clone(),
                    secret,
                }]
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                if self.delete_return == View::List {
                    self.selected = None;
                }
                self.set_view(self.delete_return);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub(super) fn on_generate_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let count = self.settings.templates.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.generate.cursor = self.generate.cursor.saturating_sub(1);
                self.generate.output = None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.generate.cursor + 1 < count {
                    self.generate.cursor += 1;
                    self.generate.output = None;
                }
            }
            KeyCode::Enter => {
                let Some(secret) = self.selected.as_ref() else {
                    return Vec::new();
                };
                let Some(template) = self.settings.templates.get(self.generate.cursor) else {
                    return Vec::new();
                };
                let ctx = TemplateContext::new(
                    &secret.name,
                    &self.settings.folder_separator,
                    &self.active_project,
                );
                self.generate.output = Some(render(&template.code, &ctx).map_err(|e| e.to_string()));
            }
            KeyCode::Char('c') | KeyCode::Char('y') => {
                if let Some(Ok(code)) = &self.generate.output {
                    return vec![Task::WriteClipboard {
                        text: Zeroizing::new(code.clone()),
                        origin: CopyOrigin::GeneratedCode,
                    }];
                }
                self.set_status("Generate the code first (enter)", StatusKind::Warning);
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
                self.generate.output = None;
                self.set_view(View::Detail);
            }
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn on_project_prompt_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Enter => {
                let project = self.project_input.value().trim().to_string();
                if project.is_empty() {
                    self.set_error("Project ID is required");
                    return Vec::new();
                }
                self.project_input.clear();
                self.settings.project_id = project.clone();
                self.settings.add_recent_project(&project);
                self.active_project = project.clone();
                self.reset_listing();
                self.set_view(View::List);
                self.loading = Some("Connecting...".into());
                vec![self.save_config_task(), Task::Connect { project }]
            }
            KeyCode::Esc => vec![Task::Quit],
            _ => {
                self.project_input.handle(&key, false);
                Vec::new()
            }
        }
    }

    pub(super) fn open_project_switch(&mut self) {
        self.switch_return = match self.view {
            View::Reveal => View::Detail,
            other => other,
        };
        self.switch.input.clear();
        self.switch.cursor = 0;
        self.set_view(View::ProjectSwitch);
    }

    /// Recent projects matching the typed filter, capped for display.
    pub(crate) fn switch_candidates(&self) -> Vec<&str> {
        let needle = self.switch.input.value().to_lowercase();
        self.settings
            .recent_projects
            .iter()
            .filter(|p| needle.is_empty() || p.to_lowercase().contains(&needle))
            .take(MAX_SWITCH_PROJECTS)
            .map(String::as_str)
            .collect()
    }

    pub(super) fn on_project_switch_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let typed = !self.switch.input.is_empty();
        let count = self.switch_candidates().len() + usize::from(typed);
        match key.code {
            KeyCode::Up => {
                self.switch.cursor = self.switch.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.switch.cursor + 1 < count {
                    self.switch.cursor += 1;
                }
            }
            KeyCode::Enter => {
                let choice = if typed && self.switch.cursor == 0 {
                    Some(self.switch.input.value().trim().to_string())
                } else {
                    let idx = self.switch.cursor - usize::from(typed);
                    self.switch_candidates().get(idx).map(|p| p.to_string())
                };
                let Some(project) = choice.filter(|p| !p.is_empty()) else {
                    return Vec::new();
                };
                self.switch.input.clear();
                if project == self.active_project {
                    self.set_info("Already on this project");
                    self.set_view(self.switch_return);
                    return Vec::new();
                }
                return self.switch_project(project);
            }
            KeyCode::Esc => {
                self.switch.input.clear();
                self.set_view(self.switch_return);
            }
            _ => {
                if self.switch.input.handle(&key, false) {
                    self.switch.cursor = 0;
                }
            }
        }
        Vec::new()
    }

    /// Makes `project` active: audited, remembered and reconnected.
    pub(super) fn switch_project(&mut self, project: String) -> Vec<Task> {
        let previous = std::mem::replace(&mut self.active_project, project.clone());
        self.audit.project_switch(&previous, &project);
        self.settings.project_id = project.clone();
        self.settings.add_recent_project(&project);
        self.reset_listing();
        self.set_view(View::List);
        self.set_success(format!("Switched to: {project}"));
        self.loading = Some("Connecting...".into());
        vec![self.save_config_task(), Task::Connect { project }]
    }
}
