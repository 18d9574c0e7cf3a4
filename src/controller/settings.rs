use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::view::{TemplateField, AUDIT_VIEW_LINES, CONFIG_MENU_ITEMS, SECURITY_OPTIONS};
use super::{Controller, Task, View};
use crate::audit::format_entry;
use crate::config::{next_in_cycle, Template, CLIPBOARD_TIMEOUTS, INACTIVITY_MINUTES, RETENTION_DAYS};

fn on_off(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

impl Controller {
    pub(super) fn on_config_menu_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_cursor + 1 < CONFIG_MENU_ITEMS.len() {
                    self.menu_cursor += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('l') => match self.menu_cursor {
                0 => {
                    self.basic.project.set(&self.settings.project_id);
                    self.basic.separator.set(&self.settings.folder_separator);
                    self.basic.focus = 0;
                    self.set_view(View::ConfigBasic);
                }
                1 => {
                    self.template_cursor = 0;
                    self.set_view(View::ConfigTemplates);
                }
                2 => {
                    self.recent_cursor = 0;
                    self.set_view(View::ConfigRecentProjects);
                }
                3 => {
                    self.security_cursor = 0;
                    self.set_view(View::ConfigSecurity);
                }
                _ => return self.save_and_exit(),
            },
            KeyCode::Esc | KeyCode::Char('q') => self.set_view(View::List),
            _ => {}
        }
        Vec::new()
    }

    fn save_and_exit(&mut self) -> Vec<Task> {
        let mut tasks = vec![self.save_config_task()];
        self.set_view(View::List);
        self.set_success("Configuration saved");

        let target = self.settings.project_id.clone();
        if !target.is_empty() && target != self.active_project {
            let previous = std::mem::replace(&mut self.active_project, target.clone());
            self.audit.project_switch(&previous, &target);
            self.reset_listing();
            self.loading = Some("Connecting...".into());
            tasks.push(Task::Connect { project: target });
        } else {
            self.path.clear();
            self.cursor = 0;
            self.offset = 0;
            self.rebuild_tree();
        }
        tasks
    }

    pub(super) fn on_config_basic_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
                self.basic.focus = (self.basic.focus + 1) % 2;
            }
            KeyCode::Enter => {
                let project = self.basic.project.value().trim().to_string();
                if project.is_empty() {
                    self.set_error("Project ID is required");
                    return Vec::new();
                }
                self.settings.add_recent_project(&project);
                self.settings.project_id = project;
                let separator = self.basic.separator.value().to_string();
                if !separator.is_empty() {
                    self.settings.folder_separator = separator;
                }
                self.set_success("Settings updated");
                self.set_view(View::ConfigMenu);
            }
            KeyCode::Esc => self.set_view(View::ConfigMenu),
            _ => {
                let field = if self.basic.focus == 0 {
                    &mut self.basic.project
                } else {
                    &mut self.basic.separator
                };
                field.handle(&key, false);
            }
        }
        Vec::new()
    }

    pub(super) fn on_config_templates_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let count = self.settings.templates.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.template_cursor = self.template_cursor.saturating_sub(1);
            }
            // One extra row past the end stands for "new template".
            KeyCode::Down | KeyCode::Char('j') => {
                if self.template_cursor < count {
                    self.template_cursor += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if self.template_cursor < count {
                    self.edit_template(Some(self.template_cursor));
                } else {
                    self.edit_template(None);
                }
            }
            KeyCode::Char('n') => self.edit_template(None),
            KeyCode::Char('d') => {
                if count <= 1 {
                    self.set_error("At least one template is required");
                } else if self.template_cursor < count {
                    let removed = self.settings.templates.remove(self.template_cursor);
                    if self.template_cursor >= self.settings.templates.len() {
                        self.template_cursor = self.settings.templates.len() - 1;
                    }
                    self.set_success(format!("Template '{}' deleted", removed.title));
                }
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.set_view(View::ConfigMenu),
            _ => {}
        }
        Vec::new()
    }

    fn edit_template(&mut self, index: Option<usize>) {
        let form = &mut self.template_form;
        form.editing = index;
        form.focus = TemplateField::Title;
        match index.and_then(|i| self.settings.templates.get(i)) {
            Some(template) => {
                form.title.set(&template.title);
                form.code.set(&template.code);
            }
            None => {
                form.editing = None;
                form.title.clear();
                form.code.clear();
            }
        }
        self.set_view(View::ConfigTemplateEdit);
    }

    pub(super) fn on_template_edit_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => {
                let title = self.template_form.title.value().trim().to_string();
                if title.is_empty() {
                    self.set_error("Template title is required");
                    return Vec::new();
                }
                let template = Template {
                    title,
                    code: self.template_form.code.value().to_string(),
                };
                match self.template_form.editing {
                    Some(idx) if idx < self.settings.templates.len() => {
                        self.settings.templates[idx] = template;
                        self.set_success("Template updated");
                    }
                    _ => {
                        self.settings.templates.push(template);
                        self.template_cursor = self.settings.templates.len() - 1;
                        self.set_success("Template created");
                    }
                }
                self.set_view(View::ConfigTemplates);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.template_form.focus = match self.template_form.focus {
                    TemplateField::Title => TemplateField::Code,
                    TemplateField::Code => TemplateField::Title,
                };
            }
            // Esc is ignored while editing a non-empty code body.
            KeyCode::Esc => {
                if self.template_form.focus == TemplateField::Title || self.template_form.code.is_empty() {
                    self.set_view(View::ConfigTemplates);
                }
            }
            _ => match self.template_form.focus {
                TemplateField::Title => {
                    self.template_form.title.handle(&key, false);
                }
                TemplateField::Code => {
                    self.template_form.code.handle(&key, true);
                }
            },
        }
        Vec::new()
    }

    pub(super) fn on_recent_projects_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let count = self.settings.recent_projects.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.recent_cursor = self.recent_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.recent_cursor + 1 < count {
                    self.recent_cursor += 1;
                }
            }
            KeyCode::Enter => {
                let Some(project) = self.settings.recent_projects.get(self.recent_cursor).cloned() else {
                    return Vec::new();
                };
                if project == self.active_project {
                    self.set_info("Already on this project");
                    self.set_view(View::List);
                    return Vec::new();
                }
                return self.switch_project(project);
            }
            KeyCode::Char('d') => {
                if let Some(project) = self.settings.recent_projects.get(self.recent_cursor).cloned() {
                    self.settings.remove_recent_project(&project);
                    if self.recent_cursor > 0 && self.recent_cursor >= self.settings.recent_projects.len() {
                        self.recent_cursor -= 1;
                    }
                    self.set_success("Project removed from history");
                }
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.set_view(View::ConfigMenu),
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn on_security_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.security_cursor = self.security_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.security_cursor + 1 < SECURITY_OPTIONS {
                    self.security_cursor += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.apply_security_option(),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.set_view(View::ConfigMenu),
            _ => {}
        }
        Vec::new()
    }

    fn apply_security_option(&mut self) {
        match self.security_cursor {
            0 => {
                let old = self.settings.clipboard.auto_clear;
                self.settings.clipboard.auto_clear = !old;
                self.audit
                    .config_change("clipboard.auto_clear", &old.to_string(), &(!old).to_string());
                self.set_success(format!("Clipboard auto-clear {}", on_off(!old)));
            }
            1 => {
                let old = self.settings.clipboard.timeout_seconds;
                let new = next_in_cycle(old, &CLIPBOARD_TIMEOUTS);
                self.settings.clipboard.timeout_seconds = new;
                self.audit
                    .config_change("clipboard.timeout_seconds", &old.to_string(), &new.to_string());
                self.set_success(format!("Clipboard timeout: {new}s"));
            }
            2 => {
                let old = self.settings.audit.enabled;
                if old {
                    // Recorded before the journal closes.
                    self.audit.config_change("audit.enabled", "true", "false");
                    self.settings.audit.enabled = false;
                    self.reconfigure_audit();
                } else {
                    self.settings.audit.enabled = true;
                    self.reconfigure_audit();
                    self.audit.config_change("audit.enabled", "false", "true");
                }
                self.set_success(format!("Audit logging {}", on_off(!old)));
            }
            3 => {
                let old = self.settings.audit.max_age_days;
                let new = next_in_cycle(old, &RETENTION_DAYS);
                self.settings.audit.max_age_days = new;
                self.reconfigure_audit();
                self.audit
                    .config_change("audit.max_age_days", &old.to_string(), &new.to_string());
                self.set_success(format!("Audit retention: {new} days"));
            }
            4 => {
                self.load_audit_lines();
                self.audit_offset = 0;
                self.set_view(View::AuditLog);
            }
            5 => {
                let old = self.settings.session.lock_on_timeout;
                self.settings.session.lock_on_timeout = !old;
                self.audit
                    .config_change("session.lock_on_timeout", &old.to_string(), &(!old).to_string());
                self.set_success(format!("Lock on timeout {}", on_off(!old)));
            }
            _ => {
                let old = self.settings.session.inactivity_timeout_minutes;
                let new = next_in_cycle(old, &INACTIVITY_MINUTES);
                self.settings.session.inactivity_timeout_minutes = new;
                self.audit.config_change(
                    "session.inactivity_timeout_minutes",
                    &old.to_string(),
                    &new.to_string(),
                );
                if new == 0 {
                    self.set_success("Inactivity timeout: Disabled");
                } else {
                    self.set_success(format!("Inactivity timeout: {new} minutes"));
                }
            }
        }
    }

    pub(crate) fn load_audit_lines(&mut self) {
        self.audit_lines = match self.audit.read_recent(AUDIT_VIEW_LINES) {
            Ok(lines) if lines.is_empty() && !self.audit.is_enabled() => {
                vec!["Audit logging is disabled".to_string()]
            }
            Ok(lines) if lines.is_empty() => vec!["No audit entries yet".to_string()],
            Ok(lines) => lines.iter().map(|line| format_entry(line)).collect(),
            Err(err) => vec![format!("Error reading logs: {err}")],
        };
    }

    fn audit_visible(&self) -> usize {
        usize::from(self.height).saturating_sub(12).max(5)
    }

    pub(super) fn on_audit_log_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let max_offset = self.audit_lines.len().saturating_sub(self.audit_visible());
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.audit_offset = self.audit_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.audit_offset < max_offset {
                    self.audit_offset += 1;
                }
            }
            KeyCode::Char('g') => self.audit_offset = 0,
            KeyCode::Char('G') => self.audit_offset = max_offset,
            KeyCode::Char('r') => {
                self.load_audit_lines();
                self.audit_offset = 0;
                self.set_info("Logs refreshed");
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.set_view(View::ConfigSecurity),
            _ => {}
        }
        Vec::new()
    }
}
