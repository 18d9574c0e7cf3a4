use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use zeroize::Zeroizing;

use super::view::CreateField;
use super::{Controller, StatusKind, Task, View};

impl Controller {
    pub(super) fn on_create_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if self.loading.is_some() {
            return Vec::new();
        }
        if self.create.adding_location {
            return self.on_new_location_key(key);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let saved = self.settings.secret_locations.len();
        let focus = self.create.focus;

        match key.code {
            KeyCode::Char('e') if ctrl => {
                self.create.multiline = !self.create.multiline;
                let mode = if self.create.multiline { "multi-line" } else { "single-line" };
                self.set_info(format!("Value input: {mode}"));
            }
            KeyCode::Char('s') if ctrl => return self.submit_create(),
            KeyCode::Tab => self.create.focus = focus.next(),
            KeyCode::BackTab => self.create.focus = focus.prev(),
            KeyCode::Enter => {
                if focus == CreateField::Value && self.create.multiline {
                    self.create.value.handle(&key, true);
                } else if focus == CreateField::Location && self.create.location == -1 {
                    self.create.adding_location = true;
                    self.create.new_location.clear();
                } else {
                    return self.submit_create();
                }
            }
            KeyCode::Esc => {
                self.create.reset();
                self.set_view(View::List);
            }
            KeyCode::Left | KeyCode::Char('h') if focus == CreateField::Location => {
                self.create.cycle_location(-1, saved);
            }
            KeyCode::Right | KeyCode::Char('l') if focus == CreateField::Location => {
                self.create.cycle_location(1, saved);
            }
            _ => match focus {
                CreateField::Name => {
                    self.create.name.handle(&key, false);
                }
                CreateField::Value => {
                    self.create.value.handle(&key, self.create.multiline);
                }
                CreateField::Location => {}
            },
        }
        Vec::new()
    }

    fn on_new_location_key(&mut self, key: KeyEvent) -> Vec<Task> {
        match key.code {
            KeyCode::Enter => {
                let location = self.create.new_location.value().trim().to_string();
                self.create.adding_location = false;
                self.create.new_location.clear();
                if self.settings.add_location(&location) {
                    self.create.location = self.settings.secret_locations.len() as isize;
                    self.set_success(format!("Location added: {location}"));
                    return vec![self.save_config_task()];
                }
                if let Some(idx) = self.settings.secret_locations.iter().position(|l| *l == location) {
                    self.create.location = idx as isize + 1;
                }
            }
            KeyCode::Esc => {
                self.create.adding_location = false;
                self.create.new_location.clear();
            }
            _ => {
                self.create.new_location.handle(&key, false);
            }
        }
        Vec::new()
    }

    fn submit_create(&mut self) -> Vec<Task> {
        let name = self.create.name.value().to_string();
        if name.trim().is_empty() {
            self.set_error("Secret name is required");
            return Vec::new();
        }
        let location = usize::try_from(self.create.location)
            .ok()
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| self.settings.secret_locations.get(idx).cloned());
        let mut text = self.create.value.take();
        let value = Zeroizing::new(std::mem::take(&mut *text).into_bytes());
        self.create.reset();

        match self.tree.conflict_for(&name) {
            Some(conflict) => {
                self.set_status(format!("Creating secret (warning: {conflict})"), StatusKind::Warning)
            }
            None => self.set_info("Creating secret..."),
        }
        self.loading = Some("Creating secret...".into());
        vec![Task::CreateSecret {
            project: self.active_project.clone(),
            name,
            value,
            location,
        }]
    }

    pub(super) fn on_add_version_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if self.loading.is_some() {
            return Vec::new();
        }
        match key.code {
            KeyCode::Enter => {
                if self.new_version.is_empty() {
                    self.set_error("Value is required");
                    return Vec::new();
                }
                let Some(secret) = self.selected.as_ref().map(|s| s.name.clone()) else {
                    self.new_version.clear();
                    self.set_view(View::List);
                    return Vec::new();
                };
                let mut text = self.new_version.take();
                let value = Zeroizing::new(std::mem::take(&mut *text).into_bytes());
                self.loading = Some("Adding version...".into());
                vec![Task::AddVersion {
                    project: self.active_project.clone(),
                    secret,
                    value,
                }]
            }
            KeyCode::Esc => {
                self.new_version.clear();
                self.set_view(View::Detail);
                Vec::new()
            }
            _ => {
                self.new_version.handle(&key, false);
                Vec::new()
            }
        }
    }
}
