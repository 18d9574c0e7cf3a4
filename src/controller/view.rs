use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use zeroize::{Zeroize, Zeroizing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    ProjectPrompt,
    List,
    Detail,
    Create,
    AddVersion,
    DeleteConfirm,
    GenerateCode,
    ConfigMenu,
    ConfigBasic,
    ConfigTemplates,
    ConfigTemplateEdit,
    ConfigRecentProjects,
    ConfigSecurity,
    AuditLog,
    Filter,
    Reveal,
    ProjectSwitch,
    Locked,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::ProjectPrompt => "Select project",
            View::List => "Secrets",
            View::Detail => "Secret details",
            View::Create => "Create secret",
            View::AddVersion => "Add version",
            View::DeleteConfirm => "Delete secret",
            View::GenerateCode => "Generate code",
            View::ConfigMenu => "Settings",
            View::ConfigBasic => "Basic settings",
            View::ConfigTemplates => "Templates",
            View::ConfigTemplateEdit => "Edit template",
            View::ConfigRecentProjects => "Recent projects",
            View::ConfigSecurity => "Security",
            View::AuditLog => "Audit log",
            View::Filter => "Filter",
            View::Reveal => "Revealed value",
            View::ProjectSwitch => "Switch project",
            View::Locked => "Locked",
        }
    }

    /// Views where a revealed value may be alive.
    pub fn holds_secret(self) -> bool {
        matches!(self, View::Detail | View::Reveal)
    }
}

/// Single text field. Contents are wiped on clear and on drop.
#[derive(Default)]
pub struct Input {
    value: Zeroizing<String>,
}

impl Input {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn set(&mut self, value: &str) {
        self.clear();
        self.value.push_str(value);
    }

    pub fn clear(&mut self) {
        self.value.zeroize();
    }

    pub fn take(&mut self) -> Zeroizing<String> {
        std::mem::take(&mut self.value)
    }

    /// Applies an editing key. Returns whether the key was consumed.
    pub fn handle(&mut self, key: &KeyEvent, multiline: bool) -> bool {
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.value.push(c);
                true
            }
            KeyCode::Backspace => {
                self.value.pop();
                true
            }
            KeyCode::Enter if multiline => {
                self.value.push('\n');
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateField {
    #[default]
    Name,
    Value,
    Location,
}

impl CreateField {
    pub fn next(self) -> Self {
        match self {
            CreateField::Name => CreateField::Value,
            CreateField::Value => CreateField::Location,
            CreateField::Location => CreateField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            CreateField::Name => CreateField::Location,
            CreateField::Value => CreateField::Name,
            CreateField::Location => CreateField::Value,
        }
    }
}

/// Create-secret form.
///
/// `location` is `-1` for "add a new region", `0` for automatic replication
/// and `1..=N` for the saved regions.
#[derive(Default)]
pub struct CreateForm {
    pub name: Input,
    pub value: Input,
    pub focus: CreateField,
    pub location: isize,
    pub multiline: bool,
    pub adding_location: bool,
    pub new_location: Input,
}

impl CreateForm {
    pub fn reset(&mut self) {
        self.name.clear();
        self.value.clear();
        self.new_location.clear();
        self.focus = CreateField::Name;
        self.location = 0;
        self.multiline = false;
        self.adding_location = false;
    }

    /// Moves the location selector by `step`, wrapping across `-1..=saved`.
    pub fn cycle_location(&mut self, step: isize, saved: usize) {
        let saved = saved as isize;
        let next = self.location + step;
        self.location = if next < -1 {
            saved
        } else if next > saved {
            -1
        } else {
            next
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateField {
    #[default]
    Title,
    Code,
}

#[derive(Default)]
pub struct TemplateForm {
    /// Index being edited; `None` for a new template.
    pub editing: Option<usize>,
    pub title: Input,
    pub code: Input,
    pub focus: TemplateField,
}

#[derive(Default)]
pub struct BasicForm {
    pub project: Input,
    pub separator: Input,
    /// 0 = project id, 1 = folder separator.
    pub focus: usize,
}

#[derive(Default)]
pub struct SwitchState {
    pub input: Input,
    pub cursor: usize,
}

#[derive(Default)]
pub struct GenerateState {
    pub cursor: usize,
    pub output: Option<Result<String, String>>,
}

pub const SECURITY_OPTIONS: usize = 7;
pub const CONFIG_MENU_ITEMS: [&str; 5] = [
    "Basic settings",
    "Templates",
    "Recent projects",
    "Security",
    "Save & exit",
];
pub const MAX_SWITCH_PROJECTS: usize = 15;
pub const AUDIT_VIEW_LINES: usize = 500;
