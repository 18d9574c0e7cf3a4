use std::fs;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;
use zeroize::Zeroizing;

use terminal_secrets::audit::{AuditEvent, EventType};
use terminal_secrets::config::Settings;
use terminal_secrets::controller::{Controller, CopyOrigin, Msg, Task, TaskError, View};
use terminal_secrets::models::{Secret, SecretVersion, VersionState};
use terminal_secrets::store::StoreError;

struct Harness {
    _dir: TempDir,
    controller: Controller,
    t0: Instant,
}

impl Harness {
    fn new(configure: impl FnOnce(&mut Settings)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.project_id = "demo".into();
        settings.audit.file_path = Some(dir.path().join("audit.log").to_string_lossy().into_owned());
        configure(&mut settings);
        let t0 = Instant::now();
        let controller = Controller::new(settings, dir.path().join("unused.log"), t0);
        Self {
            _dir: dir,
            controller,
            t0,
        }
    }

    fn at(&self, secs: u64) -> Instant {
        self.t0 + Duration::from_secs(secs)
    }

    fn send(&mut self, msg: Msg, secs: u64) -> Vec<Task> {
        let now = self.at(secs);
        self.controller.handle(msg, now)
    }

    fn press(&mut self, code: KeyCode, secs: u64) -> Vec<Task> {
        self.send(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)), secs)
    }

    fn ctrl(&mut self, c: char, secs: u64) -> Vec<Task> {
        self.send(Msg::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)), secs)
    }

    fn type_text(&mut self, text: &str, secs: u64) {
        for c in text.chars() {
            self.press(KeyCode::Char(c), secs);
        }
    }

    fn audit(&self) -> Vec<AuditEvent> {
        let raw = fs::read_to_string(self.controller.audit_path()).unwrap_or_default();
        raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    fn audit_count(&self, kind: EventType) -> usize {
        self.audit().iter().filter(|e| e.event_type == kind).count()
    }

    /// Connects and loads `a/x`, `a/y` and `b`.
    fn connected(mut self) -> Self {
        let start = self.controller.start();
        assert!(start.iter().any(|t| matches!(t, Task::Connect { project } if project == "demo")));
        let tasks = self.send(
            Msg::Connected {
                project: "demo".into(),
                result: Ok("alice@local".into()),
            },
            0,
        );
        assert!(matches!(tasks.as_slice(), [Task::LoadSecrets { .. }]));
        self.send(
            Msg::SecretsLoaded {
                project: "demo".into(),
                result: Ok(vec![secret("a/x"), secret("a/y"), secret("b")]),
            },
            0,
        );
        self
    }

    /// Opens `a/x` and loads two versions.
    fn in_detail(mut self) -> Self {
        self.press(KeyCode::Enter, 1);
        let tasks = self.press(KeyCode::Enter, 1);
        assert!(matches!(tasks.as_slice(), [Task::LoadVersions { secret, .. }] if secret == "a/x"));
        self.send(
            Msg::VersionsLoaded {
                secret: "a/x".into(),
                result: Ok(vec![version("2"), version("1")]),
            },
            1,
        );
        assert_eq!(self.controller.view(), View::Detail);
        self
    }

    /// Reveals version 2 of `a/x`.
    fn revealed(mut self) -> Self {
        let tasks = self.press(KeyCode::Char('r'), 2);
        match tasks.as_slice() {
            [Task::AccessVersion { secret, version, .. }] => {
                assert_eq!(secret, "a/x");
                assert_eq!(version, "2");
            }
            _ => panic!("expected an access task"),
        }
        self.send(
            Msg::ValueAccessed {
                secret: "a/x".into(),
                version: "2".into(),
                result: Ok(Zeroizing::new(b"s3cret".to_vec())),
            },
            2,
        );
        assert_eq!(self.controller.view(), View::Reveal);
        self
    }
}

fn secret(name: &str) -> Secret {
    Secret {
        name: name.into(),
        create_time: "2024-01-01T00:00:00Z".into(),
        replication: "automatic".into(),
        labels: Default::default(),
    }
}

fn version(name: &str) -> SecretVersion {
    SecretVersion {
        name: name.into(),
        state: VersionState::Enabled,
        create_time: "2024-01-01T00:00:00Z".into(),
    }
}

fn clipboard_generation(tasks: &[Task]) -> u64 {
    tasks
        .iter()
        .find_map(|t| match t {
            Task::Schedule {
                msg: Msg::ClipboardTick { generation },
                ..
            } => Some(*generation),
            _ => None,
        })
        .expect("a clipboard tick must be scheduled")
}

#[test]
fn browsing_folders_and_filtering() {
    let mut h = Harness::new(|_| {}).connected();
    assert_eq!(h.controller.status().text, "Loaded 3 secrets");
    let names: Vec<_> = h.controller.items().iter().map(|n| (n.name.clone(), n.is_folder)).collect();
    assert_eq!(names, [("a".to_string(), true), ("b".to_string(), false)]);

    h.press(KeyCode::Enter, 1);
    assert_eq!(h.controller.current_path(), ["a".to_string()]);
    assert_eq!(h.controller.items().len(), 2);

    h.press(KeyCode::Esc, 1);
    assert!(h.controller.current_path().is_empty());

    h.press(KeyCode::Char('/'), 1);
    assert_eq!(h.controller.view(), View::Filter);
    h.type_text("B", 1);
    let filtered: Vec<_> = h.controller.items().iter().map(|n| n.name.clone()).collect();
    assert_eq!(filtered, ["b"]);
    h.press(KeyCode::Enter, 1);
    assert_eq!(h.controller.view(), View::List);

    // Esc at the root clears an active filter.
    h.press(KeyCode::Esc, 1);
    assert_eq!(h.controller.items().len(), 2);

    let audit = h.audit();
    assert_eq!(audit[0].event_type, EventType::SessionStart);
    assert_eq!(audit[0].user, "alice@local");
    assert_eq!(h.audit_count(EventType::SecretList), 1);
}

#[test]
fn reveal_then_hide_wipes_the_value() {
    let mut h = Harness::new(|_| {}).connected().in_detail().revealed();
    assert_eq!(h.controller.revealed_text().as_str(), "s3cret");

    h.press(KeyCode::Esc, 3);
    assert_eq!(h.controller.view(), View::Detail);
    assert_eq!(h.controller.revealed_len(), 0);

    let reveal = h
        .audit()
        .into_iter()
        .find(|e| e.event_type == EventType::SecretReveal)
        .unwrap();
    assert_eq!(reveal.secret_name, "a/x");
    assert_eq!(reveal.version, "2");
    assert_eq!(h.audit_count(EventType::VersionList), 1);
}

#[test]
fn copy_counts_down_and_clears_once() {
    let mut h = Harness::new(|s| s.clipboard.timeout_seconds = 30)
        .connected()
        .in_detail()
        .revealed();

    let tasks = h.press(KeyCode::Char('c'), 3);
    let (text, origin) = match tasks.into_iter().next() {
        Some(Task::WriteClipboard { text, origin }) => (text, origin),
        _ => panic!("expected a clipboard write"),
    };
    assert_eq!(text.as_str(), "s3cret");
    let tasks = h.send(Msg::ClipboardCopied { origin, result: Ok(()) }, 3);
    let first = clipboard_generation(&tasks);
    assert_eq!(h.controller.status().text, "Copied! Auto-clear in 30s");
    assert_eq!(h.audit_count(EventType::SecretCopy), 1);

    let tasks = h.send(Msg::ClipboardTick { generation: first }, 4);
    assert_eq!(clipboard_generation(&tasks), first);
    assert_eq!(h.controller.status().text, "Clipboard will clear in 29s");

    // A second copy restarts the single countdown.
    let tasks = h.send(
        Msg::ClipboardCopied {
            origin: CopyOrigin::Secret {
                name: "a/x".into(),
                version: "2".into(),
            },
            result: Ok(()),
        },
        10,
    );
    let second = clipboard_generation(&tasks);
    assert_ne!(first, second);
    assert!(h.send(Msg::ClipboardTick { generation: first }, 11).is_empty());

    let tasks = h.send(Msg::ClipboardTick { generation: second }, 39);
    assert_eq!(clipboard_generation(&tasks), second);
    let tasks = h.send(Msg::ClipboardTick { generation: second }, 40);
    assert!(matches!(tasks.as_slice(), [Task::ClearClipboard]));
    assert!(!h.controller.clipboard_pending());
    assert!(h.send(Msg::ClipboardTick { generation: second }, 41).is_empty());

    h.send(Msg::ClipboardCleared { result: Ok(()) }, 40);
    assert_eq!(h.controller.status().text, "Clipboard cleared");
    assert_eq!(h.audit_count(EventType::ClipboardClear), 1);
}

#[test]
fn copy_without_auto_clear_schedules_nothing() {
    let mut h = Harness::new(|s| s.clipboard.auto_clear = false).connected().in_detail();
    let tasks = h.press(KeyCode::Char('y'), 2);
    assert!(matches!(tasks.as_slice(), [Task::CopyVersion { version, .. }] if version == "2"));
    let tasks = h.send(
        Msg::ClipboardCopied {
            origin: CopyOrigin::Secret {
                name: "a/x".into(),
                version: "2".into(),
            },
            result: Ok(()),
        },
        2,
    );
    assert!(tasks.is_empty());
    assert!(!h.controller.clipboard_pending());
    assert_eq!(h.controller.status().text, "Secret value copied to clipboard");
}

#[test]
fn inactivity_locks_once_and_unlock_restores_detail() {
    let mut h = Harness::new(|s| {
        s.session.inactivity_timeout_minutes = 5;
        s.session.lock_on_timeout = true;
    })
    .connected()
    .in_detail()
    .revealed();

    let tasks = h.press(KeyCode::Char('c'), 3);
    let origin = match tasks.into_iter().next() {
        Some(Task::WriteClipboard { origin, .. }) => origin,
        _ => panic!("expected a clipboard write"),
    };
    h.send(Msg::ClipboardCopied { origin, result: Ok(()) }, 3);

    // Not idle long enough yet.
    let tasks = h.send(Msg::SessionTick, 200);
    assert!(matches!(tasks.as_slice(), [Task::Schedule { msg: Msg::SessionTick, .. }]));
    assert!(!h.controller.is_locked());

    let tasks = h.send(Msg::SessionTick, 3 + 300);
    assert!(h.controller.is_locked());
    assert_eq!(h.controller.view(), View::Locked);
    assert_eq!(h.controller.revealed_len(), 0);
    assert!(tasks.iter().any(|t| matches!(t, Task::ClearClipboard)));

    h.send(Msg::SessionTick, 400);
    assert_eq!(h.audit_count(EventType::SessionLock), 1);

    // Only Enter or Space reach a locked session.
    assert!(h.press(KeyCode::Char('r'), 401).is_empty());
    assert!(h.controller.is_locked());
    h.press(KeyCode::Enter, 402);
    assert!(!h.controller.is_locked());
    assert_eq!(h.controller.view(), View::Detail);
    assert_eq!(h.controller.status().text, "Session unlocked");
    assert_eq!(h.audit_count(EventType::SessionUnlock), 1);
}

#[test]
fn completions_during_lock_keep_the_lock_screen() {
    let mut h = Harness::new(|s| s.session.inactivity_timeout_minutes = 5)
        .connected()
        .in_detail();
    h.press(KeyCode::Char('a'), 2);
    h.type_text("next", 2);
    let tasks = h.press(KeyCode::Enter, 2);
    assert!(matches!(tasks.as_slice(), [Task::AddVersion { .. }]));

    h.send(Msg::SessionTick, 2 + 300);
    assert_eq!(h.controller.view(), View::Locked);
    let tasks = h.send(
        Msg::VersionAdded {
            project: "demo".into(),
            secret: "a/x".into(),
            result: Ok(version("3")),
        },
        303,
    );
    assert!(matches!(tasks.as_slice(), [Task::LoadVersions { .. }]));
    assert!(h.controller.is_locked());
    assert_eq!(h.controller.view(), View::Locked);
    h.send(
        Msg::VersionsLoaded {
            secret: "a/x".into(),
            result: Ok(vec![version("3"), version("2"), version("1")]),
        },
        303,
    );
    assert_eq!(h.controller.view(), View::Locked);

    h.press(KeyCode::Enter, 304);
    assert_eq!(h.controller.view(), View::Detail);
    assert_eq!(h.controller.versions().len(), 3);

    h.press(KeyCode::Char('d'), 305);
    let tasks = h.press(KeyCode::Char('y'), 305);
    assert!(matches!(tasks.as_slice(), [Task::DeleteSecret { .. }]));
    h.send(Msg::SessionTick, 305 + 300);
    assert_eq!(h.controller.view(), View::Locked);
    let tasks = h.send(
        Msg::SecretDeleted {
            project: "demo".into(),
            name: "a/x".into(),
            result: Ok(()),
        },
        606,
    );
    assert!(matches!(tasks.as_slice(), [Task::LoadSecrets { .. }]));
    assert_eq!(h.controller.view(), View::Locked);

    h.press(KeyCode::Enter, 607);
    assert_eq!(h.controller.view(), View::List);
    assert!(h.controller.selected().is_none());
}

#[test]
fn completion_for_previous_project_is_recorded_there() {
    let mut h = Harness::new(|s| s.recent_projects = vec!["demo".into(), "other".into()]).connected();
    h.press(KeyCode::Char('n'), 1);
    h.type_text("new", 1);
    let tasks = h.press(KeyCode::Enter, 1);
    assert!(matches!(tasks.as_slice(), [Task::CreateSecret { project, .. }] if project == "demo"));

    h.ctrl('p', 2);
    h.press(KeyCode::Down, 2);
    h.press(KeyCode::Enter, 2);
    assert_eq!(h.controller.active_project(), "other");

    let tasks = h.send(
        Msg::SecretCreated {
            project: "demo".into(),
            name: "new".into(),
            result: Ok(()),
        },
        3,
    );
    assert!(tasks.is_empty());
    assert_eq!(h.controller.view(), View::List);
    assert_eq!(h.controller.loading(), Some("Connecting..."));
    assert_eq!(h.controller.status().text, "Switched to: other");

    let created = h
        .audit()
        .into_iter()
        .find(|e| e.event_type == EventType::SecretCreate)
        .unwrap();
    assert_eq!(created.project_id, "demo");
    assert_eq!(created.secret_name, "new");
}

#[test]
fn pointer_activity_defers_the_lock() {
    let mut h = Harness::new(|s| s.session.inactivity_timeout_minutes = 5).connected();
    h.send(Msg::Mouse, 200);
    h.send(Msg::SessionTick, 300);
    assert!(!h.controller.is_locked());
    h.send(Msg::SessionTick, 500);
    assert!(h.controller.is_locked());
}

#[test]
fn ctrl_c_quits_even_when_locked() {
    let mut h = Harness::new(|s| s.session.inactivity_timeout_minutes = 5).connected();
    h.send(Msg::SessionTick, 600);
    assert!(h.controller.is_locked());
    let tasks = h.ctrl('c', 601);
    assert!(matches!(tasks.as_slice(), [Task::Quit]));
}

#[test]
fn late_value_after_leaving_detail_is_discarded() {
    let mut h = Harness::new(|_| {}).connected().in_detail();
    h.press(KeyCode::Char('r'), 2);
    // Ctrl+P is honoured while the access is in flight.
    h.ctrl('p', 2);
    assert_eq!(h.controller.view(), View::ProjectSwitch);

    h.send(
        Msg::ValueAccessed {
            secret: "a/x".into(),
            version: "2".into(),
            result: Ok(Zeroizing::new(b"late".to_vec())),
        },
        3,
    );
    assert_eq!(h.controller.view(), View::ProjectSwitch);
    assert_eq!(h.controller.revealed_len(), 0);
    let reveal = h
        .audit()
        .into_iter()
        .find(|e| e.event_type == EventType::SecretReveal)
        .unwrap();
    assert_eq!(reveal.details.get("discarded").map(String::as_str), Some("stale"));
}

#[test]
fn versions_for_another_secret_are_ignored() {
    let mut h = Harness::new(|_| {}).connected().in_detail();
    h.send(
        Msg::VersionsLoaded {
            secret: "b".into(),
            result: Ok(vec![version("9")]),
        },
        2,
    );
    assert_eq!(h.controller.versions().len(), 2);
    assert_eq!(h.controller.versions()[0].name, "2");
}

#[test]
fn store_errors_keep_the_view() {
    let mut h = Harness::new(|_| {}).connected().in_detail();
    h.press(KeyCode::Char('r'), 2);
    h.send(
        Msg::ValueAccessed {
            secret: "a/x".into(),
            version: "2".into(),
            result: Err(TaskError::Store(StoreError::VersionUnavailable {
                secret: "a/x".into(),
                version: "2".into(),
                state: "DISABLED",
            })),
        },
        2,
    );
    assert_eq!(h.controller.view(), View::Detail);
    assert!(h.controller.status().text.starts_with("Error accessing secret"));
    let reveal = h
        .audit()
        .into_iter()
        .find(|e| e.event_type == EventType::SecretReveal)
        .unwrap();
    assert!(!reveal.error.is_empty());
}

#[test]
fn create_validates_and_warns_about_collisions() {
    let mut h = Harness::new(|_| {}).connected();
    h.press(KeyCode::Char('n'), 1);
    assert_eq!(h.controller.view(), View::Create);

    assert!(h.ctrl('s', 1).is_empty());
    assert_eq!(h.controller.status().text, "Secret name is required");

    h.type_text("b/z", 1);
    h.press(KeyCode::Tab, 1);
    h.type_text("v", 1);
    let tasks = h.ctrl('s', 1);
    match tasks.as_slice() {
        [Task::CreateSecret {
            name,
            value,
            location,
            ..
        }] => {
            assert_eq!(name, "b/z");
            assert_eq!(value.as_slice(), b"v");
            assert_eq!(*location, None);
        }
        _ => panic!("expected a create task"),
    }
    assert!(h.controller.status().text.contains("'b' is already a secret"));

    let tasks = h.send(
        Msg::SecretCreated {
            project: "demo".into(),
            name: "b/z".into(),
            result: Ok(()),
        },
        2,
    );
    assert!(matches!(tasks.as_slice(), [Task::LoadSecrets { .. }]));
    assert_eq!(h.controller.view(), View::List);
    assert_eq!(h.audit_count(EventType::SecretCreate), 1);
}

#[test]
fn create_inside_folder_prefills_and_uses_saved_location() {
    let mut h = Harness::new(|s| s.secret_locations = vec!["europe-west1".into()]).connected();
    h.press(KeyCode::Enter, 1);
    h.press(KeyCode::Char('n'), 1);
    h.type_text("new", 1);
    h.press(KeyCode::Tab, 1);
    h.type_text("secret", 1);
    let tasks = h.press(KeyCode::Enter, 1);
    match tasks.as_slice() {
        [Task::CreateSecret { name, location, .. }] => {
            assert_eq!(name, "a/new");
            assert_eq!(location.as_deref(), Some("europe-west1"));
        }
        _ => panic!("expected a create task"),
    }
}

#[test]
fn delete_from_list_and_cancel() {
    let mut h = Harness::new(|_| {}).connected();
    h.press(KeyCode::Down, 1);
    h.press(KeyCode::Char('d'), 1);
    assert_eq!(h.controller.view(), View::DeleteConfirm);
    h.press(KeyCode::Char('n'), 1);
    assert_eq!(h.controller.view(), View::List);

    h.press(KeyCode::Char('d'), 1);
    let tasks = h.press(KeyCode::Char('y'), 1);
    assert!(matches!(tasks.as_slice(), [Task::DeleteSecret { secret, .. }] if secret == "b"));
    h.send(
        Msg::SecretDeleted {
            project: "demo".into(),
            name: "b".into(),
            result: Ok(()),
        },
        2,
    );
    assert_eq!(h.controller.view(), View::List);
    assert_eq!(h.audit_count(EventType::SecretDelete), 1);
}

#[test]
fn add_version_returns_to_detail_and_reloads() {
    let mut h = Harness::new(|_| {}).connected().in_detail();
    h.press(KeyCode::Char('a'), 2);
    assert_eq!(h.controller.view(), View::AddVersion);
    h.press(KeyCode::Enter, 2);
    assert_eq!(h.controller.status().text, "Value is required");
    h.type_text("next", 2);
    let tasks = h.press(KeyCode::Enter, 2);
    assert!(matches!(tasks.as_slice(), [Task::AddVersion { secret, .. }] if secret == "a/x"));

    let tasks = h.send(
        Msg::VersionAdded {
            project: "demo".into(),
            secret: "a/x".into(),
            result: Ok(version("3")),
        },
        3,
    );
    assert!(matches!(tasks.as_slice(), [Task::LoadVersions { .. }]));
    assert_eq!(h.controller.view(), View::Detail);
    assert_eq!(h.controller.status().text, "Version 3 added successfully");
}

#[test]
fn generate_code_renders_and_copies() {
    let mut h = Harness::new(|_| {}).connected().in_detail();
    h.press(KeyCode::Char('g'), 2);
    assert_eq!(h.controller.view(), View::GenerateCode);
    h.press(KeyCode::Enter, 2);
    let tasks = h.press(KeyCode::Char('c'), 2);
    match tasks.as_slice() {
        [Task::WriteClipboard { text, origin }] => {
            assert_eq!(*origin, CopyOrigin::GeneratedCode);
            assert!(text.contains("a/x"));
        }
        _ => panic!("expected a clipboard write"),
    }
}

#[test]
fn project_switch_reconnects_and_audits() {
    let mut h = Harness::new(|s| s.recent_projects = vec!["demo".into(), "other".into()]).connected();
    h.ctrl('p', 1);
    h.type_text("demo", 1);
    h.press(KeyCode::Enter, 1);
    assert_eq!(h.controller.status().text, "Already on this project");
    assert_eq!(h.controller.view(), View::List);

    h.ctrl('p', 2);
    h.press(KeyCode::Down, 2);
    let tasks = h.press(KeyCode::Enter, 2);
    assert!(tasks.iter().any(|t| matches!(t, Task::SaveConfig(_))));
    assert!(tasks.iter().any(|t| matches!(t, Task::Connect { project } if project == "other")));
    assert_eq!(h.controller.active_project(), "other");
    assert_eq!(h.controller.settings().recent_projects[0], "other");
    assert!(h.controller.items().is_empty());

    // The old project's late listing no longer applies.
    h.send(
        Msg::SecretsLoaded {
            project: "demo".into(),
            result: Ok(vec![secret("stale")]),
        },
        3,
    );
    assert!(h.controller.items().is_empty());

    let switch = h
        .audit()
        .into_iter()
        .find(|e| e.event_type == EventType::ProjectSwitch)
        .unwrap();
    assert_eq!(switch.project_id, "other");
    assert_eq!(switch.details.get("previous_project").map(String::as_str), Some("demo"));
}

#[test]
fn missing_project_prompts_first() {
    let mut h = Harness::new(|s| s.project_id.clear());
    assert_eq!(h.controller.view(), View::ProjectPrompt);
    let start = h.controller.start();
    assert!(!start.iter().any(|t| matches!(t, Task::Connect { .. })));

    h.press(KeyCode::Enter, 0);
    assert_eq!(h.controller.status().text, "Project ID is required");
    h.type_text("fresh", 0);
    let tasks = h.press(KeyCode::Enter, 0);
    assert!(tasks.iter().any(|t| matches!(t, Task::Connect { project } if project == "fresh")));
    assert_eq!(h.controller.view(), View::List);
}

#[test]
fn security_toggles_are_audited() {
    let mut h = Harness::new(|_| {}).connected();
    h.ctrl('s', 1);
    assert_eq!(h.controller.view(), View::ConfigMenu);
    for _ in 0..3 {
        h.press(KeyCode::Down, 1);
    }
    h.press(KeyCode::Enter, 1);
    assert_eq!(h.controller.view(), View::ConfigSecurity);

    h.press(KeyCode::Enter, 1);
    assert!(!h.controller.settings().clipboard.auto_clear);
    h.press(KeyCode::Down, 1);
    h.press(KeyCode::Char(' '), 1);
    assert_eq!(h.controller.settings().clipboard.timeout_seconds, 60);

    let changes: Vec<_> = h
        .audit()
        .into_iter()
        .filter(|e| e.event_type == EventType::ConfigChange)
        .collect();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].details.get("setting").map(String::as_str), Some("clipboard.timeout_seconds"));
    assert_eq!(changes[1].details.get("new_value").map(String::as_str), Some("60"));

    // Disabling the journal records the change before it stops writing.
    h.press(KeyCode::Down, 1);
    h.press(KeyCode::Enter, 1);
    assert!(!h.controller.settings().audit.enabled);
    let before = h.audit().len();
    h.press(KeyCode::Up, 1);
    h.press(KeyCode::Enter, 1);
    assert_eq!(h.audit().len(), before);
    assert_eq!(
        h.audit().last().and_then(|e| e.details.get("setting").cloned()).as_deref(),
        Some("audit.enabled")
    );
}

#[test]
fn save_and_exit_persists_settings() {
    let mut h = Harness::new(|_| {}).connected();
    h.ctrl('s', 1);
    for _ in 0..4 {
        h.press(KeyCode::Down, 1);
    }
    let tasks = h.press(KeyCode::Enter, 1);
    assert!(matches!(tasks.as_slice(), [Task::SaveConfig(s)] if s.project_id == "demo"));
    assert_eq!(h.controller.view(), View::List);
    assert_eq!(h.controller.status().text, "Configuration saved");
}

#[test]
fn shutdown_reports_owed_clipboard_clear() {
    let mut h = Harness::new(|_| {}).connected().in_detail().revealed();
    let tasks = h.press(KeyCode::Char('c'), 3);
    let origin = match tasks.into_iter().next() {
        Some(Task::WriteClipboard { origin, .. }) => origin,
        _ => panic!("expected a clipboard write"),
    };
    h.send(Msg::ClipboardCopied { origin, result: Ok(()) }, 3);
    assert!(h.controller.shutdown());
    assert_eq!(h.controller.revealed_len(), 0);
    assert_eq!(h.audit_count(EventType::SessionEnd), 1);
}
