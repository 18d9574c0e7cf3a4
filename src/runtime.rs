//! Executes controller tasks and feeds their completions back in order.
//!
//! Store and clipboard calls run on short-lived worker threads and report
//! through one mpsc channel. Timers are kept here as `(deadline, Msg)` pairs
//! and delivered through the same loop, so the controller only ever sees one
//! message at a time.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{backend::Backend, Terminal};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::clipboard::Clipboard;
use crate::config::{ConfigStore, Settings};
use crate::controller::{Controller, CopyOrigin, Msg, Task, TaskError};
use crate::store::SecretStore;
use crate::ui;

/// Upper bound on one input poll so completions are never left waiting long.
pub const MAX_POLL: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn SecretStore>,
    pub clipboard: Arc<dyn Clipboard>,
    pub config: Arc<dyn ConfigStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Runtime {
    services: Services,
    sender: Sender<Msg>,
    inbox: Receiver<Msg>,
    timers: Vec<(Instant, Msg)>,
    /// Single worker for config saves, so snapshots reach disk in dispatch order.
    config_jobs: Option<Sender<Settings>>,
}

impl Runtime {
    pub fn new(services: Services) -> Self {
        let (sender, inbox) = mpsc::channel();
        let config_jobs = spawn_config_worker(services.clone(), sender.clone());
        Self {
            services,
            sender,
            inbox,
            timers: Vec::new(),
            config_jobs,
        }
    }

    /// Starts every task. Returns [`Flow::Quit`] once a quit was requested;
    /// tasks after it are dropped.
    pub fn dispatch(&mut self, tasks: Vec<Task>, now: Instant) -> Flow {
        for task in tasks {
            debug!(task = task.label(), "dispatch");
            match task {
                Task::Quit => return Flow::Quit,
                Task::Schedule { after, msg } => self.timers.push((now + after, msg)),
                Task::SaveConfig(settings) => self.save_config(settings),
                other => self.spawn(other),
            }
        }
        Flow::Continue
    }

    fn spawn(&self, task: Task) {
        let services = self.services.clone();
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name("task".into())
            .spawn(move || {
                if let Some(msg) = perform(task, &services) {
                    let _ = sender.send(msg);
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn task worker");
        }
    }

    fn save_config(&self, settings: Settings) {
        let Some(jobs) = &self.config_jobs else {
            self.spawn(Task::SaveConfig(settings));
            return;
        };
        if let Err(mpsc::SendError(settings)) = jobs.send(settings) {
            warn!("config worker gone, saving on a task thread");
            self.spawn(Task::SaveConfig(settings));
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|(at, _)| *at).min()
    }

    /// Removes and returns every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<Msg> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.timers).into_iter().partition(|(at, _)| *at <= now);
        self.timers = pending;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, msg)| msg).collect()
    }

    /// Receives one completion, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Msg> {
        self.inbox.recv_timeout(timeout).ok()
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        self.next_deadline()
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(MAX_POLL)
            .min(MAX_POLL)
    }

    fn deliver(&mut self, controller: &mut Controller, msg: Msg) -> Flow {
        let now = Instant::now();
        let tasks = controller.handle(msg, now);
        self.dispatch(tasks, now)
    }

    /// Main loop: draw, drain completions and due timers, then wait for input.
    /// Returns on quit; call [`Runtime::finish`] afterwards.
    pub fn run<B: Backend>(&mut self, controller: &mut Controller, terminal: &mut Terminal<B>) -> Result<()> {
        let area = terminal.size()?;
        let now = Instant::now();
        controller.handle(
            Msg::Resize {
                width: area.width,
                height: area.height,
            },
            now,
        );
        let start = controller.start();
        if self.dispatch(start, now) == Flow::Quit {
            return Ok(());
        }

        loop {
            terminal.draw(|f| ui::draw(f, controller, Instant::now()))?;

            let mut flow = Flow::Continue;
            while flow == Flow::Continue {
                match self.inbox.try_recv() {
                    Ok(msg) => flow = self.deliver(controller, msg),
                    Err(_) => break,
                }
            }
            for msg in self.take_due(Instant::now()) {
                if flow == Flow::Quit {
                    break;
                }
                flow = self.deliver(controller, msg);
            }
            if flow == Flow::Quit {
                break;
            }

            if event::poll(self.poll_timeout(Instant::now()))? {
                let msg = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Msg::Key(key),
                    Event::Mouse(_) => Msg::Mouse,
                    Event::Resize(width, height) => Msg::Resize { width, height },
                    _ => continue,
                };
                if self.deliver(controller, msg) == Flow::Quit {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Ends the session and performs an owed clipboard clear before exit.
    pub fn finish(&mut self, controller: &mut Controller) -> Result<()> {
        if controller.shutdown() {
            if let Err(err) = self.services.clipboard.clear() {
                warn!(error = %err, "clipboard clear on exit failed");
            }
        }
        Ok(())
    }
}

fn spawn_config_worker(services: Services, sender: Sender<Msg>) -> Option<Sender<Settings>> {
    let (jobs, queue) = mpsc::channel::<Settings>();
    let spawned = thread::Builder::new().name("config".into()).spawn(move || {
        for settings in queue {
            if let Some(msg) = perform(Task::SaveConfig(settings), &services) {
                let _ = sender.send(msg);
            }
        }
    });
    match spawned {
        Ok(_) => Some(jobs),
        Err(err) => {
            warn!(error = %err, "failed to spawn config worker");
            None
        }
    }
}

/// Runs one blocking task and builds its completion message.
pub fn perform(task: Task, services: &Services) -> Option<Msg> {
    let store = &services.store;
    let msg = match task {
        Task::Connect { project } => Msg::Connected {
            result: store.connect(&project).map_err(TaskError::from),
            project,
        },
        Task::LoadSecrets { project } => Msg::SecretsLoaded {
            result: store.list_secrets(&project).map_err(TaskError::from),
            project,
        },
        Task::LoadVersions { project, secret } => Msg::VersionsLoaded {
            result: store.list_versions(&project, &secret).map_err(TaskError::from),
            secret,
        },
        Task::AccessVersion {
            project,
            secret,
            version,
        } => Msg::ValueAccessed {
            result: store
                .access_version(&project, &secret, &version)
                .map_err(TaskError::from),
            secret,
            version,
        },
        Task::CopyVersion {
            project,
            secret,
            version,
        } => {
            let result = store
                .access_version(&project, &secret, &version)
                .map_err(TaskError::from)
                .and_then(|bytes| {
                    let text = Zeroizing::new(String::from_utf8_lossy(&bytes).into_owned());
                    write_clipboard(services, &text)
                });
            Msg::ClipboardCopied {
                origin: CopyOrigin::Secret {
                    name: secret,
                    version,
                },
                result,
            }
        }
        Task::WriteClipboard { text, origin } => Msg::ClipboardCopied {
            result: write_clipboard(services, &text),
            origin,
        },
        Task::ClearClipboard => Msg::ClipboardCleared {
            result: services
                .clipboard
                .clear()
                .map_err(|e| TaskError::Clipboard(e.to_string())),
        },
        Task::CreateSecret {
            project,
            name,
            value,
            location,
        } => {
            // An empty value creates the secret without a first version.
            let result = store
                .create_secret(&project, &name, location.as_deref())
                .and_then(|()| {
                    if value.is_empty() {
                        return Ok(());
                    }
                    store.add_version(&project, &name, &value).map(|_| ())
                })
                .map_err(TaskError::from);
            Msg::SecretCreated {
                project,
                name,
                result,
            }
        }
        Task::AddVersion {
            project,
            secret,
            value,
        } => Msg::VersionAdded {
            result: store.add_version(&project, &secret, &value).map_err(TaskError::from),
            project,
            secret,
        },
        Task::DeleteSecret { project, secret } => Msg::SecretDeleted {
            result: store.delete_secret(&project, &secret).map_err(TaskError::from),
            project,
            name: secret,
        },
        Task::SaveConfig(settings) => Msg::ConfigSaved {
            result: services
                .config
                .save(&settings)
                .map_err(|e| TaskError::Config(format!("{e:#}"))),
        },
        Task::Schedule { .. } | Task::Quit => return None,
    };
    Some(msg)
}

fn write_clipboard(services: &Services, text: &str) -> Result<(), TaskError> {
    services
        .clipboard
        .write(text)
        .map_err(|e| TaskError::Clipboard(e.to_string()))
}
