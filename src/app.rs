use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rpassword::prompt_password;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::clipboard::SystemClipboard;
use crate::config::{ConfigStore, JsonConfigStore};
use crate::controller::Controller;
use crate::runtime::{Runtime, Services};
use crate::storage::{
    config_path, default_audit_path, default_base_dir, diagnostic_log_path, ensure_private_dir,
    projects_dir, restrict_file,
};
use crate::store::{validate_project, LocalStore};

/// Environment variable holding the diagnostic log filter.
pub const LOG_ENV: &str = "TSEC_LOG";

pub fn run() -> Result<()> {
    let bin_name = executable_name();
    let mut args = std::env::args().skip(1);
    let mut project: Option<String> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("{bin_name} v{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_usage(&bin_name);
                return Ok(());
            }
            "-p" | "--project" => match args.next() {
                Some(p) => project = Some(p),
                None => return Err(anyhow!("--project requires a value")),
            },
            other => {
                print_usage(&bin_name);
                return Err(anyhow!("unknown argument: {other}"));
            }
        }
    }

    let base = default_base_dir()?;
    ensure_private_dir(&base)?;
    init_logging(&base)?;
    info!(version = env!("CARGO_PKG_VERSION"), "tsec starting");

    let config = Arc::new(JsonConfigStore::new(config_path(&base)));
    let mut settings = config.load()?;
    if let Some(project) = project {
        validate_project(&project)?;
        settings.add_recent_project(&project);
        settings.project_id = project;
    }

    let projects = projects_dir(&base);
    let passphrase = prompt_store_passphrase(&projects)?;
    let services = Services {
        store: Arc::new(LocalStore::new(projects, passphrase)),
        clipboard: Arc::new(SystemClipboard::new()?),
        config,
    };

    let mut controller = Controller::new(settings, default_audit_path(&base), Instant::now());
    let mut runtime = Runtime::new(services);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    // Pointer events count as activity for the inactivity lock.
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        crossterm::cursor::Hide
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = runtime.run(&mut controller, &mut terminal);
    teardown_terminal(&mut terminal);
    runtime.finish(&mut controller)?;
    if let Err(err) = &result {
        warn!(error = %err, "event loop ended with an error");
    }
    info!("tsec exiting");
    result
}

/// Routes diagnostics to `<base>/logs/tsec.log`; the terminal belongs to the UI.
fn init_logging(base: &Path) -> Result<()> {
    let path = diagnostic_log_path(base);
    if let Some(dir) = path.parent() {
        ensure_private_dir(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening diagnostic log {}", path.display()))?;
    restrict_file(&path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("initialising logging: {e}"))
}

/// Asks for the store passphrase; a fresh store asks twice.
fn prompt_store_passphrase(projects: &Path) -> Result<Zeroizing<String>> {
    let fresh = !has_project_files(projects);
    if fresh {
        println!("No encrypted projects yet. Choose a passphrase for the local store.");
    }
    let first = Zeroizing::new(prompt_password("Store passphrase: ")?);
    if first.is_empty() {
        return Err(anyhow!("Passphrase must not be empty"));
    }
    if fresh {
        let second = Zeroizing::new(prompt_password("Confirm passphrase: ")?);
        if *first != *second {
            return Err(anyhow!("Passphrases did not match"));
        }
    }
    Ok(first)
}

fn has_project_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().extension().is_some_and(|ext| ext == "vault"))
        })
        .unwrap_or(false)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) {
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        crossterm::cursor::Show
    )
    .ok();
    terminal.show_cursor().ok();
}

fn print_usage(bin_name: &str) {
    eprintln!("Usage: {bin_name} [OPTIONS]");
    eprintln!("  -p, --project <ID>      Open this project instead of the configured one");
    eprintln!("  -h, --help              Show this help");
    eprintln!("  -V, --version           Show version and exit");
    eprintln!();
    eprintln!("Diagnostics go to ~/.terminal-secrets/logs/tsec.log ({LOG_ENV} sets the filter).");
}

fn executable_name() -> String {
    let fallback = "tsec".to_string();
    let arg0 = match std::env::args().next() {
        Some(v) => v,
        None => return fallback,
    };
    let path = Path::new(&arg0);
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback,
    }
}
