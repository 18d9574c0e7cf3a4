use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{anyhow, Context, Result};
use tracing::warn;
use zeroize::Zeroizing;

pub trait Clipboard: Send + Sync {
    fn write(&self, text: &str) -> Result<()>;

    fn clear(&self) -> Result<()> {
        self.write("")
    }
}

struct Request {
    text: Zeroizing<String>,
    reply: Sender<Result<(), String>>,
}

/// System clipboard served from one long-lived thread.
///
/// The underlying handle stays alive for the whole process so platforms where
/// the owning process serves the selection keep the copied text available.
pub struct SystemClipboard {
    requests: Sender<Request>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let (requests, inbox) = mpsc::channel();
        thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || serve(inbox))
            .context("spawning clipboard thread")?;
        Ok(Self { requests })
    }
}

fn serve(inbox: Receiver<Request>) {
    let mut handle: Option<arboard::Clipboard> = None;
    for Request { text, reply } in inbox {
        let outcome = set_text(&mut handle, &text);
        if let Err(err) = &outcome {
            warn!(error = %err, "clipboard write failed");
            // Retry with a fresh handle next time.
            handle = None;
        }
        let _ = reply.send(outcome);
    }
}

fn set_text(handle: &mut Option<arboard::Clipboard>, text: &str) -> Result<(), String> {
    if handle.is_none() {
        *handle = Some(arboard::Clipboard::new().map_err(|e| format!("Clipboard unavailable: {e}"))?);
    }
    let clipboard = handle.as_mut().ok_or_else(|| "Clipboard unavailable".to_string())?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| format!("Failed to set clipboard: {e}"))
}

impl Clipboard for SystemClipboard {
    fn write(&self, text: &str) -> Result<()> {
        let (reply, outcome) = mpsc::channel();
        self.requests
            .send(Request {
                text: Zeroizing::new(text.to_string()),
                reply,
            })
            .map_err(|_| anyhow!("Clipboard thread stopped"))?;
        outcome
            .recv()
            .map_err(|_| anyhow!("Clipboard thread stopped"))?
            .map_err(|e| anyhow!(e))
    }
}
