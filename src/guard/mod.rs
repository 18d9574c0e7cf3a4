//! Time-based security policies driven by tick messages.

pub mod clipboard;
pub mod session;

pub use clipboard::{ClipboardGuard, Countdown, CLIPBOARD_TICK};
pub use session::{SessionGuard, SESSION_CHECK_INTERVAL};
