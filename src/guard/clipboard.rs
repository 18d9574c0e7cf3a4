use std::time::{Duration, Instant};

use crate::config::ClipboardSettings;

pub const CLIPBOARD_TICK: Duration = Duration::from_secs(1);

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Tick belongs to a superseded or disarmed timer; do not reschedule.
    Stale,
    Pending(Duration),
    /// Deadline reached: clear now and stop ticking.
    Expired,
}

/// Single-deadline clipboard auto-clear.
///
/// Every arm bumps a generation counter that travels with the tick message,
/// so ticks scheduled for an earlier copy die out on their own and exactly one
/// countdown is ever live.
#[derive(Debug, Default)]
pub struct ClipboardGuard {
    deadline: Option<Instant>,
    generation: u64,
}

impl ClipboardGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the countdown after a successful copy. Returns the
    /// generation the first tick must carry, or `None` when auto-clear is off.
    pub fn arm(&mut self, now: Instant, settings: &ClipboardSettings) -> Option<u64> {
        self.generation = self.generation.wrapping_add(1);
        if !settings.auto_clear || settings.timeout_seconds == 0 {
            self.deadline = None;
            return None;
        }
        self.deadline = Some(now + Duration::from_secs(u64::from(settings.timeout_seconds)));
        Some(self.generation)
    }

    pub fn tick(&mut self, generation: u64, now: Instant) -> Countdown {
        if generation != self.generation {
            return Countdown::Stale;
        }
        match self.deadline {
            None => Countdown::Stale,
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Countdown::Expired
            }
            Some(deadline) => Countdown::Pending(deadline - now),
        }
    }

    /// Cancels the countdown. Returns whether a clear was still owed.
    pub fn disarm(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

/// Whole seconds for countdown display, rounded up so "0s" is never shown
/// while a clear is still pending.
pub fn display_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 { secs + 1 } else { secs }
}
