use std::time::{Duration, Instant};

use tracing::info;

use crate::config::SessionSettings;
use crate::controller::View;
use crate::guard::ClipboardGuard;
use crate::secret::SecretVault;

pub const SESSION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// What the controller must do after an inactivity lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locked {
    /// A clipboard clear was still owed and must be issued now.
    pub clear_clipboard: bool,
}

#[derive(Debug)]
pub struct SessionGuard {
    last_activity: Instant,
    locked: bool,
    resume: View,
}

impl SessionGuard {
    pub fn new(now: Instant) -> Self {
        Self {
            last_activity: now,
            locked: false,
            resume: View::List,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// View restored by the next unlock.
    pub fn resume_view(&self) -> View {
        self.resume
    }

    /// Sets the view the next unlock restores. Reveal resumes as Detail
    /// because the revealed bytes are wiped on lock.
    pub fn resume_on(&mut self, view: View) {
        self.resume = match view {
            View::Reveal => View::Detail,
            other => other,
        };
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Periodic inactivity check. Locks at most once: while locked it is a no-op.
    ///
    /// On lock the vault is wiped and any pending clipboard countdown is
    /// cancelled; the caller issues the clear itself when told to.
    pub fn check(
        &mut self,
        now: Instant,
        settings: &SessionSettings,
        current: View,
        vault: &mut SecretVault,
        clipboard: &mut ClipboardGuard,
    ) -> Option<Locked> {
        if self.locked || !settings.lock_on_timeout || settings.inactivity_timeout_minutes == 0 {
            return None;
        }
        let threshold = Duration::from_secs(u64::from(settings.inactivity_timeout_minutes) * 60);
        if self.idle_for(now) < threshold {
            return None;
        }

        self.locked = true;
        self.resume_on(current);
        vault.clear();
        let clear_clipboard = clipboard.disarm();
        info!(idle_secs = self.idle_for(now).as_secs(), "session locked after inactivity");
        Some(Locked { clear_clipboard })
    }

    /// Ends the lock and returns the view to restore.
    pub fn unlock(&mut self, now: Instant) -> Option<View> {
        if !self.locked {
            return None;
        }
        self.locked = false;
        self.last_activity = now;
        Some(self.resume)
    }
}
