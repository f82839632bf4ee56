//! Startup reconciliation.
//!
//! ```text
//!   NotStarted ─▶ LoadingLocal ─▶ SyncingProperties ─▶ SyncingClock ─▶ Ready(mode)
//!                      │                 │                    │
//!                      │ setup chose     │ pull failed        │ clock failed
//!                      ▼ Configure       ▼                    ▼
//!                 Ready(Configure)   Failed(PropertySync)  Failed(ClockSync)
//! ```
//!
//! Both failure exits force Configure mode: a device that could not
//! reconcile its state must not act on stale configuration.

use core::fmt;

use log::Level;

use crate::registry::Mode;

use super::service::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupCode {
    Success,
    /// Setup asked for Configure mode; remote reconciliation was not run.
    Skipped,
    PropertySyncFailure,
    ClockSyncFailure,
}

impl StartupCode {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::PropertySyncFailure | Self::ClockSyncFailure)
    }
}

impl fmt::Display for StartupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Skipped => write!(f, "skipped"),
            Self::PropertySyncFailure => write!(f, "property sync failure"),
            Self::ClockSyncFailure => write!(f, "clock sync failure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    NotStarted,
    LoadingLocal,
    SyncingProperties,
    SyncingClock,
    Ready(Mode),
    Failed(StartupCode),
}

/// Produced once per boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupStatus {
    pub code: StartupCode,
    pub next_mode: Mode,
    pub message: String,
}

impl Orchestrator {
    /// Reconcile local and remote state and decide the initial mode.
    pub fn startup(&mut self) -> StartupStatus {
        // 1. Local properties.  Defaults stand if nothing is stored.
        self.phase = StartupPhase::LoadingLocal;
        let loaded = self.with_prop_sync(|ps, ctx| ps.fs_load_actors_props(ctx));
        if loaded.is_failure() {
            report!(
                self,
                Level::Warn,
                "startup",
                "local properties unavailable ({}), keeping defaults",
                loaded
            );
        }

        if self.registry.mode() == Mode::Configure {
            return self.finish(
                StartupCode::Skipped,
                Mode::Configure,
                "configure mode requested at setup".to_owned(),
            );
        }

        // 2. Credentials from configuration win over stored ones.
        let user = self.config.device_login.clone();
        let pass = self.config.device_pass.clone();
        self.platform.prop_sync.set_login_pass(&user, &pass);
        self.platform.clock_sync.set_login_pass(&user, &pass);

        // 3. Properties.  One-run devices defer their push to the end of the run.
        self.phase = StartupPhase::SyncingProperties;
        let one_run = self.registry.settings().one_run();
        let synced = if one_run {
            self.with_prop_sync(|ps, ctx| ps.pull_actors(ctx))
        } else {
            self.with_prop_sync(|ps, ctx| ps.pull_push_actors(ctx, false))
        };
        if synced.is_failure() {
            return self.finish(
                StartupCode::PropertySyncFailure,
                Mode::Configure,
                format!("property sync failed: {synced}"),
            );
        }

        // 4. Keep the merged state for offline boots.
        let stored = self.with_prop_sync(|ps, ctx| ps.fs_store_actors_props(ctx));
        if stored.is_failure() {
            report!(self, Level::Warn, "startup", "storing properties failed: {}", stored);
        }

        // 5. Capability document.
        if let Some(description) = self.config.description.clone() {
            let pushed = self.with_prop_sync(|ps, ctx| ps.push_description(ctx, &description));
            if pushed.is_failure() {
                report!(self, Level::Warn, "startup", "description push failed: {}", pushed);
            }
        }

        // 6. Catch-up accounting starts from the last known time.
        let uptime = self.platform.sleep.uptime_secs();
        self.registry.clock_mut().tick(uptime);
        let last_known = self.registry.now();
        self.registry.set_actors_time(last_known);

        // 7. Clock.
        self.phase = StartupPhase::SyncingClock;
        let attempts = self.config.clock_sync_attempts;
        let clock_ok = self.with_clock_sync(|cs, ctx| cs.sync_clock(ctx, one_run, attempts));
        if !clock_ok {
            return self.finish(
                StartupCode::ClockSyncFailure,
                Mode::Configure,
                format!("clock sync failed after {attempts} attempt(s)"),
            );
        }
        if last_known <= 0 {
            // No history to replay: start every schedule from now.
            let now = self.registry.now();
            self.registry.set_actors_time(now);
            report!(
                self,
                Level::Info,
                "startup",
                "no previous time, schedules anchored at {}",
                crate::timing::humanize(now)
            );
        }

        // 8. Best effort.
        let _ = self.flush_logs();

        // 9. Operator window.
        let secs = self.config.interactive_override_secs;
        let mode = if secs > 0 {
            log::info!("Send any command within {}s to stay in configure mode", secs);
            let start = self.platform.sleep.uptime_secs();
            if self.platform.sleep.sleep_interruptible(start, u64::from(secs)) {
                Mode::Configure
            } else {
                Mode::Run
            }
        } else {
            Mode::Run
        };

        let message = match mode {
            Mode::Run => "ready".to_owned(),
            Mode::Configure => "operator interrupted startup".to_owned(),
        };
        self.finish(StartupCode::Success, mode, message)
    }

    fn finish(&mut self, code: StartupCode, mode: Mode, message: String) -> StartupStatus {
        self.registry.set_mode(mode);
        self.phase = if code.is_failure() {
            StartupPhase::Failed(code)
        } else {
            StartupPhase::Ready(mode)
        };
        let level = if code.is_failure() {
            Level::Error
        } else {
            Level::Info
        };
        report!(self, level, "startup", "{} ({}), entering {} mode", code, message, mode);
        StartupStatus {
            code,
            next_mode: mode,
            message,
        }
    }
}
