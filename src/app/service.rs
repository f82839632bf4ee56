//! Orchestrator: the lifecycle core.
//!
//! [`Orchestrator`] owns the actor registry, the diagnostics buffer and the
//! injected collaborators.  It exposes the device lifecycle:
//!
//! ```text
//!   setup() ──▶ startup() ──▶ run_loop() ──▶ run_loop() ──▶ ...
//!                              │
//!                 Run:  console → catch-up → store → update → push logs → sleep
//!                 Conf: console → project hook → (push logs) → short sleep
//! ```
//!
//! Everything is single-threaded: one actor's catch-up iterations and
//! commands finish before the next actor is looked at.

use log::{Level, debug, info};

use crate::actor::Actor;
use crate::actor::settings::SKIP_UPDATE_TARGET;
use crate::config::DeviceConfig;
use crate::diagnostics::{Diagnostics, level_from_index};
use crate::error::Result;
use crate::power::{bounded_sleep_secs, deep_sleep_secs};
use crate::registry::{Mode, Registry};
use crate::timing::humanize;

use super::commands::{self, CmdExecStatus, Command};
use super::handlers::COMMANDS;
use super::ports::{ClockSync, Platform, PropSync, SyncContext, SyncStatus};
use super::startup::StartupPhase;

/// Nesting limit for commands emitted while running other commands.
pub const MAX_DISPATCH_DEPTH: u8 = 4;

/// Result of one [`Orchestrator::run_loop`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Cycle completed, followed by an interruptible sleep.
    Slept { secs: u64, interrupted: bool },
    /// A command returned `ExecutedInterrupt`; the cycle was abandoned.
    Interrupted,
    /// Deep sleep was requested.  On hardware the device restarts instead.
    DeepSleep { secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Interrupted,
}

/// Outcome of acting once and running the emitted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ActOutcome {
    Done,
    /// A command failed; the actor's remaining work was skipped.
    Failed,
    Interrupted,
}

/// Status and printable output of a console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub status: CmdExecStatus,
    pub output: String,
}

// ───────────────────────────────────────────────────────────────
// Orchestrator
// ───────────────────────────────────────────────────────────────

pub struct Orchestrator {
    pub(super) config: DeviceConfig,
    pub(super) registry: Registry,
    pub(super) platform: Platform,
    pub(super) diag: Diagnostics,
    pub(super) phase: StartupPhase,
    configure_cycles: u32,
    dispatch_depth: u8,
}

impl Orchestrator {
    /// Wire the collaborators.  Nothing runs until [`setup`](Self::setup).
    pub fn new(config: DeviceConfig, platform: Platform) -> Self {
        let settings = crate::actor::Settings::new(&config.project_version);
        let level = level_from_index(config.log_level).unwrap_or(Level::Info);
        Self {
            registry: Registry::new(settings),
            diag: Diagnostics::new(level),
            config,
            platform,
            phase: StartupPhase::NotStarted,
            configure_cycles: 0,
            dispatch_depth: 0,
        }
    }

    pub fn add_actor(&mut self, actor: Box<dyn Actor>) -> Result<()> {
        self.registry.add_actor(actor)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.registry.mode()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Let the project layer pick the initial mode.
    pub fn setup(&mut self) -> Mode {
        let mode = self.platform.arch.setup(&mut self.registry);
        self.registry.set_mode(mode);
        info!(
            "Orchestrator: setup done, {} actors, mode {}",
            self.registry.len(),
            mode
        );
        mode
    }

    /// One iteration of the main loop in the current mode.
    pub fn run_loop(&mut self) -> LoopOutcome {
        match self.registry.mode() {
            Mode::Run => self.run_cycle(),
            Mode::Configure => self.configure_cycle(),
        }
    }

    fn run_cycle(&mut self) -> LoopOutcome {
        self.tick_clock();
        report!(
            self,
            Level::Info,
            "cycle",
            "BEGIN LOOP (ver: {}) at {}",
            self.config.project_version,
            humanize(self.registry.now())
        );

        if self.drain_console() == CycleOutcome::Interrupted {
            return LoopOutcome::Interrupted;
        }

        self.platform.arch.run_mode(&mut self.registry);
        if self.catch_up_cycle() == CycleOutcome::Interrupted {
            report!(self, Level::Info, "cycle", "cycle interrupted");
            return LoopOutcome::Interrupted;
        }

        let stored = self.with_prop_sync(|ps, ctx| ps.fs_store_actors_props(ctx));
        if stored.is_failure() {
            report!(self, Level::Warn, "cycle", "storing properties failed: {}", stored);
        }

        self.update_if_must();

        let one_run = self.registry.settings().one_run();
        if one_run {
            // The clock has advanced this run; hand the final state over
            // before the device powers down.
            let pushed = self.with_prop_sync(|ps, ctx| ps.push_actors(ctx, true));
            if pushed.is_failure() {
                report!(self, Level::Warn, "cycle", "final push failed: {}", pushed);
            }
        }

        let _ = self.flush_logs();

        let sleep_from = self.tick_clock();
        let now = self.registry.now();
        self.registry
            .settings_mut()
            .batch_timing_mut()
            .set_current_time(now);
        let batch = *self.registry.settings().batch_timing();
        let cap = self.config.sleep_horizon_secs;

        if one_run {
            let secs = deep_sleep_secs(&batch, cap).max(0) as u64;
            info!("END LOOP: deep sleep for {}s", secs);
            self.platform.sleep.deep_sleep(sleep_from, secs);
            LoopOutcome::DeepSleep { secs }
        } else {
            let secs = bounded_sleep_secs(&batch, cap).max(0) as u64;
            info!("END LOOP: sleeping up to {}s", secs);
            let interrupted = self.platform.sleep.sleep_interruptible(sleep_from, secs);
            LoopOutcome::Slept { secs, interrupted }
        }
    }

    fn configure_cycle(&mut self) -> LoopOutcome {
        let cycle_start = self.tick_clock();

        if self.drain_console() == CycleOutcome::Interrupted {
            return LoopOutcome::Interrupted;
        }

        self.platform.arch.configure_mode(&mut self.registry);

        self.configure_cycles = self.configure_cycles.wrapping_add(1);
        let every = self.config.log_push_every;
        if every > 0 && self.configure_cycles % every == 0 {
            let _ = self.flush_logs();
        }

        let secs = u64::from(self.config.configure_period_secs);
        let interrupted = self.platform.sleep.sleep_interruptible(cycle_start, secs);
        LoopOutcome::Slept { secs, interrupted }
    }

    /// Advance the clock actor from uptime; returns the uptime used.
    fn tick_clock(&mut self) -> u64 {
        let uptime = self.platform.sleep.uptime_secs();
        self.registry.clock_mut().tick(uptime);
        uptime
    }

    /// Run every queued console line.
    fn drain_console(&mut self) -> CycleOutcome {
        while let Some(line) = self.platform.sleep.pending_command() {
            if line.trim().is_empty() {
                continue;
            }
            let reply = self.command(&line);
            for text in reply.output.lines() {
                info!("{}", text);
            }
            report!(self, Level::Info, "cmd", "'{}': {}", line.trim(), reply.status);
            if reply.status == CmdExecStatus::ExecutedInterrupt {
                return CycleOutcome::Interrupted;
            }
        }
        CycleOutcome::Completed
    }

    // ── Catch-up ──────────────────────────────────────────────

    /// Replay every owed schedule boundary, actor by actor.
    ///
    /// A command that does not return `Executed` ends that actor's work for
    /// this cycle; later actors still run.  `ExecutedInterrupt` abandons
    /// the whole cycle.
    pub fn catch_up_cycle(&mut self) -> CycleOutcome {
        let max = self.config.max_catch_up_per_cycle;
        for index in 0..self.registry.len() {
            let now = self.registry.now();
            let mut ticks = 0u32;
            loop {
                let Some(actor) = self.registry.actor_mut(index) else {
                    break;
                };
                if ticks >= max {
                    report!(
                        self,
                        Level::Warn,
                        "cycle",
                        "{}: {} ticks replayed, rest deferred",
                        actor.name(),
                        ticks
                    );
                    break;
                }
                if !actor.metadata_mut().timing_mut().catches_up(now) {
                    break;
                }
                ticks += 1;

                let mut out = String::new();
                match self.act_and_run(index, now, &mut out) {
                    ActOutcome::Done => {}
                    ActOutcome::Failed => break,
                    ActOutcome::Interrupted => return CycleOutcome::Interrupted,
                }
            }
        }
        CycleOutcome::Completed
    }

    /// Let actor `index` act once and run its commands in order.
    pub(super) fn act_and_run(&mut self, index: usize, now: i64, out: &mut String) -> ActOutcome {
        let Some(actor) = self.registry.actor_mut(index) else {
            return ActOutcome::Done;
        };
        let name = actor.name().to_owned();
        let lines = actor.act(now);

        for line in &lines {
            let status = self.dispatch_line(line, self.dispatch_depth + 1, out);
            match status {
                CmdExecStatus::Executed => {}
                CmdExecStatus::ExecutedInterrupt => return ActOutcome::Interrupted,
                failed => {
                    report!(
                        self,
                        Level::Warn,
                        "cycle",
                        "{}: '{}' {}, skipping the rest",
                        name,
                        line,
                        failed
                    );
                    return ActOutcome::Failed;
                }
            }
        }
        if !lines.is_empty() {
            debug!("{}: {} command(s) executed", name, lines.len());
        }
        ActOutcome::Done
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Execute one console line.
    pub fn command(&mut self, line: &str) -> CommandReply {
        let mut output = String::new();
        let status = self.dispatch_line(line, 0, &mut output);
        CommandReply { status, output }
    }

    pub(super) fn dispatch_line(&mut self, line: &str, depth: u8, out: &mut String) -> CmdExecStatus {
        let Some(cmd) = Command::parse(line) else {
            return CmdExecStatus::NotFound;
        };
        if depth > MAX_DISPATCH_DEPTH {
            report!(self, Level::Warn, "cmd", "'{}' nested too deeply, refused", line);
            return CmdExecStatus::CmdFailed;
        }

        let outer = core::mem::replace(&mut self.dispatch_depth, depth);
        let status = match commands::dispatch(COMMANDS, self, &cmd, out) {
            Some(status) => status,
            None => self.platform.arch.command(&cmd, &mut self.registry, out),
        };
        self.dispatch_depth = outer;
        status
    }

    pub(super) fn help(&self, out: &mut String) {
        commands::write_help(COMMANDS, out);
        self.platform.arch.help(out);
    }

    // ── Firmware update ───────────────────────────────────────

    /// Hand off a due update unless the target is `skip`.
    ///
    /// Returns `true` when the trigger accepted the handoff.
    pub fn update_if_must(&mut self) -> bool {
        if !self.registry.settings().update_due() {
            return false;
        }
        let target = self.registry.settings().target().to_owned();
        if target == SKIP_UPDATE_TARGET {
            debug!("Update due, target is '{}': nothing to do", SKIP_UPDATE_TARGET);
            self.registry.settings_mut().clear_update_due();
            return false;
        }
        self.trigger_update(&target)
    }

    /// Push pending state, then hand `target` to the update trigger.
    ///
    /// The due flag is cleared only when both steps succeed.
    pub(super) fn trigger_update(&mut self, target: &str) -> bool {
        let pushed = self.with_prop_sync(|ps, ctx| ps.push_actors(ctx, false));
        if pushed.is_failure() {
            report!(
                self,
                Level::Warn,
                "update",
                "push before update to '{}' failed ({}), retrying next time",
                target,
                pushed
            );
            return false;
        }

        let current = self.config.project_version.clone();
        report!(self, Level::Info, "update", "updating {} -> {}", current, target);
        if self.platform.arch.update(target, &current) {
            self.registry.settings_mut().clear_update_due();
            true
        } else {
            report!(self, Level::Warn, "update", "update to '{}' not accepted", target);
            false
        }
    }

    // ── Diagnostics ───────────────────────────────────────────

    /// Push buffered logs; the buffer is cleared only on success.
    pub fn flush_logs(&mut self) -> SyncStatus {
        let Some(text) = self.diag.prepare_push().map(str::to_owned) else {
            return SyncStatus::Skipped;
        };
        let status = self.with_prop_sync(|ps, ctx| ps.push_log_messages(ctx, &text));
        if status == SyncStatus::Success {
            self.diag.clear();
        } else {
            debug!("Log push not completed: {}", status);
        }
        status
    }

    // ── Collaborator access ───────────────────────────────────

    pub(super) fn with_prop_sync<R>(
        &mut self,
        f: impl FnOnce(&mut dyn PropSync, &mut SyncContext<'_>) -> R,
    ) -> R {
        let Platform {
            transport,
            fs,
            wifi,
            prop_sync,
            ..
        } = &mut self.platform;
        let mut ctx = SyncContext {
            registry: &mut self.registry,
            transport: &mut **transport,
            fs: &mut **fs,
            wifi: &mut **wifi,
        };
        f(&mut **prop_sync, &mut ctx)
    }

    pub(super) fn with_clock_sync<R>(
        &mut self,
        f: impl FnOnce(&mut dyn ClockSync, &mut SyncContext<'_>) -> R,
    ) -> R {
        let Platform {
            transport,
            fs,
            wifi,
            clock_sync,
            ..
        } = &mut self.platform;
        let mut ctx = SyncContext {
            registry: &mut self.registry,
            transport: &mut **transport,
            fs: &mut **fs,
            wifi: &mut **wifi,
        };
        f(&mut **clock_sync, &mut ctx)
    }
}
