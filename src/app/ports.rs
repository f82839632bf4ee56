//! Port traits: the boundary between the orchestrator and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Orchestrator (domain)
//! ```
//!
//! Every collaborator is injected once, at construction, through a
//! [`Platform`] bundle.  The orchestrator checks nothing about them beyond
//! these contracts, so each one can be replaced by a recording mock.
//!
//! ## Contracts
//!
//! - **PropSync** owns the wire format and the persisted property layout.
//!   It clears actors' dirty flags after a successful push.
//! - **ClockSync** writes the synchronised time into the clock actor.
//! - **SleepClock::deep_sleep** does not return on hardware; the host
//!   implementation returns and the caller is expected to exit.
//! - Retries and timeouts of in-flight network calls belong to adapters.

use core::fmt;

use crate::app::commands::{CmdExecStatus, Command};
use crate::registry::{Mode, Registry};

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → HTTP)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Network down or host unreachable.
    Unreachable,
    Timeout,
    /// TLS fingerprint did not match.
    Untrusted,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable"),
            Self::Timeout => write!(f, "timeout"),
            Self::Untrusted => write!(f, "untrusted peer"),
        }
    }
}

/// One blocking request per call; no pooling.
pub trait Transport {
    fn http_method(
        &mut self,
        verb: HttpVerb,
        url: &str,
        body: Option<&str>,
        headers: &[(&str, &str)],
        fingerprint: Option<&str>,
    ) -> Result<HttpResponse, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// File store port (driven adapter: domain ↔ flash file system)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    IoError,
    /// File name contains path separators or is empty.
    InvalidName,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::IoError => write!(f, "I/O error"),
            Self::InvalidName => write!(f, "invalid file name"),
        }
    }
}

/// Whole-file text storage.
pub trait FileStore {
    fn read(&self, name: &str) -> Result<String, StorageError>;

    /// Replace the file's content atomically where the medium allows it.
    fn write(&mut self, name: &str, content: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi port
// ───────────────────────────────────────────────────────────────

/// Primary and backup networks, tried in that order.
#[derive(Debug, Clone, Copy)]
pub struct WifiCredentials<'a> {
    pub ssid: &'a str,
    pub pass: &'a str,
    pub ssid_backup: &'a str,
    pub pass_backup: &'a str,
}

pub trait WifiControl {
    /// Bring the station up; `true` once connected.
    fn init_wifi(&mut self, credentials: &WifiCredentials<'_>) -> bool;

    fn stop_wifi(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sleep / uptime port
// ───────────────────────────────────────────────────────────────

pub trait SleepClock {
    /// Monotonic seconds since boot.
    fn uptime_secs(&self) -> u64;

    /// Sleep until `cycle_start + secs` (uptime).  Returns `true` if a
    /// console command arrived first.
    fn sleep_interruptible(&mut self, cycle_start: u64, secs: u64) -> bool;

    /// Power down until `cycle_start + secs`.  Does not return on hardware.
    fn deep_sleep(&mut self, cycle_start: u64, secs: u64);

    /// Next queued console line, if any.
    fn pending_command(&mut self) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// Sync collaborators
// ───────────────────────────────────────────────────────────────

/// Outcome of a property sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Success,
    /// Nothing to do (no remote configured, nothing stored, ...).
    Skipped,
    ConnectionFailure,
    AuthFailure,
    /// The peer answered with something unusable.
    InvalidResponse,
    StorageFailure,
}

impl SyncStatus {
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Success | Self::Skipped)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::ConnectionFailure => "connection failure",
            Self::AuthFailure => "authentication failure",
            Self::InvalidResponse => "invalid response",
            Self::StorageFailure => "storage failure",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Borrowed device state handed to a sync collaborator for one call.
pub struct SyncContext<'a> {
    pub registry: &'a mut Registry,
    pub transport: &'a mut dyn Transport,
    pub fs: &'a mut dyn FileStore,
    pub wifi: &'a mut dyn WifiControl,
}

/// Property reconciliation with local storage and the remote authority.
pub trait PropSync {
    fn fs_load_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus;

    fn fs_store_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus;

    fn set_login_pass(&mut self, user: &str, pass: &str);

    /// Remote → device only.
    fn pull_actors(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus;

    /// Pull, then push what changed.  `freeze` pushes the clock as-is.
    fn pull_push_actors(&mut self, ctx: &mut SyncContext<'_>, freeze: bool) -> SyncStatus;

    /// Device → remote.  Clears dirty flags on success.
    fn push_actors(&mut self, ctx: &mut SyncContext<'_>, freeze: bool) -> SyncStatus;

    fn push_description(&mut self, ctx: &mut SyncContext<'_>, description: &str) -> SyncStatus;

    fn push_log_messages(&mut self, ctx: &mut SyncContext<'_>, text: &str) -> SyncStatus;
}

/// Clock synchronisation against the remote time authority.
pub trait ClockSync {
    fn set_login_pass(&mut self, user: &str, pass: &str);

    /// Set the clock actor's time.  `freeze` asks for a blocking,
    /// authoritative sync; up to `attempts` tries are made.
    fn sync_clock(&mut self, ctx: &mut SyncContext<'_>, freeze: bool, attempts: u8) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Architecture port (project layer hooks)
// ───────────────────────────────────────────────────────────────

/// Hooks into the surrounding project; every method has a no-op default.
pub trait Architecture {
    /// Called once by `setup`; the returned mode seeds the registry.
    fn setup(&mut self, _registry: &mut Registry) -> Mode {
        Mode::Run
    }

    /// Start of every Run cycle.
    fn run_mode(&mut self, _registry: &mut Registry) {}

    /// Start of every Configure cycle.
    fn configure_mode(&mut self, _registry: &mut Registry) {}

    /// Fallback for verbs the core does not know.
    fn command(
        &mut self,
        _cmd: &Command<'_>,
        _registry: &mut Registry,
        _out: &mut String,
    ) -> CmdExecStatus {
        CmdExecStatus::NotFound
    }

    fn help(&self, _out: &mut String) {}

    fn info(&self, _registry: &Registry, _out: &mut String) {}

    fn test(&mut self, _registry: &mut Registry, _out: &mut String) -> CmdExecStatus {
        CmdExecStatus::Executed
    }

    fn clear_device(&mut self) {}

    /// Hand off a firmware update.  `true` when the trigger accepted it.
    fn update(&mut self, _target: &str, _current: &str) -> bool {
        false
    }
}

/// Project layer with every hook left at its default.
pub struct NoArchitecture;

impl Architecture for NoArchitecture {}

// ───────────────────────────────────────────────────────────────
// Collaborator bundle
// ───────────────────────────────────────────────────────────────

/// Everything the orchestrator talks to.
pub struct Platform {
    pub transport: Box<dyn Transport>,
    pub fs: Box<dyn FileStore>,
    pub wifi: Box<dyn WifiControl>,
    pub sleep: Box<dyn SleepClock>,
    pub prop_sync: Box<dyn PropSync>,
    pub clock_sync: Box<dyn ClockSync>,
    pub arch: Box<dyn Architecture>,
}
