//! Recording mock collaborators for integration tests.
//!
//! Every mock shares one [`Journal`] so a test can script the outside world
//! (remote properties, sync results, console input, uptime) and assert on
//! the full call history afterwards.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use devcycle::actor::{Actor, Metadata, PropClass, PropDescriptor, PropKind, PropValue};
use devcycle::app::commands::{CmdExecStatus, Command};
use devcycle::app::ports::{
    Architecture, ClockSync, FileStore, HttpResponse, HttpVerb, Platform, PropSync, SleepClock,
    StorageError, SyncContext, SyncStatus, Transport, TransportError, WifiControl,
    WifiCredentials,
};
use devcycle::app::service::Orchestrator;
use devcycle::config::DeviceConfig;
use devcycle::error::PropError;
use devcycle::registry::{Mode, Registry};
use devcycle::timing::Frequency;

/// Day-aligned epoch instant the mock clock authority hands out.
pub const T0: i64 = 1_700_006_400;

pub const ACTORS_FILE: &str = "actors.json";

// ── Journal ───────────────────────────────────────────────────

pub struct Journal {
    pub calls: Vec<String>,
    pub files: HashMap<String, String>,
    pub pending: VecDeque<String>,
    pub uptime: u64,

    pub pull_status: SyncStatus,
    pub push_status: SyncStatus,
    pub log_status: SyncStatus,
    pub remote_props: Vec<(String, String, String)>,
    pub pushed_logs: Vec<String>,
    /// Names of the dirty actors at every push.
    pub dirty_at_push: Vec<Vec<String>>,

    pub clock_ok: bool,
    pub clock_time: i64,

    pub setup_mode: Mode,
    pub effects: Vec<String>,
    pub update_accepts: bool,
    pub updates: Vec<(String, String)>,

    pub wifi_ssids: Vec<String>,
    pub sleeps: Vec<u64>,
    pub deep_sleeps: Vec<u64>,
}

pub type Shared = Rc<RefCell<Journal>>;

#[allow(dead_code)]
impl Journal {
    pub fn shared() -> Shared {
        Rc::new(RefCell::new(Self {
            calls: Vec::new(),
            files: HashMap::new(),
            pending: VecDeque::new(),
            uptime: 0,
            pull_status: SyncStatus::Success,
            push_status: SyncStatus::Success,
            log_status: SyncStatus::Success,
            remote_props: Vec::new(),
            pushed_logs: Vec::new(),
            dirty_at_push: Vec::new(),
            clock_ok: true,
            clock_time: T0,
            setup_mode: Mode::Run,
            effects: Vec::new(),
            update_accepts: true,
            updates: Vec::new(),
            wifi_ssids: Vec::new(),
            sleeps: Vec::new(),
            deep_sleeps: Vec::new(),
        }))
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.iter().any(|c| c == name || c.starts_with(&format!("{name} ")))
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| *c == name).count()
    }

    pub fn remote(&mut self, actor: &str, prop: &str, value: &str) {
        self.remote_props
            .push((actor.to_owned(), prop.to_owned(), value.to_owned()));
    }
}

// ── Ports ─────────────────────────────────────────────────────

pub struct MockTransport(pub Shared);

impl Transport for MockTransport {
    fn http_method(
        &mut self,
        verb: HttpVerb,
        url: &str,
        _body: Option<&str>,
        _headers: &[(&str, &str)],
        _fingerprint: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        self.0.borrow_mut().calls.push(format!("http {verb} {url}"));
        Err(TransportError::Unreachable)
    }
}

pub struct MockFs(pub Shared);

impl FileStore for MockFs {
    fn read(&self, name: &str) -> Result<String, StorageError> {
        self.0
            .borrow()
            .files
            .get(name)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StorageError> {
        self.0
            .borrow_mut()
            .files
            .insert(name.to_owned(), content.to_owned());
        Ok(())
    }
}

pub struct MockWifi(pub Shared);

impl WifiControl for MockWifi {
    fn init_wifi(&mut self, credentials: &WifiCredentials<'_>) -> bool {
        self.0
            .borrow_mut()
            .wifi_ssids
            .push(credentials.ssid.to_owned());
        !credentials.ssid.is_empty()
    }

    fn stop_wifi(&mut self) {
        self.0.borrow_mut().calls.push("wifi_stop".into());
    }
}

/// Uptime only moves when a test sets it.
pub struct MockSleep(pub Shared);

impl SleepClock for MockSleep {
    fn uptime_secs(&self) -> u64 {
        self.0.borrow().uptime
    }

    fn sleep_interruptible(&mut self, _cycle_start: u64, secs: u64) -> bool {
        let mut j = self.0.borrow_mut();
        j.sleeps.push(secs);
        !j.pending.is_empty()
    }

    fn deep_sleep(&mut self, _cycle_start: u64, secs: u64) {
        self.0.borrow_mut().deep_sleeps.push(secs);
    }

    fn pending_command(&mut self) -> Option<String> {
        self.0.borrow_mut().pending.pop_front()
    }
}

pub struct MockPropSync(pub Shared);

impl MockPropSync {
    fn pull(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        let (status, remote) = {
            let mut j = self.0.borrow_mut();
            j.calls.push("pull".into());
            (j.pull_status, j.remote_props.clone())
        };
        if status != SyncStatus::Success {
            return status;
        }
        for (actor, prop, value) in remote {
            if ctx.registry.set_prop(&actor, &prop, &value).is_err() {
                return SyncStatus::InvalidResponse;
            }
            // Values from the authority are not local changes.
            if let Some(a) = ctx.registry.index_of(&actor).and_then(|i| ctx.registry.actor_mut(i)) {
                a.metadata_mut().clear_changed();
            }
        }
        SyncStatus::Success
    }

    fn push(&mut self, ctx: &mut SyncContext<'_>, freeze: bool) -> SyncStatus {
        let dirty: Vec<String> = (0..ctx.registry.len())
            .filter_map(|i| ctx.registry.actor(i))
            .filter(|a| a.metadata().is_dirty())
            .map(|a| a.name().to_owned())
            .collect();
        let status = {
            let mut j = self.0.borrow_mut();
            j.calls.push(if freeze { "push frozen".into() } else { "push".into() });
            j.dirty_at_push.push(dirty);
            j.push_status
        };
        if status == SyncStatus::Success {
            ctx.registry.clear_all_changed();
        }
        status
    }
}

impl PropSync for MockPropSync {
    fn fs_load_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        self.0.borrow_mut().calls.push("fs_load".into());
        match ctx.fs.read(ACTORS_FILE) {
            Ok(raw) => match ctx.registry.apply_props_json(&raw) {
                Ok(_) => SyncStatus::Success,
                Err(_) => SyncStatus::InvalidResponse,
            },
            Err(_) => SyncStatus::Skipped,
        }
    }

    fn fs_store_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        self.0.borrow_mut().calls.push("fs_store".into());
        let doc = ctx.registry.stored_props_json();
        match ctx.fs.write(ACTORS_FILE, &doc) {
            Ok(()) => SyncStatus::Success,
            Err(_) => SyncStatus::StorageFailure,
        }
    }

    fn set_login_pass(&mut self, user: &str, _pass: &str) {
        self.0.borrow_mut().calls.push(format!("prop_login {user}"));
    }

    fn pull_actors(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        self.pull(ctx)
    }

    fn pull_push_actors(&mut self, ctx: &mut SyncContext<'_>, freeze: bool) -> SyncStatus {
        let pulled = self.pull(ctx);
        if pulled != SyncStatus::Success {
            return pulled;
        }
        self.push(ctx, freeze)
    }

    fn push_actors(&mut self, ctx: &mut SyncContext<'_>, freeze: bool) -> SyncStatus {
        self.push(ctx, freeze)
    }

    fn push_description(&mut self, _ctx: &mut SyncContext<'_>, _description: &str) -> SyncStatus {
        self.0.borrow_mut().calls.push("push_description".into());
        SyncStatus::Success
    }

    fn push_log_messages(&mut self, _ctx: &mut SyncContext<'_>, text: &str) -> SyncStatus {
        let mut j = self.0.borrow_mut();
        j.calls.push("push_logs".into());
        j.pushed_logs.push(text.to_owned());
        j.log_status
    }
}

pub struct MockClockSync(pub Shared);

impl ClockSync for MockClockSync {
    fn set_login_pass(&mut self, user: &str, _pass: &str) {
        self.0.borrow_mut().calls.push(format!("clock_login {user}"));
    }

    fn sync_clock(&mut self, ctx: &mut SyncContext<'_>, _freeze: bool, _attempts: u8) -> bool {
        let (ok, time) = {
            let mut j = self.0.borrow_mut();
            j.calls.push("sync_clock".into());
            (j.clock_ok, j.clock_time)
        };
        if ok {
            ctx.registry.clock_mut().set_time(time);
        }
        ok
    }
}

/// Project layer understanding `mark <tag>` and `fail`.
pub struct MockArch(pub Shared);

impl Architecture for MockArch {
    fn setup(&mut self, _registry: &mut Registry) -> Mode {
        self.0.borrow().setup_mode
    }

    fn command(
        &mut self,
        cmd: &Command<'_>,
        _registry: &mut Registry,
        _out: &mut String,
    ) -> CmdExecStatus {
        match (cmd.verb(), cmd.arg(0)) {
            ("mark", Some(tag)) => {
                self.0.borrow_mut().effects.push(tag.to_owned());
                CmdExecStatus::Executed
            }
            ("fail", None) => CmdExecStatus::CmdFailed,
            _ => CmdExecStatus::NotFound,
        }
    }

    fn update(&mut self, target: &str, current: &str) -> bool {
        let mut j = self.0.borrow_mut();
        j.updates.push((target.to_owned(), current.to_owned()));
        j.update_accepts
    }
}

// ── Scripted actor ────────────────────────────────────────────

static SCRIPTED_PROPS: [PropDescriptor; 1] =
    [PropDescriptor::new("freq", PropKind::Schedule, PropClass::Advanced)];

/// Emits the same command lines on every boundary.
pub struct ScriptedActor {
    name: &'static str,
    script: Vec<String>,
    metadata: Metadata,
    journal: Shared,
}

#[allow(dead_code)]
impl ScriptedActor {
    pub fn boxed(journal: &Shared, name: &'static str, freq: &str, script: &[&str]) -> Box<dyn Actor> {
        let frequency: Frequency = freq.parse().unwrap();
        Box::new(Self {
            name,
            script: script.iter().map(|s| (*s).to_owned()).collect(),
            metadata: Metadata::new(frequency),
            journal: Rc::clone(journal),
        })
    }
}

impl Actor for ScriptedActor {
    fn name(&self) -> &str {
        self.name
    }

    fn props(&self) -> &'static [PropDescriptor] {
        &SCRIPTED_PROPS
    }

    fn get_prop(&self, index: usize) -> Option<PropValue> {
        (index == 0).then(|| PropValue::Schedule(self.metadata.timing().frequency()))
    }

    fn set_prop(&mut self, index: usize, value: PropValue) -> Result<(), PropError> {
        match index {
            0 => {
                let freq = value.into_schedule()?;
                self.metadata.timing_mut().set_frequency(freq);
                Ok(())
            }
            _ => Err(PropError::Unknown),
        }
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn act(&mut self, now: i64) -> Vec<String> {
        self.journal
            .borrow_mut()
            .calls
            .push(format!("act {} {}", self.name, now));
        self.script.clone()
    }
}

// ── Wiring ────────────────────────────────────────────────────

/// Defaults with the operator window disabled.
pub fn test_config() -> DeviceConfig {
    DeviceConfig {
        interactive_override_secs: 0,
        ..DeviceConfig::default()
    }
}

pub fn platform(journal: &Shared) -> Platform {
    Platform {
        transport: Box::new(MockTransport(Rc::clone(journal))),
        fs: Box::new(MockFs(Rc::clone(journal))),
        wifi: Box::new(MockWifi(Rc::clone(journal))),
        sleep: Box::new(MockSleep(Rc::clone(journal))),
        prop_sync: Box::new(MockPropSync(Rc::clone(journal))),
        clock_sync: Box::new(MockClockSync(Rc::clone(journal))),
        arch: Box::new(MockArch(Rc::clone(journal))),
    }
}

pub fn orchestrator(journal: &Shared, config: DeviceConfig) -> Orchestrator {
    Orchestrator::new(config, platform(journal))
}

/// Orchestrator after `setup` and a successful `startup` at [`T0`].
#[allow(dead_code)]
pub fn started(journal: &Shared, config: DeviceConfig, actors: Vec<Box<dyn Actor>>) -> Orchestrator {
    let mut orch = orchestrator(journal, config);
    for actor in actors {
        orch.add_actor(actor).unwrap();
    }
    orch.setup();
    let status = orch.startup();
    assert!(!status.code.is_failure(), "startup failed: {}", status.message);
    orch
}
