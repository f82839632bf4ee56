//! devcycle: device entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DirStore/NvsStore  LocalPropSync   SystemClockSync            │
//! │  (FileStore)        (PropSync)      (ClockSync)                │
//! │  ConsoleSleep       WifiAdapter     NullTransport              │
//! │  (SleepClock)       (WifiControl)   (Transport)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            Orchestrator (pure logic)                   │    │
//! │  │  startup · catch-up · commands · update · sleep        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::{LevelFilter, info, warn};

use devcycle::adapters::clock::SystemClockSync;
use devcycle::adapters::local_sync::LocalPropSync;
use devcycle::adapters::sleep::{ConsoleSleep, spawn_stdin_reader};
use devcycle::adapters::wifi::WifiAdapter;
use devcycle::adapters::NullTransport;
use devcycle::app::ports::{FileStore, NoArchitecture, Platform};
use devcycle::app::service::{LoopOutcome, Orchestrator};
use devcycle::config::{ConfigError, DeviceConfig};
use devcycle::diagnostics::level_from_index;

#[cfg(not(target_os = "espidf"))]
fn open_store() -> Result<Box<dyn FileStore>> {
    let root = std::env::var("DEVCYCLE_DIR").unwrap_or_else(|_| String::from("devcycle-data"));
    let store = devcycle::adapters::fs::DirStore::new(root)
        .map_err(|e| anyhow::anyhow!("file store: {e}"))?;
    Ok(Box::new(store))
}

#[cfg(target_os = "espidf")]
fn open_store() -> Result<Box<dyn FileStore>> {
    let store = devcycle::adapters::fs::NvsStore::new()
        .map_err(|e| anyhow::anyhow!("file store: {e}"))?;
    Ok(Box::new(store))
}

fn main() -> Result<()> {
    // ── 1. Bootstrap & logging ────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    devcycle::adapters::log_sink::init(LevelFilter::Info)
        .map_err(|e| anyhow::anyhow!("logger: {e}"))?;

    info!("devcycle v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration (or defaults) ────────────────────────
    let fs = open_store()?;
    let config = match DeviceConfig::load(fs.as_ref()) {
        Ok(cfg) => {
            info!("Config loaded");
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            DeviceConfig::default()
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            DeviceConfig::default()
        }
    };
    let level = level_from_index(config.log_level).map_or(LevelFilter::Info, |l| l.to_level_filter());
    log::set_max_level(level);

    // ── 3. Collaborators ──────────────────────────────────────
    let platform = Platform {
        transport: Box::new(NullTransport),
        fs,
        wifi: Box::new(WifiAdapter::new()),
        sleep: Box::new(ConsoleSleep::new(spawn_stdin_reader())),
        prop_sync: Box::new(LocalPropSync::new()),
        clock_sync: Box::new(SystemClockSync::new()),
        arch: Box::new(NoArchitecture),
    };

    // ── 4. Lifecycle ──────────────────────────────────────────
    let mut orchestrator = Orchestrator::new(config, platform);
    orchestrator.setup();
    let status = orchestrator.startup();
    info!("Startup: {} -> {} mode", status.code, status.next_mode);

    loop {
        match orchestrator.run_loop() {
            LoopOutcome::DeepSleep { secs } => {
                info!("Run complete, next wake in {}s", secs);
                return Ok(());
            }
            LoopOutcome::Slept { .. } | LoopOutcome::Interrupted => {}
        }
    }
}
