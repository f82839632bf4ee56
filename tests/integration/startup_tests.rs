//! Startup reconciliation against recording mocks.

use devcycle::app::service::LoopOutcome;
use devcycle::app::startup::{StartupCode, StartupPhase};
use devcycle::config::DeviceConfig;
use devcycle::registry::Mode;

use crate::mock_platform::{ACTORS_FILE, Journal, T0, orchestrator, started, test_config};

#[test]
fn successful_startup_enters_run_mode() {
    let journal = Journal::shared();
    let mut orch = orchestrator(&journal, test_config());
    assert_eq!(orch.setup(), Mode::Run);

    let status = orch.startup();

    assert_eq!(status.code, StartupCode::Success);
    assert_eq!(status.next_mode, Mode::Run);
    assert_eq!(orch.mode(), Mode::Run);
    assert_eq!(orch.phase(), StartupPhase::Ready(Mode::Run));
    assert_eq!(orch.registry().now(), T0);

    let j = journal.borrow();
    let order: Vec<&str> = j
        .calls
        .iter()
        .map(String::as_str)
        .filter(|c| ["fs_load", "pull", "push", "fs_store", "sync_clock"].contains(c))
        .collect();
    assert_eq!(order, ["fs_load", "pull", "push", "fs_store", "sync_clock"]);
    assert!(j.files.contains_key(ACTORS_FILE));
}

#[test]
fn failed_property_pull_forces_configure_without_clock_sync() {
    let journal = Journal::shared();
    journal.borrow_mut().pull_status = devcycle::app::ports::SyncStatus::ConnectionFailure;
    let mut orch = orchestrator(&journal, test_config());
    orch.setup();

    let status = orch.startup();

    assert_eq!(status.code, StartupCode::PropertySyncFailure);
    assert_eq!(status.next_mode, Mode::Configure);
    assert_eq!(orch.mode(), Mode::Configure);
    assert_eq!(
        orch.phase(),
        StartupPhase::Failed(StartupCode::PropertySyncFailure)
    );
    assert!(!journal.borrow().called("sync_clock"));
}

#[test]
fn failed_clock_sync_forces_configure() {
    let journal = Journal::shared();
    journal.borrow_mut().clock_ok = false;
    let mut orch = orchestrator(&journal, test_config());
    orch.setup();

    let status = orch.startup();

    assert_eq!(status.code, StartupCode::ClockSyncFailure);
    assert_eq!(status.next_mode, Mode::Configure);
    assert!(journal.borrow().called("sync_clock"));
}

#[test]
fn configure_requested_at_setup_skips_remote_work() {
    let journal = Journal::shared();
    journal.borrow_mut().setup_mode = Mode::Configure;
    let mut orch = orchestrator(&journal, test_config());
    assert_eq!(orch.setup(), Mode::Configure);

    let status = orch.startup();

    assert_eq!(status.code, StartupCode::Skipped);
    assert_eq!(status.next_mode, Mode::Configure);
    let j = journal.borrow();
    assert!(j.called("fs_load"));
    assert!(!j.called("pull"));
    assert!(!j.called("sync_clock"));
}

#[test]
fn remote_batch_override_survives_startup_and_a_loop() {
    let journal = Journal::shared();
    journal.borrow_mut().remote("settings", "batchfreq", "~20s");
    let mut orch = started(&journal, test_config(), Vec::new());

    let batch = orch.registry().prop_value("settings", "batchfreq").unwrap();
    assert_eq!(batch.to_string(), "~20s");

    journal.borrow_mut().uptime = 60;
    let outcome = orch.run_loop();

    // 60 s past T0, next ~20s boundary is T0 + 80.
    assert_eq!(
        outcome,
        LoopOutcome::Slept {
            secs: 20,
            interrupted: false
        }
    );
    let batch = orch.registry().prop_value("settings", "batchfreq").unwrap();
    assert_eq!(batch.to_string(), "~20s");
    assert!(journal.borrow().files[ACTORS_FILE].contains("~20s"));
}

#[test]
fn operator_input_during_window_keeps_configure_mode() {
    let journal = Journal::shared();
    journal.borrow_mut().pending.push_back("info".into());
    let config = DeviceConfig {
        interactive_override_secs: 3,
        ..test_config()
    };
    let mut orch = orchestrator(&journal, config);
    orch.setup();

    let status = orch.startup();

    assert_eq!(status.code, StartupCode::Success);
    assert_eq!(status.next_mode, Mode::Configure);
    assert_eq!(journal.borrow().sleeps, [3]);

    // The queued line runs in the first Configure cycle.
    let outcome = orch.run_loop();
    assert_eq!(
        outcome,
        LoopOutcome::Slept {
            secs: 4,
            interrupted: false
        }
    );
    assert!(journal.borrow().pending.is_empty());
}

#[test]
fn quiet_window_enters_run_mode() {
    let journal = Journal::shared();
    let config = DeviceConfig {
        interactive_override_secs: 3,
        ..test_config()
    };
    let mut orch = orchestrator(&journal, config);
    orch.setup();

    let status = orch.startup();

    assert_eq!(status.next_mode, Mode::Run);
    assert_eq!(journal.borrow().sleeps, [3]);
}

#[test]
fn configured_credentials_reach_both_sync_collaborators() {
    let journal = Journal::shared();
    let config = DeviceConfig {
        device_login: "dev-7".into(),
        device_pass: "secret".into(),
        ..test_config()
    };
    let _orch = started(&journal, config, Vec::new());

    let j = journal.borrow();
    assert!(j.called("prop_login dev-7"));
    assert!(j.called("clock_login dev-7"));
}

#[test]
fn description_is_pushed_when_configured() {
    let journal = Journal::shared();
    let config = DeviceConfig {
        description: Some(r#"{"actors":["settings"]}"#.into()),
        ..test_config()
    };
    let _orch = started(&journal, config, Vec::new());
    assert!(journal.borrow().called("push_description"));
}

#[test]
fn one_run_startup_pulls_without_pushing() {
    let journal = Journal::shared();
    journal.borrow_mut().remote("settings", "onerun", "true");
    let mut orch = orchestrator(&journal, test_config());
    orch.registry_mut().settings_mut().set_one_run(true);
    orch.setup();

    orch.startup();

    let j = journal.borrow();
    assert!(j.called("pull"));
    assert!(!j.called("push"));
}

#[test]
fn persisted_time_anchors_catch_up() {
    let journal = Journal::shared();
    // A previous run stored the clock 120 s before the authority's time.
    journal.borrow_mut().files.insert(
        ACTORS_FILE.into(),
        format!(r#"{{"clock":{{"time":"{}"}}}}"#, T0 - 120),
    );
    let orch = started(&journal, test_config(), Vec::new());

    let settings = orch.registry().actor(0).unwrap();
    assert_eq!(settings.metadata().timing().current_time(), T0 - 120);
    assert_eq!(orch.registry().now(), T0);
}
