//! Run-mode cycles: catch-up, fail-fast, logs and sleep.

use devcycle::app::ports::SyncStatus;
use devcycle::app::service::{CycleOutcome, LoopOutcome};
use devcycle::config::DeviceConfig;

use crate::mock_platform::{Journal, ScriptedActor, started, test_config};

#[test]
fn failing_command_stops_only_its_actor() {
    let journal = Journal::shared();
    let actors = vec![
        ScriptedActor::boxed(&journal, "a", "60s", &["mark a1", "fail", "mark a3"]),
        ScriptedActor::boxed(&journal, "b", "60s", &["mark b1"]),
    ];
    let mut orch = started(&journal, test_config(), actors);

    journal.borrow_mut().uptime = 60;
    orch.run_loop();

    assert_eq!(journal.borrow().effects, ["a1", "b1"]);
}

#[test]
fn owed_boundaries_are_replayed_in_one_cycle() {
    let journal = Journal::shared();
    let actors = vec![ScriptedActor::boxed(&journal, "c", "60s", &["mark c"])];
    let mut orch = started(&journal, test_config(), actors);

    journal.borrow_mut().uptime = 185;
    orch.run_loop();
    assert_eq!(journal.borrow().effects.len(), 3);

    // Nothing new is owed at the same instant.
    assert_eq!(orch.catch_up_cycle(), CycleOutcome::Completed);
    assert_eq!(journal.borrow().effects.len(), 3);
}

#[test]
fn failed_actor_resumes_owed_boundaries_next_cycle() {
    let journal = Journal::shared();
    let actors = vec![ScriptedActor::boxed(&journal, "f", "60s", &["mark f", "fail"])];
    let mut orch = started(&journal, test_config(), actors);

    journal.borrow_mut().uptime = 180;
    orch.run_loop();
    assert_eq!(journal.borrow().effects, ["f"]);

    // The two remaining boundaries are still owed.
    orch.run_loop();
    orch.run_loop();
    orch.run_loop();
    assert_eq!(journal.borrow().effects, ["f", "f", "f"]);
}

#[test]
fn catch_up_cap_defers_the_rest() {
    let journal = Journal::shared();
    let config = DeviceConfig {
        max_catch_up_per_cycle: 2,
        ..test_config()
    };
    let actors = vec![ScriptedActor::boxed(&journal, "c", "60s", &["mark c"])];
    let mut orch = started(&journal, config, actors);

    journal.borrow_mut().uptime = 300;
    let counts: Vec<usize> = (0..4)
        .map(|_| {
            orch.run_loop();
            journal.borrow().effects.len()
        })
        .collect();
    assert_eq!(counts, [2, 4, 5, 5]);
}

#[test]
fn acts_are_stamped_with_cycle_time() {
    let journal = Journal::shared();
    let actors = vec![ScriptedActor::boxed(&journal, "c", "60s", &[])];
    let mut orch = started(&journal, test_config(), actors);
    let t0 = orch.registry().now();

    journal.borrow_mut().uptime = 125;
    orch.run_loop();

    let acts: Vec<String> = journal
        .borrow()
        .calls
        .iter()
        .filter(|c| c.starts_with("act c"))
        .cloned()
        .collect();
    assert_eq!(acts, [format!("act c {}", t0 + 125), format!("act c {}", t0 + 125)]);
}

#[test]
fn interrupt_from_an_actor_abandons_the_cycle() {
    let journal = Journal::shared();
    let actors = vec![
        ScriptedActor::boxed(&journal, "a", "60s", &["int"]),
        ScriptedActor::boxed(&journal, "b", "60s", &["mark b"]),
    ];
    let mut orch = started(&journal, test_config(), actors);

    journal.borrow_mut().uptime = 60;
    assert_eq!(orch.run_loop(), LoopOutcome::Interrupted);
    assert!(journal.borrow().effects.is_empty());
    assert!(journal.borrow().sleeps.is_empty());
}

#[test]
fn console_interrupt_precedes_catch_up() {
    let journal = Journal::shared();
    let actors = vec![ScriptedActor::boxed(&journal, "c", "60s", &["mark c"])];
    let mut orch = started(&journal, test_config(), actors);

    {
        let mut j = journal.borrow_mut();
        j.uptime = 60;
        j.pending.push_back("mode conf".into());
    }
    assert_eq!(orch.run_loop(), LoopOutcome::Interrupted);
    assert!(journal.borrow().effects.is_empty());
    assert_eq!(orch.mode(), devcycle::registry::Mode::Configure);
}

#[test]
fn one_run_deep_sleep_when_behind_schedule() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());
    orch.registry_mut().settings_mut().set_one_run(true);
    orch.registry_mut()
        .set_prop("settings", "batchfreq", "60s")
        .unwrap();

    // 5 s past the boundary at T0 + 600.
    journal.borrow_mut().uptime = 605;
    assert_eq!(orch.run_loop(), LoopOutcome::DeepSleep { secs: 55 });
    assert_eq!(journal.borrow().deep_sleeps, [55]);
    assert!(journal.borrow().called("push frozen"));
}

#[test]
fn one_run_deep_sleep_when_ahead_of_schedule() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());
    orch.registry_mut().settings_mut().set_one_run(true);
    orch.registry_mut()
        .set_prop("settings", "batchfreq", "60s")
        .unwrap();

    // 3 s before T0 + 660: 3 s, then 59 s from T0 + 661.
    journal.borrow_mut().uptime = 657;
    assert_eq!(orch.run_loop(), LoopOutcome::DeepSleep { secs: 62 });
}

#[test]
fn continuous_mode_sleeps_to_the_next_batch_boundary() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());
    orch.registry_mut()
        .set_prop("settings", "batchfreq", "60s")
        .unwrap();

    journal.borrow_mut().uptime = 657;
    assert_eq!(
        orch.run_loop(),
        LoopOutcome::Slept {
            secs: 3,
            interrupted: false
        }
    );
    assert!(journal.borrow().deep_sleeps.is_empty());
}

#[test]
fn logs_are_cleared_only_after_a_successful_push() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());

    journal.borrow_mut().log_status = SyncStatus::ConnectionFailure;
    journal.borrow_mut().uptime = 60;
    orch.run_loop();
    assert!(journal.borrow().pushed_logs.last().unwrap().contains("BEGIN LOOP"));
    assert!(orch.diagnostics().contents().contains("BEGIN LOOP"));

    journal.borrow_mut().log_status = SyncStatus::Success;
    journal.borrow_mut().uptime = 120;
    orch.run_loop();
    assert!(orch.diagnostics().is_empty());
    let last = journal.borrow().pushed_logs.last().cloned().unwrap();
    assert_eq!(last.matches("BEGIN LOOP").count(), 2);
}

#[test]
fn every_cycle_persists_properties() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());
    let before = journal.borrow().count("fs_store");

    journal.borrow_mut().uptime = 60;
    orch.run_loop();

    assert_eq!(journal.borrow().count("fs_store"), before + 1);
}

#[test]
fn hourly_property_sync_runs_through_the_command_table() {
    let journal = Journal::shared();
    let mut orch = started(&journal, test_config(), Vec::new());
    let pulls = journal.borrow().count("pull");

    journal.borrow_mut().uptime = 3_600;
    orch.run_loop();

    assert_eq!(journal.borrow().count("pull"), pulls + 1);
}
