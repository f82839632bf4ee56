//! Firmware update scheduling.

use devcycle::app::commands::CmdExecStatus;
use devcycle::app::ports::SyncStatus;
use devcycle::app::service::Orchestrator;

use crate::mock_platform::{Journal, Shared, orchestrator, test_config};

/// Orchestrator whose settings actor has just acted on an update boundary.
fn due(journal: &Shared, target: &str) -> Orchestrator {
    let mut orch = orchestrator(journal, test_config());
    orch.command(&format!("set settings target {target}"));
    assert_eq!(orch.command("actone settings").status, CmdExecStatus::Executed);
    assert!(orch.registry().settings().update_due());
    orch
}

#[test]
fn skip_target_clears_the_due_flag_without_pushing() {
    let journal = Journal::shared();
    let mut orch = due(&journal, "skip");

    assert!(!orch.update_if_must());

    assert!(!orch.registry().settings().update_due());
    let j = journal.borrow();
    assert!(!j.called("push"));
    assert!(j.updates.is_empty());
}

#[test]
fn nothing_happens_when_no_update_is_due() {
    let journal = Journal::shared();
    let mut orch = orchestrator(&journal, test_config());
    orch.command("set settings target v2");

    assert!(!orch.update_if_must());
    assert!(journal.borrow().updates.is_empty());
}

#[test]
fn failed_push_keeps_the_update_due() {
    let journal = Journal::shared();
    journal.borrow_mut().push_status = SyncStatus::ConnectionFailure;
    let mut orch = due(&journal, "v2");

    assert!(!orch.update_if_must());

    assert!(orch.registry().settings().update_due());
    let j = journal.borrow();
    assert!(j.called("push"));
    assert!(j.updates.is_empty());
}

#[test]
fn accepted_update_hands_off_target_and_current_version() {
    let journal = Journal::shared();
    let mut orch = due(&journal, "v2");

    assert!(orch.update_if_must());

    assert!(!orch.registry().settings().update_due());
    let j = journal.borrow();
    assert_eq!(
        j.updates,
        [("v2".to_owned(), env!("CARGO_PKG_VERSION").to_owned())]
    );
    // Pending state went out before the handoff.
    assert_eq!(j.dirty_at_push.last().unwrap(), &["settings"]);
}

#[test]
fn refused_update_stays_due() {
    let journal = Journal::shared();
    journal.borrow_mut().update_accepts = false;
    let mut orch = due(&journal, "v2");

    assert!(!orch.update_if_must());

    assert!(orch.registry().settings().update_due());
    assert_eq!(journal.borrow().updates.len(), 1);
}

#[test]
fn skipped_push_does_not_block_the_update() {
    let journal = Journal::shared();
    journal.borrow_mut().push_status = SyncStatus::Skipped;
    let mut orch = due(&journal, "v2");

    assert!(orch.update_if_must());
    assert_eq!(journal.borrow().updates.len(), 1);
}

#[test]
fn update_command_triggers_immediately() {
    let journal = Journal::shared();
    let mut orch = orchestrator(&journal, test_config());

    assert_eq!(orch.command("update v5").status, CmdExecStatus::Executed);
    assert_eq!(journal.borrow().updates[0].0, "v5");

    journal.borrow_mut().update_accepts = false;
    assert_eq!(orch.command("update v6").status, CmdExecStatus::CmdFailed);
}

#[test]
fn due_update_runs_at_the_end_of_a_cycle() {
    let journal = Journal::shared();
    let mut orch = due(&journal, "v2");

    orch.run_loop();

    assert_eq!(journal.borrow().updates.len(), 1);
    assert!(!orch.registry().settings().update_due());
}
