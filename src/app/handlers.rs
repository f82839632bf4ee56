//! Built-in console verbs.
//!
//! One handler per verb; arity is declared in [`COMMANDS`] and checked by
//! the table engine before a handler runs.  Verbs missing here fall through
//! to the project layer's `Architecture::command`.

use core::fmt::Write as _;

use log::Level;

use crate::diagnostics::level_from_index;
use crate::registry::Mode;
use crate::timing::humanize;

use super::commands::{CmdExecStatus, Command, CommandHandler, CommandSpec};
use super::ports::{SyncStatus, WifiCredentials};
use super::service::{ActOutcome, Orchestrator};

const fn verb(
    verb: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    usage: &'static str,
    handler: CommandHandler<Orchestrator>,
) -> CommandSpec<Orchestrator> {
    CommandSpec {
        verb,
        min_args,
        max_args,
        usage,
        handler,
    }
}

pub(super) const COMMANDS: &[CommandSpec<Orchestrator>] = &[
    verb("int", 0, Some(0), "int                      : interrupt the current cycle", cmd_int),
    verb("mode", 0, Some(1), "mode [run|conf]          : show or switch mode", cmd_mode),
    verb("info", 0, Some(0), "info                     : device summary", cmd_info),
    verb("test", 0, Some(0), "test                     : project self-test", cmd_test),
    verb("update", 1, Some(1), "update <target>          : push state, then update firmware", cmd_update),
    verb("clear", 0, Some(0), "clear                    : clear the device", cmd_clear),
    verb("logl", 1, Some(1), "logl <0-3>               : log level (0 debug .. 3 error)", cmd_logl),
    verb("logo", 1, None, "logo <target:level,...>  : per-target log levels ('-' clears)", cmd_logo),
    verb("wifissid", 1, None, "wifissid <ssid>          : set Wi-Fi SSID", cmd_wifissid),
    verb("wifipass", 1, None, "wifipass <pass>          : set Wi-Fi password", cmd_wifipass),
    verb("wifi", 0, Some(0), "wifi                     : connect Wi-Fi", cmd_wifi),
    verb("wifistop", 0, Some(0), "wifistop                 : disconnect Wi-Fi", cmd_wifistop),
    verb("get", 0, Some(1), "get [actor]              : show properties", cmd_get),
    verb("set", 3, None, "set <actor> <prop> <val> : set a property", cmd_set),
    verb("actall", 0, Some(0), "actall                   : every actor acts once", cmd_actall),
    verb("actone", 1, Some(1), "actone <actor>           : one actor acts once", cmd_actone),
    verb("touchall", 0, Some(0), "touchall                 : mark every actor changed", cmd_touchall),
    verb("store", 0, Some(0), "store                    : save properties locally", cmd_store),
    verb("load", 0, Some(0), "load                     : load properties from storage", cmd_load),
    verb("save", 2, None, "save <file> <content>    : write a file", cmd_save),
    verb("cat", 1, Some(1), "cat <file>               : show a file", cmd_cat),
    verb("syncprops", 0, Some(0), "syncprops                : reconcile properties", cmd_syncprops),
    verb("syncclock", 0, Some(0), "syncclock                : synchronise the clock", cmd_syncclock),
    verb("help", 0, Some(0), "help                     : this list", cmd_help),
    verb("?", 0, Some(0), "?                        : this list", cmd_help),
];

fn executed_if(ok: bool) -> CmdExecStatus {
    if ok {
        CmdExecStatus::Executed
    } else {
        CmdExecStatus::CmdFailed
    }
}

fn from_sync(status: SyncStatus, out: &mut String) -> CmdExecStatus {
    let _ = writeln!(out, "{status}");
    executed_if(!status.is_failure())
}

// ── Mode & control ────────────────────────────────────────────

fn cmd_int(_o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    out.push_str("interrupted\n");
    CmdExecStatus::ExecutedInterrupt
}

fn cmd_mode(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let Some(raw) = cmd.arg(0) else {
        let _ = writeln!(out, "mode: {}", o.registry.mode());
        return CmdExecStatus::Executed;
    };
    let Some(mode) = Mode::parse(raw) else {
        return CmdExecStatus::InvalidArgs;
    };
    o.registry.set_mode(mode);
    report!(o, Level::Info, "cmd", "mode set to {}", mode);
    let _ = writeln!(out, "mode: {mode}");
    CmdExecStatus::ExecutedInterrupt
}

fn cmd_info(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let _ = writeln!(out, "version : {}", o.config.project_version);
    let _ = writeln!(out, "mode    : {}", o.registry.mode());
    let _ = writeln!(out, "time    : {}", humanize(o.registry.now()));
    let _ = writeln!(out, "uptime  : {}s", o.platform.sleep.uptime_secs());
    let _ = writeln!(out, "actors  : {}", o.registry.names().join(", "));
    let _ = writeln!(out, "startup : {:?}", o.phase);
    let _ = writeln!(
        out,
        "logs    : {} buffered, {} dropped",
        o.diag.len(),
        o.diag.dropped_bytes()
    );
    o.platform.arch.info(&o.registry, out);
    CmdExecStatus::Executed
}

fn cmd_test(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    o.platform.arch.test(&mut o.registry, out)
}

fn cmd_update(o: &mut Orchestrator, cmd: &Command<'_>, _out: &mut String) -> CmdExecStatus {
    let Some(target) = cmd.arg(0) else {
        return CmdExecStatus::InvalidArgs;
    };
    executed_if(o.trigger_update(target))
}

fn cmd_clear(o: &mut Orchestrator, _cmd: &Command<'_>, _out: &mut String) -> CmdExecStatus {
    o.platform.arch.clear_device();
    CmdExecStatus::Executed
}

// ── Logging ───────────────────────────────────────────────────

fn cmd_logl(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let level = cmd
        .arg(0)
        .and_then(|a| a.parse::<u8>().ok())
        .and_then(|i| level_from_index(i).ok());
    let Some(level) = level else {
        return CmdExecStatus::InvalidArgs;
    };
    o.diag.set_level(level);
    log::set_max_level(level.to_level_filter());
    let _ = writeln!(out, "log level: {level}");
    CmdExecStatus::Executed
}

fn cmd_logo(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    match o.diag.set_options(cmd.rest_from(0)) {
        Ok(()) => {
            let _ = writeln!(out, "log options: {}", o.diag.options());
            CmdExecStatus::Executed
        }
        Err(e) => {
            let _ = writeln!(out, "{e}");
            CmdExecStatus::InvalidArgs
        }
    }
}

// ── Wi-Fi ─────────────────────────────────────────────────────

fn cmd_wifissid(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    match o.registry.settings_mut().set_wifi_ssid(cmd.rest_from(0)) {
        Ok(()) => CmdExecStatus::Executed,
        Err(e) => {
            let _ = writeln!(out, "{e}");
            CmdExecStatus::InvalidArgs
        }
    }
}

fn cmd_wifipass(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    match o.registry.settings_mut().set_wifi_pass(cmd.rest_from(0)) {
        Ok(()) => CmdExecStatus::Executed,
        Err(e) => {
            let _ = writeln!(out, "{e}");
            CmdExecStatus::InvalidArgs
        }
    }
}

fn cmd_wifi(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let settings = o.registry.settings();
    let credentials = WifiCredentials {
        ssid: settings.wifi_ssid(),
        pass: settings.wifi_pass(),
        ssid_backup: settings.wifi_ssid_backup(),
        pass_backup: settings.wifi_pass_backup(),
    };
    let connected = o.platform.wifi.init_wifi(&credentials);
    let _ = writeln!(out, "wifi: {}", if connected { "connected" } else { "not connected" });
    executed_if(connected)
}

fn cmd_wifistop(o: &mut Orchestrator, _cmd: &Command<'_>, _out: &mut String) -> CmdExecStatus {
    o.platform.wifi.stop_wifi();
    CmdExecStatus::Executed
}

// ── Properties & actors ───────────────────────────────────────

fn cmd_get(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    match o.registry.describe(cmd.arg(0)) {
        Ok(text) => {
            out.push_str(&text);
            CmdExecStatus::Executed
        }
        Err(e) => {
            let _ = writeln!(out, "{e}");
            CmdExecStatus::InvalidArgs
        }
    }
}

fn cmd_set(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let (Some(actor), Some(prop)) = (cmd.arg(0), cmd.arg(1)) else {
        return CmdExecStatus::InvalidArgs;
    };
    match o.registry.set_prop(actor, prop, cmd.rest_from(2)) {
        Ok(()) => {
            if o.registry.is_sensitive(actor, prop) {
                let _ = writeln!(out, "{actor}.{prop}: ***");
            } else if let Ok(value) = o.registry.prop_value(actor, prop) {
                let _ = writeln!(out, "{actor}.{prop}: {value}");
            }
            CmdExecStatus::Executed
        }
        Err(e) => {
            let _ = writeln!(out, "{actor}.{prop}: {e}");
            CmdExecStatus::InvalidArgs
        }
    }
}

fn cmd_actall(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let now = o.registry.now();
    for index in 0..o.registry.len() {
        if o.act_and_run(index, now, out) == ActOutcome::Interrupted {
            return CmdExecStatus::ExecutedInterrupt;
        }
    }
    CmdExecStatus::Executed
}

fn cmd_actone(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let Some(index) = cmd.arg(0).and_then(|name| o.registry.index_of(name)) else {
        return CmdExecStatus::InvalidArgs;
    };
    let now = o.registry.now();
    match o.act_and_run(index, now, out) {
        ActOutcome::Done => CmdExecStatus::Executed,
        ActOutcome::Failed => CmdExecStatus::CmdFailed,
        ActOutcome::Interrupted => CmdExecStatus::ExecutedInterrupt,
    }
}

fn cmd_touchall(o: &mut Orchestrator, _cmd: &Command<'_>, _out: &mut String) -> CmdExecStatus {
    o.registry.touch_all();
    CmdExecStatus::Executed
}

// ── Persistence & files ───────────────────────────────────────

fn cmd_store(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let status = o.with_prop_sync(|ps, ctx| ps.fs_store_actors_props(ctx));
    from_sync(status, out)
}

fn cmd_load(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let status = o.with_prop_sync(|ps, ctx| ps.fs_load_actors_props(ctx));
    from_sync(status, out)
}

fn cmd_save(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let Some(name) = cmd.arg(0) else {
        return CmdExecStatus::InvalidArgs;
    };
    match o.platform.fs.write(name, cmd.rest_from(1)) {
        Ok(()) => CmdExecStatus::Executed,
        Err(e) => {
            let _ = writeln!(out, "{name}: {e}");
            CmdExecStatus::CmdFailed
        }
    }
}

fn cmd_cat(o: &mut Orchestrator, cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    if !o.config.insecure {
        out.push_str("cat is disabled on secure builds\n");
        return CmdExecStatus::CmdFailed;
    }
    let Some(name) = cmd.arg(0) else {
        return CmdExecStatus::InvalidArgs;
    };
    match o.platform.fs.read(name) {
        Ok(content) => {
            out.push_str(&content);
            if !content.ends_with('\n') {
                out.push('\n');
            }
            CmdExecStatus::Executed
        }
        Err(e) => {
            let _ = writeln!(out, "{name}: {e}");
            CmdExecStatus::CmdFailed
        }
    }
}

// ── Sync ──────────────────────────────────────────────────────

fn cmd_syncprops(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let status = o.with_prop_sync(|ps, ctx| ps.pull_push_actors(ctx, false));
    if status.is_failure() {
        report!(o, Level::Warn, "sync", "property sync failed: {}", status);
    }
    from_sync(status, out)
}

fn cmd_syncclock(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    let attempts = o.config.clock_sync_attempts;
    let ok = o.with_clock_sync(|cs, ctx| cs.sync_clock(ctx, false, attempts));
    if ok {
        let _ = writeln!(out, "time: {}", humanize(o.registry.now()));
    } else {
        report!(o, Level::Warn, "sync", "clock sync failed");
    }
    executed_if(ok)
}

fn cmd_help(o: &mut Orchestrator, _cmd: &Command<'_>, out: &mut String) -> CmdExecStatus {
    o.help(out);
    CmdExecStatus::Executed
}
