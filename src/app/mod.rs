//! Application layer: hexagonal architecture core.
//!
//! ```text
//!   Console / actors          Sync collaborators
//!        │                    (PropSync, ClockSync)
//!        ▼                            ▲
//!   ┌──────────┐    ┌──────────────────┴─┐    ┌──────────┐
//!   │ Commands │───▶│    Orchestrator    │───▶│  Ports   │
//!   └──────────┘    │ startup · catch-up │    │ (traits) │
//!                   │ update · logs      │    └──────────┘
//!                   └────────────────────┘
//! ```
//!
//! The [`Orchestrator`](service::Orchestrator) never touches hardware
//! directly.  It talks to the world through the traits in [`ports`].

/// Log through `log` and copy the record into the diagnostics buffer.
macro_rules! report {
    ($orch:ident, $level:expr, $target:literal, $($arg:tt)+) => {{
        log::log!(target: $target, $level, $($arg)+);
        $orch.diag.record($level, $target, format_args!($($arg)+));
    }};
}

pub mod commands;
mod handlers;
pub mod ports;
pub mod service;
pub mod startup;
