//! devcycle: lifecycle orchestration for intermittently connected devices.
//!
//! Actors expose typed properties and schedules; the orchestrator reconciles
//! them with local storage and a remote authority at startup, replays missed
//! schedule boundaries every cycle, dispatches the commands actors emit,
//! schedules firmware updates and decides how long to sleep.
//!
//! Hardware and network access go through the port traits in
//! [`app::ports`].  ESP-IDF specifics are guarded by
//! `#[cfg(target_os = "espidf")]` inside [`adapters`].

#![deny(unused_must_use)]

pub mod actor;
pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod power;
pub mod registry;
pub mod timing;
