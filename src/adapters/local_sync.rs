//! Offline property sync.
//!
//! Implements [`PropSync`] against the file store only.  The whole property
//! set is persisted as one JSON document, `{ "actor": { "prop": "value" } }`,
//! credentials included.  Every remote operation reports
//! [`SyncStatus::Skipped`]: there is no authority to talk to, and skipping
//! never forces the device into Configure mode.

use log::{debug, info, warn};

use crate::app::ports::{PropSync, StorageError, SyncContext, SyncStatus};

/// File holding the persisted properties.
pub const ACTORS_FILE: &str = "actors.json";

#[derive(Debug, Default)]
pub struct LocalPropSync {
    login: Option<String>,
}

impl LocalPropSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Login last handed over by the orchestrator.
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }
}

impl PropSync for LocalPropSync {
    fn fs_load_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        let raw = match ctx.fs.read(ACTORS_FILE) {
            Ok(raw) => raw,
            Err(StorageError::NotFound) => {
                debug!("LocalPropSync: no {} yet", ACTORS_FILE);
                return SyncStatus::Skipped;
            }
            Err(e) => {
                warn!("LocalPropSync: reading {} failed: {}", ACTORS_FILE, e);
                return SyncStatus::StorageFailure;
            }
        };
        match ctx.registry.apply_props_json(&raw) {
            Ok(applied) => {
                info!("LocalPropSync: {} properties loaded", applied);
                SyncStatus::Success
            }
            Err(e) => {
                warn!("LocalPropSync: {} unusable: {}", ACTORS_FILE, e);
                SyncStatus::InvalidResponse
            }
        }
    }

    fn fs_store_actors_props(&mut self, ctx: &mut SyncContext<'_>) -> SyncStatus {
        let doc = ctx.registry.stored_props_json();
        match ctx.fs.write(ACTORS_FILE, &doc) {
            Ok(()) => SyncStatus::Success,
            Err(e) => {
                warn!("LocalPropSync: writing {} failed: {}", ACTORS_FILE, e);
                SyncStatus::StorageFailure
            }
        }
    }

    fn set_login_pass(&mut self, user: &str, _pass: &str) {
        self.login = Some(user.to_owned());
    }

    fn pull_actors(&mut self, _ctx: &mut SyncContext<'_>) -> SyncStatus {
        SyncStatus::Skipped
    }

    fn pull_push_actors(&mut self, _ctx: &mut SyncContext<'_>, _freeze: bool) -> SyncStatus {
        SyncStatus::Skipped
    }

    fn push_actors(&mut self, _ctx: &mut SyncContext<'_>, _freeze: bool) -> SyncStatus {
        SyncStatus::Skipped
    }

    fn push_description(&mut self, _ctx: &mut SyncContext<'_>, _description: &str) -> SyncStatus {
        SyncStatus::Skipped
    }

    fn push_log_messages(&mut self, _ctx: &mut SyncContext<'_>, _text: &str) -> SyncStatus {
        SyncStatus::Skipped
    }
}
