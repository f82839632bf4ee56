//! Device-wide settings actor.
//!
//! Holds the batch schedule (whole-device wake cadence), the firmware
//! update schedule (this actor's own metadata timing), the update target
//! and the Wi-Fi credentials.  Acting on an update boundary only marks the
//! update as due; the orchestrator decides when to hand it off.

use super::{Actor, Metadata, PropClass, PropDescriptor, PropKind, PropValue, bounded};
use crate::error::PropError;
use crate::timing::{Frequency, TimeUnit, Timing};

pub const SETTINGS_NAME: &str = "settings";

/// Update target meaning "stay on the current firmware".
pub const SKIP_UPDATE_TARGET: &str = "skip";

/// Maximum Wi-Fi SSID / password length in bytes.
pub const WIFI_FIELD_LEN: usize = 64;

type WifiField = heapless::String<WIFI_FIELD_LEN>;

const PROP_DEBUG: usize = 0;
const PROP_STATUS: usize = 1;
const PROP_VERSION: usize = 2;
const PROP_ONERUN: usize = 3;
const PROP_BATCHFREQ: usize = 4;
const PROP_UPDATEFREQ: usize = 5;
const PROP_TARGET: usize = 6;
const PROP_WIFI_SSID: usize = 7;
const PROP_WIFI_PASS: usize = 8;
const PROP_WIFI_SSID_B: usize = 9;
const PROP_WIFI_PASS_B: usize = 10;

static PROPS: [PropDescriptor; 11] = [
    PropDescriptor::new("debug", PropKind::Boolean, PropClass::Debug),
    PropDescriptor::new("status", PropKind::String, PropClass::Status),
    PropDescriptor::new("version", PropKind::String, PropClass::Status),
    PropDescriptor::new("onerun", PropKind::Boolean, PropClass::Advanced),
    PropDescriptor::new("batchfreq", PropKind::Schedule, PropClass::Advanced),
    PropDescriptor::new("updatefreq", PropKind::Schedule, PropClass::Advanced),
    PropDescriptor::new("target", PropKind::String, PropClass::Normal),
    PropDescriptor::new("wifissid", PropKind::String, PropClass::Sensitive),
    PropDescriptor::new("wifipass", PropKind::String, PropClass::Sensitive),
    PropDescriptor::new("wifissidb", PropKind::String, PropClass::Sensitive),
    PropDescriptor::new("wifipassb", PropKind::String, PropClass::Sensitive),
];

/// Default batch cadence: roughly once a minute.
pub const DEFAULT_BATCH_FREQUENCY: Frequency = Frequency::Period {
    count: 60,
    unit: TimeUnit::Seconds,
    approx: true,
};

/// Default update check: roughly once a day.
pub const DEFAULT_UPDATE_FREQUENCY: Frequency = Frequency::Period {
    count: 1,
    unit: TimeUnit::Days,
    approx: true,
};

#[derive(Debug, Clone)]
pub struct Settings {
    debug: bool,
    status: String,
    version: String,
    one_run: bool,
    batch: Timing,
    target: String,
    wifi_ssid: WifiField,
    wifi_pass: WifiField,
    wifi_ssid_backup: WifiField,
    wifi_pass_backup: WifiField,
    update_due: bool,
    metadata: Metadata,
}

impl Settings {
    pub fn new(version: &str) -> Self {
        Self {
            debug: false,
            status: String::from("ok"),
            version: version.to_owned(),
            one_run: false,
            batch: Timing::new(DEFAULT_BATCH_FREQUENCY),
            target: SKIP_UPDATE_TARGET.to_owned(),
            wifi_ssid: WifiField::new(),
            wifi_pass: WifiField::new(),
            wifi_ssid_backup: WifiField::new(),
            wifi_pass_backup: WifiField::new(),
            update_due: false,
            metadata: Metadata::new(DEFAULT_UPDATE_FREQUENCY),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn one_run(&self) -> bool {
        self.one_run
    }

    pub fn set_one_run(&mut self, one_run: bool) {
        self.one_run = one_run;
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: &str) {
        status.clone_into(&mut self.status);
        self.metadata.changed();
    }

    /// Whole-device wake schedule.
    pub fn batch_timing(&self) -> &Timing {
        &self.batch
    }

    pub fn batch_timing_mut(&mut self) -> &mut Timing {
        &mut self.batch
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn update_due(&self) -> bool {
        self.update_due
    }

    pub fn clear_update_due(&mut self) {
        self.update_due = false;
    }

    pub fn wifi_ssid(&self) -> &str {
        &self.wifi_ssid
    }

    pub fn wifi_pass(&self) -> &str {
        &self.wifi_pass
    }

    pub fn wifi_ssid_backup(&self) -> &str {
        &self.wifi_ssid_backup
    }

    pub fn wifi_pass_backup(&self) -> &str {
        &self.wifi_pass_backup
    }

    /// Replace the primary SSID, keeping the previous one as backup.
    pub fn set_wifi_ssid(&mut self, ssid: &str) -> Result<(), PropError> {
        let new = bounded(ssid)?;
        if !self.wifi_ssid.is_empty() && self.wifi_ssid != new {
            self.wifi_ssid_backup = core::mem::replace(&mut self.wifi_ssid, new);
        } else {
            self.wifi_ssid = new;
        }
        self.metadata.changed();
        Ok(())
    }

    /// Replace the primary password, keeping the previous one as backup.
    pub fn set_wifi_pass(&mut self, pass: &str) -> Result<(), PropError> {
        let new = bounded(pass)?;
        if !self.wifi_pass.is_empty() && self.wifi_pass != new {
            self.wifi_pass_backup = core::mem::replace(&mut self.wifi_pass, new);
        } else {
            self.wifi_pass = new;
        }
        self.metadata.changed();
        Ok(())
    }
}

impl Actor for Settings {
    fn name(&self) -> &str {
        SETTINGS_NAME
    }

    fn props(&self) -> &'static [PropDescriptor] {
        &PROPS
    }

    fn get_prop(&self, index: usize) -> Option<PropValue> {
        let value = match index {
            PROP_DEBUG => PropValue::Bool(self.debug),
            PROP_STATUS => PropValue::Str(self.status.clone()),
            PROP_VERSION => PropValue::Str(self.version.clone()),
            PROP_ONERUN => PropValue::Bool(self.one_run),
            PROP_BATCHFREQ => PropValue::Schedule(self.batch.frequency()),
            PROP_UPDATEFREQ => PropValue::Schedule(self.metadata.timing().frequency()),
            PROP_TARGET => PropValue::Str(self.target.clone()),
            PROP_WIFI_SSID => PropValue::Str(self.wifi_ssid.as_str().to_owned()),
            PROP_WIFI_PASS => PropValue::Str(self.wifi_pass.as_str().to_owned()),
            PROP_WIFI_SSID_B => PropValue::Str(self.wifi_ssid_backup.as_str().to_owned()),
            PROP_WIFI_PASS_B => PropValue::Str(self.wifi_pass_backup.as_str().to_owned()),
            _ => return None,
        };
        Some(value)
    }

    fn set_prop(&mut self, index: usize, value: PropValue) -> Result<(), PropError> {
        match index {
            PROP_DEBUG => self.debug = value.into_bool()?,
            PROP_STATUS => self.status = value.into_string()?,
            PROP_VERSION => self.version = value.into_string()?,
            PROP_ONERUN => self.one_run = value.into_bool()?,
            PROP_BATCHFREQ => self.batch.set_frequency(value.into_schedule()?),
            PROP_UPDATEFREQ => self
                .metadata
                .timing_mut()
                .set_frequency(value.into_schedule()?),
            PROP_TARGET => self.target = value.into_string()?,
            PROP_WIFI_SSID => self.wifi_ssid = bounded(&value.into_string()?)?,
            PROP_WIFI_PASS => self.wifi_pass = bounded(&value.into_string()?)?,
            PROP_WIFI_SSID_B => self.wifi_ssid_backup = bounded(&value.into_string()?)?,
            PROP_WIFI_PASS_B => self.wifi_pass_backup = bounded(&value.into_string()?)?,
            _ => return Err(PropError::Unknown),
        }
        Ok(())
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn act(&mut self, _now: i64) -> Vec<String> {
        self.update_due = true;
        Vec::new()
    }
}
