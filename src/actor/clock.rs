//! Wall-clock actor.
//!
//! Keeps epoch seconds advancing from the monotonic uptime the orchestrator
//! feeds it on every cycle.  The `time` property survives persistence, which
//! is how the last known time is recovered across deep-sleep restarts.

use super::{Actor, Metadata, PropClass, PropDescriptor, PropKind, PropValue};
use crate::error::PropError;
use crate::timing::Frequency;

pub const CLOCK_NAME: &str = "clock";

/// Latest accepted time: 9999-12-31T23:59:59Z.
pub const MAX_CLOCK_TIME: i64 = 253_402_300_799;

static PROPS: [PropDescriptor; 1] = [PropDescriptor::new(
    "time",
    PropKind::Integer,
    PropClass::Status,
)];

#[derive(Debug, Clone)]
pub struct Clock {
    time: i64,
    last_uptime: u64,
    metadata: Metadata,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            time: 0,
            last_uptime: 0,
            metadata: Metadata::new(Frequency::Never),
        }
    }

    /// Epoch seconds, `0` when never set.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Adopt an authoritative time, clamped to `0..=MAX_CLOCK_TIME`.
    pub fn set_time(&mut self, t: i64) {
        self.time = t.clamp(0, MAX_CLOCK_TIME);
    }

    /// Advance by the uptime elapsed since the previous tick.
    pub fn tick(&mut self, uptime_secs: u64) {
        if uptime_secs > self.last_uptime {
            let elapsed = i64::try_from(uptime_secs - self.last_uptime).unwrap_or(i64::MAX);
            self.time = self.time.saturating_add(elapsed);
        }
        self.last_uptime = uptime_secs;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Clock {
    fn name(&self) -> &str {
        CLOCK_NAME
    }

    fn props(&self) -> &'static [PropDescriptor] {
        &PROPS
    }

    fn get_prop(&self, index: usize) -> Option<PropValue> {
        (index == 0).then_some(PropValue::Int(self.time))
    }

    fn set_prop(&mut self, index: usize, value: PropValue) -> Result<(), PropError> {
        if index != 0 {
            return Err(PropError::Unknown);
        }
        let t = value.into_int()?;
        if !(0..=MAX_CLOCK_TIME).contains(&t) {
            return Err(PropError::OutOfRange);
        }
        self.time = t;
        Ok(())
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
