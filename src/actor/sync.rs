//! Sync actors: turn schedule boundaries into `syncprops` / `syncclock`.

use super::{Actor, Metadata, PropClass, PropDescriptor, PropKind, PropValue};
use crate::error::PropError;
use crate::timing::{Frequency, TimeUnit};

pub const PROPSYNC_NAME: &str = "propsync";
pub const CLOCKSYNC_NAME: &str = "clocksync";

static PROPS: [PropDescriptor; 1] = [PropDescriptor::new(
    "freq",
    PropKind::Schedule,
    PropClass::Advanced,
)];

/// Actor whose only job is to emit one command per boundary.
#[derive(Debug, Clone)]
pub struct SyncActor {
    name: &'static str,
    command: &'static str,
    metadata: Metadata,
}

impl SyncActor {
    pub fn new(name: &'static str, command: &'static str, frequency: Frequency) -> Self {
        Self {
            name,
            command,
            metadata: Metadata::new(frequency),
        }
    }

    /// Property reconciliation, roughly hourly.
    pub fn prop_sync() -> Self {
        Self::new(
            PROPSYNC_NAME,
            "syncprops",
            Frequency::Period {
                count: 1,
                unit: TimeUnit::Hours,
                approx: true,
            },
        )
    }

    /// Clock synchronisation, roughly daily.
    pub fn clock_sync() -> Self {
        Self::new(
            CLOCKSYNC_NAME,
            "syncclock",
            Frequency::Period {
                count: 1,
                unit: TimeUnit::Days,
                approx: true,
            },
        )
    }
}

impl Actor for SyncActor {
    fn name(&self) -> &str {
        self.name
    }

    fn props(&self) -> &'static [PropDescriptor] {
        &PROPS
    }

    fn get_prop(&self, index: usize) -> Option<PropValue> {
        (index == 0).then(|| PropValue::Schedule(self.metadata.timing().frequency()))
    }

    fn set_prop(&mut self, index: usize, value: PropValue) -> Result<(), PropError> {
        if index != 0 {
            return Err(PropError::Unknown);
        }
        self.metadata
            .timing_mut()
            .set_frequency(value.into_schedule()?);
        Ok(())
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn act(&mut self, _now: i64) -> Vec<String> {
        vec![self.command.to_owned()]
    }
}
