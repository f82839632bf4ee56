//! Actors: schedulable units of device behaviour.
//!
//! Each actor exposes a fixed, ordered table of typed properties (the index
//! is the addressing scheme), owns a [`Metadata`] with its schedule, and
//! reacts to schedule boundaries through [`Actor::act`], which returns
//! command lines for the dispatcher.
//!
//! | Actor        | Role                                         |
//! |--------------|----------------------------------------------|
//! | `settings`   | device-wide options, batch and update timing |
//! | `clock`      | wall-clock time derived from uptime          |
//! | `propsync`   | periodic property reconciliation             |
//! | `clocksync`  | periodic clock synchronisation               |

pub mod clock;
pub mod settings;
pub mod sync;

use core::fmt;

use crate::error::PropError;
use crate::timing::{Frequency, Timing};

pub use clock::Clock;
pub use settings::Settings;
pub use sync::SyncActor;

// ───────────────────────────────────────────────────────────────
// Property descriptors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    String,
    Boolean,
    Integer,
    Schedule,
}

/// Visibility class of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropClass {
    Normal,
    /// Credentials; never shown by `get` nor pushed in descriptions.
    Sensitive,
    Debug,
    Advanced,
    /// Reported by the device, informational for the remote side.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropDescriptor {
    pub name: &'static str,
    pub kind: PropKind,
    pub class: PropClass,
}

impl PropDescriptor {
    pub const fn new(name: &'static str, kind: PropKind, class: PropClass) -> Self {
        Self { name, kind, class }
    }
}

// ───────────────────────────────────────────────────────────────
// Property values
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Schedule(Frequency),
}

impl PropValue {
    /// Parse a textual value according to the declared kind.
    pub fn parse(kind: PropKind, raw: &str) -> Result<Self, PropError> {
        match kind {
            PropKind::String => Ok(Self::Str(raw.to_owned())),
            PropKind::Boolean => match raw.trim() {
                "true" | "TRUE" | "1" | "y" => Ok(Self::Bool(true)),
                "false" | "FALSE" | "0" | "n" => Ok(Self::Bool(false)),
                _ => Err(PropError::BadBoolean),
            },
            PropKind::Integer => raw
                .trim()
                .parse()
                .map(Self::Int)
                .map_err(|_| PropError::BadInteger),
            PropKind::Schedule => Ok(Self::Schedule(raw.parse()?)),
        }
    }

    pub fn kind(&self) -> PropKind {
        match self {
            Self::Str(_) => PropKind::String,
            Self::Bool(_) => PropKind::Boolean,
            Self::Int(_) => PropKind::Integer,
            Self::Schedule(_) => PropKind::Schedule,
        }
    }

    pub fn into_string(self) -> Result<String, PropError> {
        match self {
            Self::Str(s) => Ok(s),
            _ => Err(PropError::KindMismatch),
        }
    }

    pub fn into_bool(self) -> Result<bool, PropError> {
        match self {
            Self::Bool(b) => Ok(b),
            _ => Err(PropError::KindMismatch),
        }
    }

    pub fn into_int(self) -> Result<i64, PropError> {
        match self {
            Self::Int(i) => Ok(i),
            _ => Err(PropError::KindMismatch),
        }
    }

    pub fn into_schedule(self) -> Result<Frequency, PropError> {
        match self {
            Self::Schedule(f) => Ok(f),
            _ => Err(PropError::KindMismatch),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Schedule(freq) => write!(f, "{freq}"),
        }
    }
}

/// Copy `value` into a fixed-capacity string, rejecting overflow.
pub(crate) fn bounded<const N: usize>(value: &str) -> Result<heapless::String<N>, PropError> {
    let mut s = heapless::String::new();
    s.push_str(value).map_err(|()| PropError::TooLong)?;
    Ok(s)
}

// ───────────────────────────────────────────────────────────────
// Metadata
// ───────────────────────────────────────────────────────────────

/// Per-actor bookkeeping: schedule plus sync flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    timing: Timing,
    dirty: bool,
    persist: bool,
}

impl Metadata {
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            timing: Timing::new(frequency),
            dirty: false,
            persist: true,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut Timing {
        &mut self.timing
    }

    /// Mark the actor as having unpushed changes.
    pub fn changed(&mut self) {
        self.dirty = true;
    }

    /// Called by the sync layer once the actor's state has been pushed.
    pub fn clear_changed(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the local file store keeps this actor's properties.
    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }
}

// ───────────────────────────────────────────────────────────────
// Actor capability
// ───────────────────────────────────────────────────────────────

/// A schedulable unit with an ordered property table.
///
/// Implementations keep `props()` stable for their lifetime: indices are
/// used for addressing by the registry and the sync layer.
pub trait Actor {
    fn name(&self) -> &str;

    fn props(&self) -> &'static [PropDescriptor];

    /// Current value of property `index`, `None` when out of range.
    fn get_prop(&self, index: usize) -> Option<PropValue>;

    /// Store a typed value.  Does not touch the dirty flag.
    fn set_prop(&mut self, index: usize, value: PropValue) -> Result<(), PropError>;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// React to a schedule boundary; returns command lines to run in order.
    fn act(&mut self, _now: i64) -> Vec<String> {
        Vec::new()
    }

    fn prop_count(&self) -> usize {
        self.props().len()
    }

    fn prop_index(&self, name: &str) -> Option<usize> {
        self.props().iter().position(|p| p.name == name)
    }

    /// Parse and store a property by name, marking the actor changed.
    fn write_prop(&mut self, name: &str, raw: &str) -> Result<(), PropError> {
        let index = self.prop_index(name).ok_or(PropError::Unknown)?;
        let value = PropValue::parse(self.props()[index].kind, raw)?;
        self.set_prop(index, value)?;
        self.metadata_mut().changed();
        Ok(())
    }
}
