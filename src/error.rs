//! Unified error types for the orchestrator core.
//!
//! A single `Error` enum that every subsystem converts into, so command
//! handlers and the startup sequence report failures uniformly.  All
//! variants are `Copy` and carry no heap data.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible core operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A schedule expression was rejected.
    Timing(TimingError),
    /// A property read or write failed.
    Prop(PropError),
    /// An actor lookup or registration failed.
    Registry(RegistryError),
    /// A persisted property document could not be decoded.
    Document(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timing(e) => write!(f, "timing: {e}"),
            Self::Prop(e) => write!(f, "property: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Document(msg) => write!(f, "document: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Timing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    /// A period of zero length can never advance.
    ZeroPeriod,
    /// Unknown unit suffix (expected `s`, `m`, `h` or `d`).
    BadUnit,
    /// The count is missing or not a number.
    BadCount,
    /// Period does not fit in the supported range.
    Overflow,
    /// Time-of-day pattern is malformed or a field is out of range.
    BadPattern,
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPeriod => write!(f, "zero-length period"),
            Self::BadUnit => write!(f, "unknown unit"),
            Self::BadCount => write!(f, "invalid count"),
            Self::Overflow => write!(f, "period too large"),
            Self::BadPattern => write!(f, "invalid time-of-day pattern"),
        }
    }
}

impl From<TimingError> for Error {
    fn from(e: TimingError) -> Self {
        Self::Timing(e)
    }
}

// ---------------------------------------------------------------------------
// Property errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropError {
    /// No property with that name or index.
    Unknown,
    /// Value kind does not match the declared property kind.
    KindMismatch,
    /// Boolean value not recognised.
    BadBoolean,
    /// Integer value not recognised.
    BadInteger,
    /// Schedule value rejected.
    Schedule(TimingError),
    /// String exceeds the property's fixed capacity.
    TooLong,
    /// Number outside the property's accepted range.
    OutOfRange,
}

impl fmt::Display for PropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown property"),
            Self::KindMismatch => write!(f, "value kind mismatch"),
            Self::BadBoolean => write!(f, "expected true/false"),
            Self::BadInteger => write!(f, "expected an integer"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::TooLong => write!(f, "value too long"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl From<TimingError> for PropError {
    fn from(e: TimingError) -> Self {
        Self::Schedule(e)
    }
}

impl From<PropError> for Error {
    fn from(e: PropError) -> Self {
        Self::Prop(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    UnknownActor,
    DuplicateActor,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownActor => write!(f, "unknown actor"),
            Self::DuplicateActor => write!(f, "actor name already registered"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
