//! Diagnostic log buffering with lossy backpressure.
//!
//! Records destined for the remote authority accumulate in a fixed
//! 2 KiB buffer.  The buffer never grows: when a record would not fit, or
//! when a push is prepared above the 80% high-water mark, the oldest
//! 256-byte chunk is dropped (cut at a line break when one exists).
//!
//! A push that fails leaves the buffer as it was; it is retried at the next
//! natural push point (end of a Run cycle, after startup, periodically in
//! Configure mode).
//!
//! The same component owns the verbosity state: a global level and optional
//! per-target overrides (`logo startup:0,cycle:2`).

use core::fmt::{self, Write as _};

use log::Level;

pub const LOG_BUFFER_CAPACITY: usize = 2048;
pub const EVICT_CHUNK: usize = 256;
const HIGH_WATER_PERCENT: usize = 80;
const MAX_TARGET_OPTIONS: usize = 8;
const TARGET_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagError {
    /// Level index outside `0..=3`.
    BadLevel,
    /// Option list is not `target:level[,target:level...]`.
    BadOptions,
    /// More targets than the option table holds.
    TooManyTargets,
}

impl fmt::Display for DiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLevel => write!(f, "level must be 0 (debug) to 3 (error)"),
            Self::BadOptions => write!(f, "expected target:level[,target:level...]"),
            Self::TooManyTargets => write!(f, "too many targets"),
        }
    }
}

/// Map the operator's 0..=3 scale onto `log` levels.
pub fn level_from_index(index: u8) -> Result<Level, DiagError> {
    match index {
        0 => Ok(Level::Debug),
        1 => Ok(Level::Info),
        2 => Ok(Level::Warn),
        3 => Ok(Level::Error),
        _ => Err(DiagError::BadLevel),
    }
}

pub struct Diagnostics {
    buffer: heapless::String<LOG_BUFFER_CAPACITY>,
    level: Level,
    options: heapless::Vec<(heapless::String<TARGET_LEN>, Level), MAX_TARGET_OPTIONS>,
    dropped_bytes: usize,
}

impl Diagnostics {
    pub fn new(level: Level) -> Self {
        Self {
            buffer: heapless::String::new(),
            level,
            options: heapless::Vec::new(),
            dropped_bytes: 0,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Replace the per-target overrides.  `-` or an empty list clears them.
    pub fn set_options(&mut self, spec: &str) -> Result<(), DiagError> {
        let mut options = heapless::Vec::new();
        let spec = spec.trim();
        if !spec.is_empty() && spec != "-" {
            for entry in spec.split(',') {
                let (target, level) = entry.split_once(':').ok_or(DiagError::BadOptions)?;
                let index: u8 = level.trim().parse().map_err(|_| DiagError::BadOptions)?;
                let level = level_from_index(index)?;
                let mut name = heapless::String::new();
                name.push_str(target.trim())
                    .map_err(|()| DiagError::BadOptions)?;
                if name.is_empty() {
                    return Err(DiagError::BadOptions);
                }
                options
                    .push((name, level))
                    .map_err(|_| DiagError::TooManyTargets)?;
            }
        }
        self.options = options;
        Ok(())
    }

    /// Current overrides rendered back as `target:index,...`.
    pub fn options(&self) -> String {
        self.options
            .iter()
            .map(|(t, l)| format!("{}:{}", t, level_index(*l)))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn enabled(&self, level: Level, target: &str) -> bool {
        let threshold = self
            .options
            .iter()
            .find(|(t, _)| t.as_str() == target)
            .map_or(self.level, |(_, l)| *l);
        level <= threshold
    }

    /// Append one formatted record if it passes the filters.
    pub fn record(&mut self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        if !self.enabled(level, target) {
            return;
        }
        let mut line = String::new();
        let _ = write!(line, "{} {}: {}", level_tag(level), target, args);
        truncate_at_char(&mut line, EVICT_CHUNK - 1);
        line.push('\n');

        while self.buffer.len() + line.len() > LOG_BUFFER_CAPACITY {
            self.evict_oldest();
        }
        let _ = self.buffer.push_str(&line);
    }

    /// Apply the high-water policy and expose what should be pushed.
    pub fn prepare_push(&mut self) -> Option<&str> {
        if self.buffer.len() * 100 > LOG_BUFFER_CAPACITY * HIGH_WATER_PERCENT {
            self.evict_oldest();
        }
        (!self.buffer.is_empty()).then_some(self.buffer.as_str())
    }

    /// Forget everything pushed so far.  Call only after a successful push.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes lost to backpressure since boot.
    pub fn dropped_bytes(&self) -> usize {
        self.dropped_bytes
    }

    fn evict_oldest(&mut self) {
        let mut cut = EVICT_CHUNK.min(self.buffer.len());
        while !self.buffer.is_char_boundary(cut) {
            cut -= 1;
        }
        if let Some(newline) = self.buffer[..cut].rfind('\n') {
            cut = newline + 1;
        }
        if cut == 0 {
            return;
        }
        let mut rest = heapless::String::new();
        let _ = rest.push_str(&self.buffer[cut..]);
        self.buffer = rest;
        self.dropped_bytes += cut;
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

fn level_index(level: Level) -> u8 {
    match level {
        Level::Trace | Level::Debug => 0,
        Level::Info => 1,
        Level::Warn => 2,
        Level::Error => 3,
    }
}

fn truncate_at_char(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
