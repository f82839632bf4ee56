//! Clock-aligned schedules and catch-up accounting.
//!
//! A [`Timing`] pairs the last instant an actor has been accounted up to
//! with a [`Frequency`].  Boundaries are aligned to the Unix epoch (UTC), so
//! two devices with the same frequency wake on the same instants.
//!
//! ```text
//!   frequency     boundaries
//!   ─────────     ──────────────────────────────────────────
//!   never         (none)
//!   60s / ~60s    ..., 0, 60, 120, ...   (multiples of period)
//!   @0 */15 *     every quarter hour, on the second 0
//! ```
//!
//! [`Timing::catches_up`] consumes one boundary per `true`, so a caller that
//! loops on it replays every tick owed since the last cycle.

use core::fmt;
use core::str::FromStr;

use chrono::DateTime;

use crate::error::TimingError;

pub const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

// ═══════════════════════════════════════════════════════════════
//  Frequency
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const fn secs(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => SECS_PER_MINUTE,
            Self::Hours => SECS_PER_HOUR,
            Self::Days => SECS_PER_DAY,
        }
    }

    const fn suffix(self) -> char {
        match self {
            Self::Seconds => 's',
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Seconds),
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            _ => None,
        }
    }
}

/// One field of a time-of-day pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `*`
    Any,
    /// `N`
    At(u8),
    /// `*/N`
    Every(u8),
}

impl Field {
    fn accepts(self, value: u8) -> bool {
        match self {
            Self::Any => true,
            Self::At(v) => v == value,
            Self::Every(n) => value % n == 0,
        }
    }

    /// Parse a field whose values live in `0..limit`.
    fn parse(s: &str, limit: u8) -> Result<Self, TimingError> {
        if s == "*" {
            return Ok(Self::Any);
        }
        if let Some(step) = s.strip_prefix("*/") {
            let n: u8 = step.parse().map_err(|_| TimingError::BadPattern)?;
            if n == 0 {
                return Err(TimingError::ZeroPeriod);
            }
            if n >= limit {
                return Err(TimingError::BadPattern);
            }
            return Ok(Self::Every(n));
        }
        let v: u8 = s.parse().map_err(|_| TimingError::BadPattern)?;
        if v >= limit {
            return Err(TimingError::BadPattern);
        }
        Ok(Self::At(v))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::At(v) => write!(f, "{v}"),
            Self::Every(n) => write!(f, "*/{n}"),
        }
    }
}

/// Daily pattern `@<second> <minute> <hour>` evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub second: Field,
    pub minute: Field,
    pub hour: Field,
}

impl TimeOfDay {
    /// First matching instant strictly after `t`.
    ///
    /// Every valid field accepts at least one value, so a match always
    /// exists within the next day.
    fn next_after(&self, t: i64) -> i64 {
        let day = t.div_euclid(SECS_PER_DAY);
        for d in day..=day.saturating_add(1) {
            let day_base = d.saturating_mul(SECS_PER_DAY);
            for h in 0..24u8 {
                let hour_base = day_base.saturating_add(i64::from(h) * SECS_PER_HOUR);
                if !self.hour.accepts(h) || hour_base.saturating_add(SECS_PER_HOUR - 1) <= t {
                    continue;
                }
                for m in 0..60u8 {
                    let minute_base = hour_base.saturating_add(i64::from(m) * SECS_PER_MINUTE);
                    if !self.minute.accepts(m)
                        || minute_base.saturating_add(SECS_PER_MINUTE - 1) <= t
                    {
                        continue;
                    }
                    for s in 0..60u8 {
                        let candidate = minute_base.saturating_add(i64::from(s));
                        if self.second.accepts(s) && candidate > t {
                            return candidate;
                        }
                    }
                }
            }
        }
        t.saturating_add(SECS_PER_DAY)
    }

    /// Latest matching instant at or before `t`.
    fn last_at_or_before(&self, t: i64) -> i64 {
        let day = t.div_euclid(SECS_PER_DAY);
        for d in (day.saturating_sub(1)..=day).rev() {
            let day_base = d.saturating_mul(SECS_PER_DAY);
            for h in (0..24u8).rev() {
                let hour_base = day_base.saturating_add(i64::from(h) * SECS_PER_HOUR);
                if !self.hour.accepts(h) || hour_base > t {
                    continue;
                }
                for m in (0..60u8).rev() {
                    let minute_base = hour_base.saturating_add(i64::from(m) * SECS_PER_MINUTE);
                    if !self.minute.accepts(m) || minute_base > t {
                        continue;
                    }
                    for s in (0..60u8).rev() {
                        let candidate = minute_base.saturating_add(i64::from(s));
                        if self.second.accepts(s) && candidate <= t {
                            return candidate;
                        }
                    }
                }
            }
        }
        t.saturating_sub(SECS_PER_DAY)
    }
}

/// How often a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Never,
    /// `N<unit>` or, when `approx`, `~N<unit>`.
    Period {
        count: u32,
        unit: TimeUnit,
        approx: bool,
    },
    TimeOfDay(TimeOfDay),
}

impl Frequency {
    /// Length of one period in seconds, for periodic frequencies.
    pub fn period_secs(&self) -> Option<i64> {
        match self {
            Self::Period { count, unit, .. } => Some(i64::from(*count) * unit.secs()),
            _ => None,
        }
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self, Self::Period { approx: true, .. })
    }

    /// First boundary strictly after `t`, or `None` if there is none.
    pub fn next_after(&self, t: i64) -> Option<i64> {
        match self {
            Self::Never => None,
            Self::Period { .. } => {
                let p = self.period_secs()?;
                t.div_euclid(p).checked_add(1)?.checked_mul(p)
            }
            Self::TimeOfDay(tod) => Some(tod.next_after(t)),
        }
    }

    /// Latest boundary at or before `t`, or `None` if there is none.
    pub fn last_at_or_before(&self, t: i64) -> Option<i64> {
        match self {
            Self::Never => None,
            Self::Period { .. } => {
                let p = self.period_secs()?;
                t.div_euclid(p).checked_mul(p)
            }
            Self::TimeOfDay(tod) => Some(tod.last_at_or_before(t)),
        }
    }
}

impl FromStr for Frequency {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("never") {
            return Ok(Self::Never);
        }

        if let Some(pattern) = s.strip_prefix('@') {
            let fields: Vec<&str> = pattern.split_whitespace().collect();
            let [second, minute, hour] = fields.as_slice() else {
                return Err(TimingError::BadPattern);
            };
            return Ok(Self::TimeOfDay(TimeOfDay {
                second: Field::parse(second, 60)?,
                minute: Field::parse(minute, 60)?,
                hour: Field::parse(hour, 24)?,
            }));
        }

        let (approx, body) = match s.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let suffix = body.chars().last().ok_or(TimingError::BadCount)?;
        let unit = TimeUnit::from_suffix(suffix).ok_or(TimingError::BadUnit)?;
        let digits = &body[..body.len() - suffix.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimingError::BadCount);
        }
        let count: u32 = digits.parse().map_err(|_| TimingError::Overflow)?;
        if count == 0 {
            return Err(TimingError::ZeroPeriod);
        }
        Ok(Self::Period {
            count,
            unit,
            approx,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Period {
                count,
                unit,
                approx,
            } => {
                if *approx {
                    write!(f, "~")?;
                }
                write!(f, "{}{}", count, unit.suffix())
            }
            Self::TimeOfDay(tod) => write!(f, "@{} {} {}", tod.second, tod.minute, tod.hour),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Timing
// ═══════════════════════════════════════════════════════════════

/// A frequency plus the instant it has been accounted up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    current_time: i64,
    frequency: Frequency,
}

impl Timing {
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            current_time: 0,
            frequency,
        }
    }

    pub const fn with_time(frequency: Frequency, current_time: i64) -> Self {
        Self {
            current_time,
            frequency,
        }
    }

    pub const fn current_time(&self) -> i64 {
        self.current_time
    }

    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
    }

    /// Re-anchor the bookkeeping.  Unlike catch-up this may move backwards.
    pub fn set_current_time(&mut self, t: i64) {
        self.current_time = t;
    }

    /// Whether the current instant sits on a boundary.
    ///
    /// Approximate frequencies accept anything within a half-period window
    /// centred on the boundary.
    pub fn matches(&self) -> bool {
        match self.frequency {
            Frequency::Never => false,
            Frequency::Period { approx: true, .. } => {
                let Some(p) = self.frequency.period_secs() else {
                    return false;
                };
                let offset = self.current_time.rem_euclid(p);
                offset.min(p - offset) <= p / 4
            }
            _ => self.frequency.last_at_or_before(self.current_time) == Some(self.current_time),
        }
    }

    /// Consume the next unconsumed boundary if it is at or before `t`.
    ///
    /// Returns `true` once per boundary crossed; when no boundary is owed
    /// the bookkeeping moves forward to `t` and `false` is returned.
    pub fn catches_up(&mut self, t: i64) -> bool {
        match self.frequency.next_after(self.current_time) {
            Some(next) if next <= t => {
                self.current_time = next;
                true
            }
            _ => {
                if t > self.current_time {
                    self.current_time = t;
                }
                false
            }
        }
    }

    /// Seconds until the next boundary strictly in the future, capped.
    pub fn secs_to_match(&self, cap: i64) -> i64 {
        self.frequency
            .next_after(self.current_time)
            .map_or(cap, |next| next.saturating_sub(self.current_time).min(cap))
    }

    /// Seconds since the latest boundary at or before now, capped.
    pub fn secs_from_match(&self, cap: i64) -> i64 {
        self.frequency
            .last_at_or_before(self.current_time)
            .map_or(cap, |last| self.current_time.saturating_sub(last).min(cap))
    }
}

/// Render an epoch instant as `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn humanize(t: i64) -> String {
    DateTime::from_timestamp(t, 0).map_or_else(
        || t.to_string(),
        |dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
    )
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
