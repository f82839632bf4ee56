//! System-clock time source.
//!
//! Implements [`ClockSync`] by trusting the platform's wall clock (set by
//! SNTP on ESP-IDF, by the OS on a host).  A reading before 2020-01-01 means
//! the clock was never set and counts as a failed attempt.

use core::time::Duration;

use chrono::Utc;
use log::{info, warn};

use crate::app::ports::{ClockSync, SyncContext};
use crate::timing::humanize;

/// Readings before this instant are treated as "clock not set".
pub const EPOCH_2020: i64 = 1_577_836_800;

const RETRY_DELAY: Duration = Duration::from_secs(1);

fn system_now() -> i64 {
    Utc::now().timestamp()
}

pub struct SystemClockSync {
    source: fn() -> i64,
    retry_delay: Duration,
}

impl Default for SystemClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClockSync {
    pub fn new() -> Self {
        Self {
            source: system_now,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Read epoch seconds from `source` instead of the system clock.
    pub fn with_source(source: fn() -> i64) -> Self {
        Self {
            source,
            retry_delay: Duration::ZERO,
        }
    }
}

impl ClockSync for SystemClockSync {
    fn set_login_pass(&mut self, _user: &str, _pass: &str) {}

    fn sync_clock(&mut self, ctx: &mut SyncContext<'_>, _freeze: bool, attempts: u8) -> bool {
        for attempt in 1..=attempts.max(1) {
            let now = (self.source)();
            if now >= EPOCH_2020 {
                ctx.registry.clock_mut().set_time(now);
                info!("Clock: set to {} (attempt {})", humanize(now), attempt);
                return true;
            }
            warn!("Clock: system time not set (attempt {}/{})", attempt, attempts);
            if attempt < attempts && !self.retry_delay.is_zero() {
                std::thread::sleep(self.retry_delay);
            }
        }
        false
    }
}
