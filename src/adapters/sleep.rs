//! Uptime, sleep and console input.
//!
//! [`ConsoleSleep`] implements [`SleepClock`]:
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`, deep
//!   sleep through `esp_deep_sleep()` (the chip restarts on wake).
//! - **`not(target_os = "espidf")`**: uptime from `std::time::Instant`;
//!   deep sleep logs and returns so the caller can exit.
//!
//! Console lines arrive on an `mpsc` channel fed by a reader thread
//! ([`spawn_stdin_reader`]).  An interruptible sleep wakes as soon as a line
//! arrives and keeps it queued for [`SleepClock::pending_command`].

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::SleepClock;

/// Longest single wait, so the deadline is re-checked regularly.
const POLL_SLICE: Duration = Duration::from_secs(1);

pub struct ConsoleSleep {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    commands: Receiver<String>,
    pending: VecDeque<String>,
}

impl ConsoleSleep {
    pub fn new(commands: Receiver<String>) -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            commands,
            pending: VecDeque::new(),
        }
    }
}

impl SleepClock for ConsoleSleep {
    #[cfg(target_os = "espidf")]
    fn uptime_secs(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    fn sleep_interruptible(&mut self, cycle_start: u64, secs: u64) -> bool {
        let deadline = cycle_start.saturating_add(secs);
        loop {
            if !self.pending.is_empty() {
                return true;
            }
            let now = self.uptime_secs();
            if now >= deadline {
                return false;
            }
            let wait = Duration::from_secs(deadline - now).min(POLL_SLICE);
            match self.commands.recv_timeout(wait) {
                Ok(line) => {
                    debug!("ConsoleSleep: woken by input");
                    self.pending.push_back(line);
                    return true;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(wait);
                }
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn deep_sleep(&mut self, cycle_start: u64, secs: u64) {
        let remaining = cycle_start.saturating_add(secs).saturating_sub(self.uptime_secs());
        info!("Entering deep sleep for {}s", remaining.max(1));
        // SAFETY: called from the main task; the chip resets on wake.
        unsafe { esp_idf_svc::sys::esp_deep_sleep(remaining.max(1) * 1_000_000) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn deep_sleep(&mut self, cycle_start: u64, secs: u64) {
        let remaining = cycle_start.saturating_add(secs).saturating_sub(self.uptime_secs());
        info!("Deep sleep for {}s requested (host: not sleeping)", remaining);
    }

    fn pending_command(&mut self) -> Option<String> {
        self.pending
            .pop_front()
            .or_else(|| self.commands.try_recv().ok())
    }
}

/// Forward stdin lines into a channel until EOF.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Console reader not started: {}", e);
    }
    rx
}
