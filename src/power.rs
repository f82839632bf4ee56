//! Sleep-duration arithmetic.
//!
//! The batch schedule decides when the whole device wakes.  The device can
//! end a cycle either late (just past a boundary) or early (just before the
//! next one, typically because its clock runs fast relative to the
//! schedule):
//!
//! ```text
//!            from            to
//!   ──|───────────●──────────────────|──────────────|──▶ t
//!     b0         now                 b1             b2
//!
//!   to >= from  (behind)  sleep = to                → wake at b1
//!   to <  from  (ahead)   sleep = to + to'          → skip b1, wake near b2
//!                         to' measured from b1 + 1
//! ```
//!
//! Only one extra boundary is ever added.

use crate::timing::Timing;

/// Seconds to deep-sleep from `batch.current_time()`, bounded by `cap`.
pub fn deep_sleep_secs(batch: &Timing, cap: i64) -> i64 {
    let to = batch.secs_to_match(cap);
    let from = batch.secs_from_match(cap);
    if to < from {
        let mut after = *batch;
        after.set_current_time(batch.current_time().saturating_add(to).saturating_add(1));
        to.saturating_add(after.secs_to_match(cap)).min(cap)
    } else {
        to
    }
}

/// Seconds to sleep interruptibly until the next batch boundary.
pub fn bounded_sleep_secs(batch: &Timing, cap: i64) -> i64 {
    batch.secs_to_match(cap)
}
