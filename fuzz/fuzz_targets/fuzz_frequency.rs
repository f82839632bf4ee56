//! Fuzz target: `Frequency` parsing
//!
//! Parses arbitrary strings as schedules and exercises the accepted ones.
//!
//! Invariants checked:
//! - No panics under any input
//! - Anything accepted renders back to a string that parses to the same value
//! - Periods are never zero
//! - `catches_up` never commits more boundaries than `floor(elapsed / period)`
//!
//! cargo fuzz run fuzz_frequency

#![no_main]

use devcycle::timing::{Frequency, Timing};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(freq) = text.parse::<Frequency>() else {
        return;
    };

    let rendered = freq.to_string();
    assert_eq!(rendered.parse::<Frequency>().ok(), Some(freq));

    if let Some(period) = freq.period_secs() {
        assert!(period > 0);
        let mut timing = Timing::with_time(freq, 0);
        let now = period.saturating_mul(3).min(1_000_000);
        let mut fired = 0;
        while timing.catches_up(now) && fired < 10 {
            fired += 1;
        }
        assert!(fired <= now / period);
    }
});
