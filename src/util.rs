use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

// The reference time in a TWCC report counts from an epoch only the remote
// side knows, so the absolute base of reconstructed arrival times is
// arbitrary. What works against us is that Instant can't represent a
// constant like UNIX EPOCH, so we freeze a "beginning of time" once per
// process and offset everything from that.
static BEGINNING_OF_TIME: Lazy<Instant> = Lazy::new(|| {
    let now = Instant::now();

    // Find an Instant in the past which is up to an hour back.
    let mut secs = 3600;
    loop {
        let dur = Duration::from_secs(secs);
        if let Some(v) = now.checked_sub(dur) {
            break v;
        }
        secs -= 1;
        if secs == 0 {
            break now;
        }
    }
});

/// The instant all reconstructed arrival times are offset from.
///
/// Arrival times in [`Acknowledgment`][crate::Acknowledgment] are only
/// meaningful relative to each other; this is the fixed point they are
/// expressed against.
pub fn already_happened() -> Instant {
    *BEGINNING_OF_TIME
}
