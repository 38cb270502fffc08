//! Utility functions
//!
//! Small helpers shared by the progress log lines.

use std::time::Duration;

/// Format an elapsed duration for logging: sub-minute durations as fractional
/// seconds, longer ones as minutes and seconds.
#[inline]
pub fn format_elapsed(dur: Duration) -> String {
    let secs = dur.as_secs();
    if secs >= 60 {
        format!("{} min {} sec", secs / 60, secs % 60)
    } else {
        format!("{:.2} sec", dur.as_secs_f64())
    }
}
