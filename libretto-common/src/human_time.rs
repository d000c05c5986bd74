//! Human-readable elapsed-time formatting
//!
//! Provides consistent elapsed-duration display across Libretto log output.

use std::time::Duration;

/// Elapsed display format selection thresholds (milliseconds)
const MILLIS_FORMAT_MAX: u128 = 1_000; // < 1s → Xms
const SECONDS_FORMAT_MAX: u128 = 100_000; // < 100s → X.XXs
                                          // >= 100s → M:SS

/// Format an elapsed duration for log and response output.
///
/// - Sub-second durations render as whole milliseconds (`450ms`)
/// - Durations under 100 seconds render as fractional seconds (`2.35s`)
/// - Longer durations render as minutes and seconds (`2:05`)
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use libretto_common::human_time::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_millis(450)), "450ms");
/// assert_eq!(format_elapsed(Duration::from_millis(2350)), "2.35s");
/// assert_eq!(format_elapsed(Duration::from_secs(125)), "2:05");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();

    if millis < MILLIS_FORMAT_MAX {
        format!("{}ms", millis)
    } else if millis < SECONDS_FORMAT_MAX {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        let total_secs = elapsed.as_secs();
        format!("{}:{:02}", total_secs / 60, total_secs % 60)
    }
}
