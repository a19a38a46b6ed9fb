//! Duration formatting helpers.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Split a duration in seconds into `(days, hours, minutes, seconds)`.
pub fn split_duration(secs: u64) -> (u64, u64, u64, u64) {
    (
        secs / DAY,
        (secs % DAY) / HOUR,
        (secs % HOUR) / MINUTE,
        secs % MINUTE,
    )
}

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    let (d, h, m, s) = split_duration(secs);
    if secs < MINUTE {
        format!("{}s", s)
    } else if secs < HOUR {
        format!("{}m {}s", m, s)
    } else if secs < DAY {
        format!("{}h {}m {}s", h, m, s)
    } else {
        format!("{}d {}h {}m {}s", d, h, m, s)
    }
}
