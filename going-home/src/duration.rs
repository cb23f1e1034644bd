//! Compact human-readable durations.

/// Units in decreasing size, with the letter used when rendering them.
const UNITS: [(char, u64); 6] = [
    ('y', 365 * 24 * 60 * 60),
    ('w', 7 * 24 * 60 * 60),
    ('d', 24 * 60 * 60),
    ('h', 60 * 60),
    ('m', 60),
    ('s', 1),
];

/// Format a number of seconds as e.g. `"1d 1h 1m 1s"`.
///
/// Units with a zero count are omitted, so `0` formats as the empty string.
/// Values are truncated, never rounded.
pub fn format_duration(total_secs: u64) -> String {
    let mut remaining = total_secs;
    let mut parts = Vec::new();

    for (letter, unit_secs) in UNITS {
        let count = remaining / unit_secs;
        if count > 0 {
            remaining -= count * unit_secs;
            parts.push(format!("{count}{letter}"));
        }
    }

    parts.join(" ")
}
