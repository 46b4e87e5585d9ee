use chrono::{DateTime, Local, TimeZone};
use std::time::Duration;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Binary-prefixed size, two decimals above one kilobyte.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} B", bytes),
        _ => format!("{:.2} {}", value, UNITS[unit]),
    }
}

/// Wall-clock span for run logs: `H:MM:SS` once past an hour, seconds with millis below a minute.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}.{:03}s", s, elapsed.subsec_millis()),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, s) => format!("{}:{:02}:{:02}", h, m, s),
    }
}

pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let local: DateTime<Local> = dt.with_timezone(&Local);
    local.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
