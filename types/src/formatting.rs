//! Number and duration formatting for reports.
//!
//! Replay summaries and log lines format dwell times and compliance ratios
//! through this module so every consumer renders them the same way, including
//! European-style decimals (swapping `.` and `,`).

/// Swap `.` and `,` in a formatted number.
fn europeanize(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '.' => result.push(','),
            ',' => result.push('.'),
            _ => result.push(c),
        }
    }
    result
}

#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european {
        europeanize(&s)
    } else {
        s
    }
}

/// Format a dwell time for display.
///
/// - Values >= 60s: `M:SS`
/// - Values >= 10s: whole seconds with `s` suffix
/// - Values < 10s: two decimals with `s` suffix (sub-second visits matter here)
/// - Negative values clamp to zero
///
/// # Examples
/// ```
/// use hygiene_types::formatting::format_dwell;
/// assert_eq!(format_dwell(0.1, false), "0.10s");
/// assert_eq!(format_dwell(0.1, true), "0,10s");
/// assert_eq!(format_dwell(15.4, false), "15s");
/// assert_eq!(format_dwell(75.3, false), "1:15");
/// ```
pub fn format_dwell(secs: f64, european: bool) -> String {
    let secs = secs.max(0.0);
    if secs >= 60.0 {
        format_duration(secs.floor() as i64)
    } else if secs >= 10.0 {
        format!("{:.0}s", secs)
    } else {
        maybe_eu(format!("{:.2}s", secs), european)
    }
}

/// Format a duration as `M:SS`.
///
/// # Examples
/// ```
/// use hygiene_types::formatting::format_duration;
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(0), "0:00");
/// ```
pub fn format_duration(secs: i64) -> String {
    let mins = secs / 60;
    let secs = secs % 60;
    format!("{}:{:02}", mins, secs)
}

/// Format a percentage value with 1 decimal place.
pub fn format_pct(n: f64, european: bool) -> String {
    maybe_eu(format!("{:.1}%", n), european)
}

/// Format a percentage from count/total.
///
/// Returns `"0%"` if total is zero.
///
/// # Examples
/// ```
/// use hygiene_types::formatting::format_pct_ratio;
/// assert_eq!(format_pct_ratio(3, 10, false), "30.0%");
/// assert_eq!(format_pct_ratio(0, 0, false), "0%");
/// ```
pub fn format_pct_ratio(count: u64, total: u64, european: bool) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format_pct(count as f64 / total as f64 * 100.0, european)
}

/// Format a count with thousands separators (`1,234,567` or `1.234.567`).
///
/// # Examples
/// ```
/// use hygiene_types::formatting::format_count;
/// assert_eq!(format_count(0, false), "0");
/// assert_eq!(format_count(1_500_000, false), "1,500,000");
/// assert_eq!(format_count(1_500, true), "1.500");
/// ```
pub fn format_count(n: u64, european: bool) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    maybe_eu(result, european)
}
