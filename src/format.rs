//! Small formatting helpers used by the video and playlist cards.
//!
//! The outputs here end up verbatim in the generated pages, so the rounding
//! and truncation rules are deliberately fixed: durations truncate to whole
//! seconds, sizes round to one decimal, view counts truncate.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

/// `strftime` pattern for card dates, e.g. `Jan 05, 2023 14:30`.
pub const DATE_FORMAT: &str = "%b %d, %Y %H:%M";

const SIZE_UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Renders durations as `H:MM:SS`, or `M:SS` when under an hour.
pub fn human_readable_time(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0) as u64;
    let (minutes, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Renders a byte count in the largest binary unit up to GiB, one decimal.
pub fn human_readable_size(size_bytes: u64) -> String {
    let mut power = 0;
    while power + 1 < SIZE_UNITS.len() && size_bytes >= 1024_u64.pow(power as u32 + 1) {
        power += 1;
    }
    let scaled = size_bytes as f64 / 1024_f64.powi(power as i32);
    let rounded = (scaled * 10.0).round_ties_even() / 10.0;
    format!("{rounded:.1} {}", SIZE_UNITS[power])
}

/// Compact view count: `9999`, `12K`, `2.3M`. Zero renders as nothing.
pub fn human_readable_views(views: u64) -> String {
    match views {
        0 => String::new(),
        1..=9_999 => views.to_string(),
        10_000..=999_999 => format!("{}K", views / 1_000),
        _ => {
            let tenths = views / 100_000;
            format!("{}.{}M", tenths / 10, tenths % 10)
        }
    }
}

/// The `views` slot of a video card; omitted entirely for unknown counts.
pub fn view_count_label(views: u64) -> String {
    match views {
        0 => String::new(),
        _ => format!("{} views", human_readable_views(views)),
    }
}

/// Whole-second epoch timestamp used for client-side sorting.
pub fn raw_timestamp(mtime: f64) -> String {
    (mtime.floor() as i64).to_string()
}

/// Formats an epoch timestamp in the given time zone.
pub fn format_date<Tz>(mtime: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::<Utc>::from_timestamp(mtime.floor() as i64, 0)
        .map(|utc| utc.with_timezone(tz).format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Card dates are shown in the machine's local time zone.
pub fn format_local_date(mtime: f64) -> String {
    format_date(mtime, &Local)
}

/// Percent-encodes every path segment, leaving the `/` separators intact.
pub fn quote_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds an attribute-safe, site-absolute link to `path`.
///
/// The path is URL-encoded first and HTML-escaped second. An empty path
/// yields an empty link rather than a link to the site root.
pub fn href(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let rooted = if path.starts_with('/') {
        quote_path(path)
    } else {
        quote_path(&format!("/{path}"))
    };
    html_escape::encode_quoted_attribute(&rooted).into_owned()
}

pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// File name of the page generated for a playlist title. The output folder
/// is flat, so path separators in titles are replaced.
pub fn page_file_name(title: &str) -> String {
    format!("{}.html", title.replace('/', "_"))
}
