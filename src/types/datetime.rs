// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Date-time parsing and formatting for `DateTime` items.
//!
//! openHAB reports date-times in a few shapes depending on version and
//! binding. Parsing is permissive; formatting always produces the canonical
//! ISO 8601 form openHAB accepts, truncated to milliseconds.
//!
//! # Supported Formats
//!
//! - RFC 3339: `"2024-01-15T10:30:00.123+01:00"`
//! - openHAB offset without colon: `"2020-12-04T15:53:33.968+0100"`
//! - ISO 8601 without timezone (read as UTC): `"2024-01-15T10:30:00"`
//! - Unix epoch seconds: `"1705318200"`
//! - Unix epoch milliseconds: `"1705318200000"`

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Output format: ISO 8601 with millisecond precision and a colon offset.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Offset formats tried after RFC 3339.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Formats tried for timestamps without an offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a date-time string in any supported format.
///
/// Returns `None` if no format matches.
///
/// # Examples
///
/// ```
/// use openhab_items::types::datetime;
///
/// let dt = datetime::parse("2020-12-04T15:53:33.968+0100").unwrap();
/// assert_eq!(datetime::format(&dt), "2020-12-04T15:53:33.968+01:00");
/// ```
#[must_use]
pub fn parse(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit())
        && let Some(dt) = parse_epoch(s)
    {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for fmt in &OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Formats a date-time as ISO 8601 truncated to milliseconds.
#[must_use]
pub fn format(dt: &DateTime<FixedOffset>) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Parses a Unix epoch timestamp (seconds or milliseconds).
fn parse_epoch(s: &str) -> Option<DateTime<FixedOffset>> {
    let timestamp: i64 = s.parse().ok()?;

    // Seconds have at most 10 digits until the year 2286
    let datetime = if timestamp > 9_999_999_999 {
        DateTime::from_timestamp_millis(timestamp)?
    } else {
        DateTime::from_timestamp(timestamp, 0)?
    };

    Some(datetime.fixed_offset())
}
