//! Date parsing and formatting for posts, feeds and sitemaps.

use crate::config::Language;
use chrono::{DateTime, NaiveDate, Utc};

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_DE: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Parse a post date: `YYYY-MM-DD`, or an RFC 3339 timestamp.
pub fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Long human-readable date: `June 1, 2024` or `1. Juni 2024`.
pub fn format_long_date(date: NaiveDate, language: Language) -> String {
    use chrono::Datelike;
    let month = date.month0() as usize;
    match language {
        Language::En => format!("{} {}, {}", MONTHS_EN[month], date.day(), date.year()),
        Language::De => format!("{}. {} {}", date.day(), MONTHS_DE[month], date.year()),
    }
}

/// Long form of a raw post date, or the raw text when it does not parse.
pub fn display_post_date(raw: &str, language: Language) -> String {
    parse_post_date(raw)
        .map(|date| format_long_date(date, language))
        .unwrap_or_else(|| raw.trim().to_string())
}

/// RFC 2822 date at midnight UTC, as RSS `pubDate` expects.
pub fn rfc2822_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}

/// RFC 2822 timestamp, as RSS `lastBuildDate` expects.
pub fn rfc2822_timestamp(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `YYYY-MM-DD`, as sitemap `lastmod` expects.
pub fn iso_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
