use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::domain::version::VersionEntry;

// "## v1.2.3 - 2023-12-01" or "# Version 1.2.3"
static VERSION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#+\s*(?:v?([0-9]+\.[0-9]+\.[0-9]+)|Version\s+([0-9]+\.[0-9]+\.[0-9]+))")
        .expect("version header pattern is valid")
});

static HEADER_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4}-[0-9]{2}-[0-9]{2})").expect("date pattern is valid"));

/// Parses changelog text using today's local date for undated headers.
pub fn parse_changelog(text: &str) -> Vec<VersionEntry> {
    parse_changelog_on(text, Local::now().date_naive())
}

/// Splits `text` into version entries in document order.
///
/// Only `-` bullets under a version header are collected; everything else is
/// skipped. A version seen twice keeps its first (newest) section.
pub fn parse_changelog_on(text: &str, today: NaiveDate) -> Vec<VersionEntry> {
    let default_date = today.format("%Y-%m-%d").to_string();
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<VersionEntry> = None;

    for line in text.lines() {
        if let Some(version) = header_version(line) {
            flush(&mut entries, &mut seen, current.take());
            let date = HEADER_DATE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| default_date.clone());
            current = Some(VersionEntry::new(version, date));
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        if let Some(bullet) = line.trim().strip_prefix('-') {
            entry.changes.push(bullet.trim().to_string());
        }
    }
    flush(&mut entries, &mut seen, current);

    entries
}

/// The newest entry, assuming the usual newest-first ordering.
pub fn latest_entry(text: &str) -> Option<VersionEntry> {
    parse_changelog(text).into_iter().next()
}

fn header_version(line: &str) -> Option<&str> {
    let caps = VERSION_HEADER.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

fn flush(entries: &mut Vec<VersionEntry>, seen: &mut HashSet<String>, entry: Option<VersionEntry>) {
    let Some(entry) = entry else {
        return;
    };
    if entry.version.is_empty() || !seen.insert(entry.version.clone()) {
        return;
    }
    entries.push(entry);
}
