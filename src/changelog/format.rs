use crate::domain::version::VersionEntry;

#[derive(Debug, Clone)]
pub struct FormatLimits {
    /// How many changes are listed before the "...and N more" suffix.
    pub max_changes: usize,
    /// Longer change lines are cut and end with `...`.
    pub max_change_chars: usize,
    pub separator: String,
}

impl Default for FormatLimits {
    fn default() -> Self {
        Self {
            max_changes: 3,
            max_change_chars: 120,
            separator: "\n".to_string(),
        }
    }
}

pub fn format_title(label: &str, entry: &VersionEntry) -> String {
    format!("{label} {} released", entry.version)
}

/// Renders the body of a release notification.
pub fn format_summary(entry: &VersionEntry, limits: &FormatLimits) -> String {
    if entry.changes.is_empty() {
        return format!(
            "New version {} is available. Check the changelog for details.",
            entry.version
        );
    }

    let shown = entry
        .changes
        .iter()
        .take(limits.max_changes)
        .map(|change| truncate(change, limits.max_change_chars))
        .collect::<Vec<_>>();

    let mut message = format!("What's new:\n{}", shown.join(limits.separator.as_str()));

    let remaining = entry.changes.len().saturating_sub(limits.max_changes);
    if remaining > 0 {
        let noun = if remaining == 1 { "change" } else { "changes" };
        message.push_str(&limits.separator);
        message.push_str(&format!("...and {remaining} more {noun}"));
    }
    message
}

fn truncate(change: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";
    if change.chars().count() <= max_chars {
        return change.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut cut: String = change.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(changes: &[&str]) -> VersionEntry {
        let mut entry = VersionEntry::new("1.2.0", "2024-03-01");
        entry.changes = changes.iter().map(|c| c.to_string()).collect();
        entry
    }

    #[test]
    fn empty_changes_use_fixed_sentence() {
        assert_eq!(
            format_summary(&entry(&[]), &FormatLimits::default()),
            "New version 1.2.0 is available. Check the changelog for details."
        );
    }

    #[test]
    fn short_lists_have_no_suffix() {
        let summary = format_summary(&entry(&["A", "B", "C"]), &FormatLimits::default());
        assert_eq!(summary, "What's new:\nA\nB\nC");
    }

    #[test]
    fn long_lists_are_cut_with_remaining_count() {
        let summary = format_summary(&entry(&["A", "B", "C", "D", "E"]), &FormatLimits::default());
        assert_eq!(summary, "What's new:\nA\nB\nC\n...and 2 more changes");
    }

    #[test]
    fn single_remaining_change_is_singular() {
        let limits = FormatLimits {
            max_changes: 2,
            separator: " | ".to_string(),
            ..FormatLimits::default()
        };
        let summary = format_summary(&entry(&["A", "B", "C"]), &limits);
        assert_eq!(summary, "What's new:\nA | B | ...and 1 more change");
    }

    #[test]
    fn truncates_long_change_lines() {
        let limits = FormatLimits {
            max_change_chars: 10,
            ..FormatLimits::default()
        };
        let summary = format_summary(&entry(&["Fix the crash on exit", "Short"]), &limits);
        assert_eq!(summary, "What's new:\nFix the...\nShort");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate("ééééééé", 5), "éé...");
        assert_eq!(truncate("ééééé", 5), "ééééé");
        assert_eq!(truncate("Add a  new thing", 9), "Add a...");
    }

    #[test]
    fn title_names_label_and_version() {
        assert_eq!(format_title("widgets", &entry(&[])), "widgets 1.2.0 released");
    }
}
