use crate::error::AppResult;
use crate::monitor::Monitor;
use crate::workflow::check::CheckOutcome;

pub async fn run(monitor: &Monitor) -> AppResult<()> {
    match monitor.check_now().await? {
        CheckOutcome::Unchanged => println!("No changes since the last check."),
        CheckOutcome::Muted(revision) => println!(
            "Changelog updated ({}), notifications are disabled.",
            revision.short_id()
        ),
        CheckOutcome::NothingToReport(revision) => println!(
            "Changelog updated ({}), but no version entry was found.",
            revision.short_id()
        ),
        CheckOutcome::Notified { entry, revision } => {
            println!("Notified about version {} ({}).", entry.version, entry.date);
            if let Some(url) = &revision.html_url {
                println!("Commit: {url}");
            }
        }
    }
    Ok(())
}

pub async fn run_latest(monitor: &Monitor) -> AppResult<()> {
    let Some(entry) = monitor.latest_version().await? else {
        println!("No version entries found.");
        return Ok(());
    };

    println!("Version {} ({})", entry.version, entry.date);
    if !entry.revision_id.is_empty() {
        println!("Revision: {}", entry.revision_id);
    }
    for change in &entry.changes {
        println!("  - {change}");
    }
    Ok(())
}
