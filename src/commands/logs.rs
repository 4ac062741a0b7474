//! Display recent log entries from the application.

use crate::logging;
use anyhow::anyhow;
use std::fs;

/// Prints the last `lines` lines of the newest log file.
///
/// # Errors
/// - If the log directory cannot be determined or read
/// - If the log file cannot be read
pub fn handle_logs(lines: usize) -> anyhow::Result<()> {
    let log_dir = logging::log_dir()?;

    if !log_dir.exists() {
        println!("Log directory does not exist yet: {}", log_dir.display());
        println!("Logs will be created when the application runs.");
        return Ok(());
    }

    let Some(log_file) = logging::log_files(&log_dir)?.into_iter().next() else {
        println!("No log files found in: {}", log_dir.display());
        println!("Run 'voxmemo' or other commands to generate logs.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;
    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let all: Vec<&str> = content.lines().collect();
    let shown = tail(&all, lines);
    if shown.len() < all.len() {
        println!("Showing last {} of {} lines:", shown.len(), all.len());
    } else {
        println!("Showing all {} lines:", all.len());
    }
    println!("Full log file at: {}", log_file.display());
    println!();

    for line in shown {
        println!("{line}");
    }

    Ok(())
}

fn tail<'a>(lines: &'a [&'a str], count: usize) -> &'a [&'a str] {
    &lines[lines.len().saturating_sub(count)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        let lines = ["a", "b", "c"];
        assert_eq!(tail(&lines, 2), &["b", "c"]);
        assert_eq!(tail(&lines, 10), &["a", "b", "c"]);
        assert!(tail(&lines, 0).is_empty());
    }
}
