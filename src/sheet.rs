//! Findings spreadsheet download
//!
//! Authenticated visitors can save their session's findings as a spreadsheet.
//! The backend builds the file; this module only names it and writes it out.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};

/// Notification shown when the spreadsheet has been written.
pub const DOWNLOAD_TOAST: &str = "Sheet downloaded successfully.";

/// `<name with spaces replaced by underscores>-YYYY-MM-DD_HH-MM-SS.xlsx`
pub fn file_name(display_name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}-{}.xlsx",
        display_name.replace(' ', "_"),
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Write the spreadsheet bytes under `dir`, returning the full path.
pub async fn save(dir: &Path, display_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(file_name(display_name, Local::now()));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
