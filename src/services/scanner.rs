//! Library scanner
//!
//! Lists the immediate subdirectories of the movie library. Each directory
//! name is one entry; nothing beneath it is inspected.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Scanner for the top level of a movie library
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    root: PathBuf,
}

impl LibraryScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List entry names in directory enumeration order.
    ///
    /// Any error reading the root yields an empty list so a missing mount
    /// degrades to "no new work".
    pub async fn list_entries(&self) -> Vec<String> {
        info!(path = %self.root.display(), "Scanning movies directory");

        let root = self.root.clone();
        let entries = match tokio::task::spawn_blocking(move || walk_top_level(&root)).await {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!(path = %self.root.display(), error = %e, "Error scanning movies directory");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Library scan task failed");
                return Vec::new();
            }
        };

        info!(count = entries.len(), "Found movie folders");
        entries
    }
}

/// Directory names directly under `root`. Only a failure to read `root`
/// itself is an error; unreadable children are skipped.
fn walk_top_level(root: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable library entry");
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) => entries.push(name.to_string()),
            None => warn!(
                name = %entry.file_name().to_string_lossy(),
                "Skipping folder with a non UTF-8 name"
            ),
        }
    }
    Ok(entries)
}
