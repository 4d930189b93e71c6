//! Completion ledger
//!
//! Durable record of which entries have been fully processed. Each processed
//! entry owns one `{name}.checked` marker file holding the completion
//! timestamp. Markers are only ever created; nothing in this crate removes
//! them.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};

/// File extension for completion markers
pub const MARKER_EXTENSION: &str = "checked";

/// Distinguishes concurrent temp files within one process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Marker-file backed record of processed entries
#[derive(Debug, Clone)]
pub struct CompletionLedger {
    dir: PathBuf,
}

impl CompletionLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the ledger directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create ledger directory {}", self.dir.display()))
    }

    fn marker_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            bail!("Invalid entry name for a marker: {name:?}");
        }
        Ok(self.dir.join(format!("{name}.{MARKER_EXTENSION}")))
    }

    /// Whether a marker exists for `name`
    pub async fn is_complete(&self, name: &str) -> bool {
        match self.marker_path(name) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or_else(|e| {
                warn!(entry = %name, error = %e, "Error checking completion marker");
                false
            }),
            Err(_) => false,
        }
    }

    /// Names of every entry that has a marker. Unreadable ledgers yield an
    /// empty set.
    pub async fn list_completed(&self) -> HashSet<String> {
        match self.read_markers().await {
            Ok(completed) => {
                info!(count = completed.len(), "Found already checked movies");
                completed
            }
            Err(e) => {
                warn!(path = %self.dir.display(), error = %e, "Error reading checked directory");
                HashSet::new()
            }
        }
    }

    async fn read_markers(&self) -> Result<HashSet<String>> {
        let mut completed = HashSet::new();
        let mut dir = fs::read_dir(&self.dir).await?;
        let suffix = format!(".{MARKER_EXTENSION}");

        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(&suffix)
                && !name.is_empty()
            {
                completed.insert(name.to_string());
            }
        }

        Ok(completed)
    }

    /// Write the marker for `name`. Failures are logged and reported as
    /// `false`; the entry is simply reconsidered on the next pass.
    pub async fn mark_complete(&self, name: &str) -> bool {
        match self.write_marker(name).await {
            Ok(()) => {
                info!(entry = %name, "Marked as checked");
                true
            }
            Err(e) => {
                warn!(entry = %name, error = %e, "Error marking movie as checked");
                false
            }
        }
    }

    async fn write_marker(&self, name: &str) -> Result<()> {
        let path = self.marker_path(name)?;
        // Fixed-length name so any valid marker name also has a valid temp file
        let tmp = self.dir.join(format!(
            ".tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let now = Utc::now();
        let stamp = format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros());

        fs::write(&tmp, stamp.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to commit {}", path.display()));
        }

        debug!(path = %path.display(), stamp = %stamp, "Marker written");
        Ok(())
    }
}
