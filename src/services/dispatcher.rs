//! Side effects for positively classified entries
//!
//! A positive entry is announced through the notifier and, when enabled,
//! removed from Radarr. Every failure is logged and reported as a flag; none
//! of them propagate.

use std::sync::Arc;

use tracing::{info, warn};

use super::notifications::Notifier;
use super::radarr::{MediaManager, select_candidate};

/// Deletion behaviour for positive entries
#[derive(Clone)]
pub enum DeletionPolicy {
    /// Deletion turned off
    Disabled,
    /// Deletion requested but not usable (e.g. no API key)
    Misconfigured(String),
    /// Delete through this media manager
    Enabled(Arc<dyn MediaManager>),
}

impl std::fmt::Debug for DeletionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Misconfigured(reason) => f.debug_tuple("Misconfigured").field(reason).finish(),
            Self::Enabled(_) => f.write_str("Enabled(..)"),
        }
    }
}

/// What happened while acting on one entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub notified: bool,
    /// `None` when deletion is disabled
    pub deleted: Option<bool>,
}

/// Executes notify/delete for positive entries
#[derive(Clone)]
pub struct ActionDispatcher {
    notifier: Arc<dyn Notifier>,
    deletion: DeletionPolicy,
}

impl ActionDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, deletion: DeletionPolicy) -> Self {
        Self { notifier, deletion }
    }

    /// Notify, then delete if enabled. Deletion runs even when the
    /// notification failed.
    pub async fn on_positive(&self, entry: &str) -> ActionOutcome {
        let notified = self.notify(entry).await;
        let deleted = match &self.deletion {
            DeletionPolicy::Disabled => None,
            DeletionPolicy::Misconfigured(reason) => {
                warn!(entry = %entry, reason = %reason, "Radarr deletion skipped");
                Some(false)
            }
            DeletionPolicy::Enabled(manager) => {
                Some(self.delete_from_media_manager(manager.as_ref(), entry).await)
            }
        };

        ActionOutcome { notified, deleted }
    }

    async fn notify(&self, entry: &str) -> bool {
        info!(entry = %entry, "Sending notification");
        match self.notifier.notify(entry).await {
            Ok(()) => {
                info!(entry = %entry, "Notification sent successfully");
                true
            }
            Err(e) => {
                warn!(entry = %entry, error = %e, "Error sending notification");
                false
            }
        }
    }

    async fn delete_from_media_manager(&self, manager: &dyn MediaManager, entry: &str) -> bool {
        info!(entry = %entry, "Searching Radarr for movie to delete");

        let candidates = match manager.search_movies(entry).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(entry = %entry, error = %e, "Radarr search failed");
                return false;
            }
        };

        let Some(movie) = select_candidate(&candidates, entry) else {
            warn!(
                entry = %entry,
                candidates = candidates.len(),
                "Movie not found in Radarr, nothing deleted"
            );
            return false;
        };

        match manager.delete_movie(movie.id).await {
            Ok(()) => {
                info!(entry = %entry, radarr_id = movie.id, title = %movie.title, "Deleted from Radarr");
                true
            }
            Err(e) => {
                warn!(entry = %entry, radarr_id = movie.id, error = %e, "Radarr delete failed");
                false
            }
        }
    }
}
