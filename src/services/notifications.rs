//! Push notifications for positively classified movies
//!
//! Notifications are posted to an ntfy topic as a plain-text body with the
//! title, priority and tags carried in headers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Notification title header value
pub const NOTIFICATION_TITLE: &str = "New Indian Movie Found";
/// Notification priority header value
pub const NOTIFICATION_PRIORITY: &str = "default";
/// Notification tags header value
pub const NOTIFICATION_TAGS: &str = "movie,bollywood";

/// Delivers "movie found" alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, entry: &str) -> Result<()>;
}

/// Message body for `entry`
pub fn notification_body(entry: &str) -> String {
    format!("Found Indian movie: {entry}")
}

/// ntfy.sh (or self-hosted ntfy) publisher
pub struct NtfyNotifier {
    client: reqwest::Client,
    url: String,
}

impl NtfyNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, entry: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header("Title", NOTIFICATION_TITLE)
            .header("Priority", NOTIFICATION_PRIORITY)
            .header("Tags", NOTIFICATION_TAGS)
            .body(notification_body(entry))
            .send()
            .await
            .context("Failed to send notification")?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("ntfy returned status: {}", response.status());
        }

        Ok(())
    }
}
