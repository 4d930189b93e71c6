//! Radarr API client
//!
//! Only the two calls needed to remove a movie are implemented: a free-text
//! lookup against the library and a delete that also removes files.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// A movie known to the media manager
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaCandidate {
    pub id: i64,
    pub title: String,
}

/// Media manager operations used for deletion
#[async_trait]
pub trait MediaManager: Send + Sync {
    /// Movies matching a free-text term
    async fn search_movies(&self, term: &str) -> Result<Vec<MediaCandidate>>;

    /// Delete a movie and its files
    async fn delete_movie(&self, id: i64) -> Result<()>;
}

/// First candidate whose title contains `entry`, ignoring case.
///
/// Candidates are not scored; order decides.
pub fn select_candidate<'a>(
    candidates: &'a [MediaCandidate],
    entry: &str,
) -> Option<&'a MediaCandidate> {
    let needle = entry.to_lowercase();
    candidates
        .iter()
        .find(|c| c.title.to_lowercase().contains(&needle))
}

/// Radarr v3 API client
pub struct RadarrClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RadarrClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl MediaManager for RadarrClient {
    async fn search_movies(&self, term: &str) -> Result<Vec<MediaCandidate>> {
        let url = format!("{}/api/v3/movie", self.base_url);
        debug!(term = %term, "Searching Radarr");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("term", term)])
            .send()
            .await
            .context("Radarr search request failed")?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("Radarr search failed with status: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Radarr search results")
    }

    async fn delete_movie(&self, id: i64) -> Result<()> {
        let url = format!("{}/api/v3/movie/{}", self.base_url, id);

        let response = self
            .client
            .delete(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("deleteFiles", "true"), ("addImportExclusion", "false")])
            .send()
            .await
            .context("Radarr delete request failed")?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => anyhow::bail!("Radarr delete failed with status: {}", status),
        }
    }
}
