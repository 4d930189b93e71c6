//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Library root whose immediate subdirectories are the entries to check
    pub movies_dir: String,

    /// Directory holding one `.checked` marker per processed entry
    pub checked_dir: String,

    /// Ollama server base URL
    pub ollama_endpoint: String,

    /// Ollama model used for classification
    pub ollama_model: String,

    /// ntfy topic URL notifications are posted to
    pub ntfy_url: String,

    /// Delete positively classified movies from Radarr
    pub delete_from_radarr: bool,

    /// Radarr base URL
    pub radarr_url: String,

    /// Radarr API key (deletion is a no-op without it)
    pub radarr_api_key: Option<String>,

    /// Run a single pass and exit
    pub run_once: bool,

    /// Seconds to sleep between passes in continuous mode
    pub check_interval_secs: u64,

    /// DuckDuckGo region used for evidence searches
    pub search_region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_dir: "/movies".to_string(),
            checked_dir: "/checked".to_string(),
            ollama_endpoint: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            ntfy_url: "https://ntfy.sh/mytopic".to_string(),
            delete_from_radarr: false,
            radarr_url: "http://localhost:7878".to_string(),
            radarr_api_key: None,
            run_once: false,
            check_interval_secs: 3600,
            search_region: "us-en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let check_interval_secs = match lookup("CHECK_INTERVAL") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid CHECK_INTERVAL: {raw:?}"))?,
            None => defaults.check_interval_secs,
        };

        Ok(Self {
            movies_dir: lookup("MOVIES_DIR").unwrap_or(defaults.movies_dir),

            checked_dir: lookup("CHECKED_DIR").unwrap_or(defaults.checked_dir),

            ollama_endpoint: lookup("OLLAMA_ENDPOINT")
                .map(|v| trim_base_url(&v))
                .unwrap_or(defaults.ollama_endpoint),

            ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),

            ntfy_url: lookup("NTFY_URL").unwrap_or(defaults.ntfy_url),

            delete_from_radarr: lookup("DELETE_FROM_RADARR")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.delete_from_radarr),

            radarr_url: lookup("RADARR_URL")
                .map(|v| trim_base_url(&v))
                .unwrap_or(defaults.radarr_url),

            radarr_api_key: lookup("RADARR_API_KEY").filter(|v| !v.trim().is_empty()),

            run_once: lookup("RUN_ONCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.run_once),

            check_interval_secs,

            search_region: lookup("SEARCH_REGION").unwrap_or(defaults.search_region),
        })
    }

    /// Sleep between passes in continuous mode
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Log the effective configuration, keeping the API key out of the output
    pub fn log_summary(&self) {
        tracing::info!(
            movies_dir = %self.movies_dir,
            checked_dir = %self.checked_dir,
            ollama_endpoint = %self.ollama_endpoint,
            ollama_model = %self.ollama_model,
            ntfy_url = %self.ntfy_url,
            delete_from_radarr = self.delete_from_radarr,
            radarr_url = %self.radarr_url,
            radarr_api_key_set = self.radarr_api_key.is_some(),
            run_once = self.run_once,
            check_interval_secs = self.check_interval_secs,
            search_region = %self.search_region,
            "Configuration loaded"
        );
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn trim_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}
