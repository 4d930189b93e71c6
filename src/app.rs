//! Component wiring.
//!
//! Used by [main] to turn a [Config] into a ready-to-run reconciliation loop.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::jobs::ReconciliationLoop;
use crate::services::{
    ActionDispatcher, Classifier, CompletionLedger, DeletionPolicy, DuckDuckGoClient,
    EvidenceGatherer, LibraryScanner, NtfyNotifier, OllamaConfig, OllamaService, RadarrClient,
};

/// Everything `main` needs to run
pub struct App {
    pub reconciler: ReconciliationLoop,
    pub ollama: Arc<OllamaService>,
}

/// Pick the deletion behaviour from configuration
pub fn deletion_policy(config: &Config) -> Result<DeletionPolicy> {
    if !config.delete_from_radarr {
        return Ok(DeletionPolicy::Disabled);
    }

    match &config.radarr_api_key {
        Some(key) => {
            let client = RadarrClient::new(config.radarr_url.clone(), key.clone())?;
            Ok(DeletionPolicy::Enabled(Arc::new(client)))
        }
        None => Ok(DeletionPolicy::Misconfigured(
            "DELETE_FROM_RADARR is set but RADARR_API_KEY is not".to_string(),
        )),
    }
}

/// Build all components from configuration
pub fn build(config: &Config) -> Result<App> {
    let ollama = Arc::new(OllamaService::new(OllamaConfig {
        url: config.ollama_endpoint.clone(),
        model: config.ollama_model.clone(),
        ..OllamaConfig::default()
    })?);

    let search = Arc::new(DuckDuckGoClient::new(config.search_region.clone())?);
    let notifier = Arc::new(NtfyNotifier::new(config.ntfy_url.clone())?);

    let reconciler = ReconciliationLoop::new(
        LibraryScanner::new(&config.movies_dir),
        CompletionLedger::new(&config.checked_dir),
        EvidenceGatherer::new(search),
        Classifier::new(ollama.clone()),
        ActionDispatcher::new(notifier, deletion_policy(config)?),
    );

    Ok(App { reconciler, ollama })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_deletion_disabled_by_default() {
        assert_matches!(
            deletion_policy(&Config::default()).unwrap(),
            DeletionPolicy::Disabled
        );
    }

    #[test]
    fn test_deletion_without_key_is_misconfigured() {
        let config = Config {
            delete_from_radarr: true,
            ..Config::default()
        };
        assert_matches!(
            deletion_policy(&config).unwrap(),
            DeletionPolicy::Misconfigured(_)
        );
    }

    #[test]
    fn test_deletion_with_key_is_enabled() {
        let config = Config {
            delete_from_radarr: true,
            radarr_api_key: Some("abc".to_string()),
            ..Config::default()
        };
        assert_matches!(deletion_policy(&config).unwrap(), DeletionPolicy::Enabled(_));
    }
}
