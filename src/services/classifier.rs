//! Yes/no classification of library entries
//!
//! The classifier asks a language model whether an entry is an Indian
//! (Bollywood, Telugu, ...) movie, grounded by search evidence. Model output
//! is free text, so the decision is pulled out by substring matching and
//! unusable answers are retried like transport failures.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::ollama::LanguageModel;
use super::rate_limiter::{RetryConfig, retry_async};
use super::search::EvidenceBundle;

/// Why a single classification attempt did not produce a decision
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The model could not be reached or returned a non-success status
    #[error("inference request failed: {0:#}")]
    Inference(anyhow::Error),

    /// The model answered without a recognisable yes/no
    #[error("invalid response (no 'yes' or 'no' found): {0:?}")]
    InvalidAnswer(String),
}

/// Extract a decision from a model answer.
///
/// Any occurrence of "yes" wins, even when "no" also appears. Neither
/// substring means the answer is unusable.
pub fn parse_decision(answer: &str) -> Option<bool> {
    let lower = answer.to_lowercase();
    if lower.contains("yes") {
        Some(true)
    } else if lower.contains("no") {
        Some(false)
    } else {
        None
    }
}

/// Prompt asking whether `entry` is an Indian movie
pub fn build_prompt(entry: &str, evidence: &EvidenceBundle) -> String {
    format!(
        "Based on the following DuckDuckGo search results about the movie '{entry}', determine if this is a Bollywood, Indian, or Telugu speaking movie.

Search Results:
{evidence}

If the search results don't provide clear information, use your internal knowledge about the movie. If you still don't have enough information, make an educated guess based on the movie title, any patterns you recognize, or common characteristics.

Is '{entry}' a Bollywood, Indian, or Telugu speaking movie? Answer with just 'yes' or 'no'. No explanations, comments, nothing. Just one word: 'yes' or 'no'.",
        evidence = evidence.render()
    )
}

/// Binary classifier backed by a language model
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn LanguageModel>,
    retry: RetryConfig,
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_retry(model, RetryConfig::default())
    }

    pub fn with_retry(model: Arc<dyn LanguageModel>, retry: RetryConfig) -> Self {
        Self { model, retry }
    }

    /// Decide whether `entry` is an Indian movie. Never fails; exhausting
    /// every attempt resolves to `false`.
    pub async fn classify(&self, entry: &str, evidence: &EvidenceBundle) -> bool {
        let prompt = build_prompt(entry, evidence);
        debug!(entry = %entry, prompt = %prompt, "Classification prompt");

        let max_attempts = self.retry.max_attempts;
        let result = retry_async(
            |attempt| {
                let prompt = prompt.as_str();
                async move {
                    info!(entry = %entry, attempt, max_attempts, "Asking Ollama");
                    let answer = self
                        .model
                        .generate(prompt)
                        .await
                        .map_err(ClassifyError::Inference)?;
                    debug!(entry = %entry, answer = %answer, "Ollama response");
                    parse_decision(&answer).ok_or(ClassifyError::InvalidAnswer(answer))
                }
            },
            &self.retry,
            "classify",
        )
        .await;

        match result {
            Ok(decision) => {
                let label = if decision { "yes" } else { "no" };
                info!(entry = %entry, decision = label, "Classification decided");
                decision
            }
            Err(e) => {
                warn!(entry = %entry, error = %e, "Max attempts reached, treating as 'no'");
                false
            }
        }
    }
}
