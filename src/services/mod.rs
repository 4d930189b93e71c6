//! Library components and external service integrations

pub mod classifier;
pub mod dispatcher;
pub mod ledger;
pub mod logging;
pub mod notifications;
pub mod ollama;
pub mod radarr;
pub mod rate_limiter;
pub mod scanner;
pub mod search;

pub use classifier::{ClassifyError, Classifier, build_prompt, parse_decision};
pub use dispatcher::{ActionDispatcher, ActionOutcome, DeletionPolicy};
pub use ledger::CompletionLedger;
pub use logging::{LogFormat, init_tracing};
pub use notifications::{Notifier, NtfyNotifier};
pub use ollama::{LanguageModel, OllamaConfig, OllamaService};
pub use radarr::{MediaCandidate, MediaManager, RadarrClient, select_candidate};
pub use rate_limiter::{RateLimitConfig, RateLimitedClient, RetryConfig, retry_async};
pub use scanner::LibraryScanner;
pub use search::{DuckDuckGoClient, EvidenceBundle, EvidenceGatherer, SearchHit, SearchProvider};
