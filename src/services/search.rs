//! Web search grounding for classification
//!
//! The evidence gatherer asks a search provider about a movie's country of
//! origin and renders the hits into prompt text. Search is best-effort: any
//! failure collapses to a "no results" placeholder.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::rate_limiter::RateLimitedClient;

/// Results requested per search
pub const MAX_RESULTS: usize = 5;

/// Placeholder rendered when no evidence could be gathered
pub const NO_EVIDENCE: &str = "No search results available.";

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Ordered search hits for one entry, or nothing at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceBundle {
    Found(Vec<SearchHit>),
    Unavailable,
}

impl EvidenceBundle {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Found(hits) => hits,
            Self::Unavailable => &[],
        }
    }

    /// Text block embedded in the classification prompt
    pub fn render(&self) -> String {
        match self {
            Self::Found(hits) => hits
                .iter()
                .enumerate()
                .map(|(i, hit)| {
                    format!(
                        "Result {}:\nTitle: {}\nSnippet: {}\nURL: {}",
                        i + 1,
                        or_na(&hit.title),
                        or_na(&hit.snippet),
                        or_na(&hit.url)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Unavailable => NO_EVIDENCE.to_string(),
        }
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// A web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo client using the no-JavaScript HTML endpoint
pub struct DuckDuckGoClient {
    client: RateLimitedClient,
    region: String,
}

impl DuckDuckGoClient {
    pub fn new(region: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::for_search()?,
            region: region.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        // kp=-2 turns safe search off
        let params = [("q", query), ("kl", self.region.as_str()), ("kp", "-2")];
        let response = self
            .client
            .get_with_query(DUCKDUCKGO_HTML_URL, &params)
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("DuckDuckGo search failed with status: {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read DuckDuckGo response")?;

        Ok(parse_results(&body, max_results))
    }
}

/// Extract hits from a DuckDuckGo HTML results page
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter(|result| {
            // Sponsored results carry the result--ad class
            !result.value().classes().any(|c| c == "result--ad")
        })
        .filter_map(|result| {
            let link = result.select(&title_sel).next()?;
            let title = collapse_text(link);
            if title.is_empty() {
                return None;
            }
            let url = link
                .value()
                .attr("href")
                .map(unwrap_redirect)
                .unwrap_or_default();
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(collapse_text)
                .unwrap_or_default();
            Some(SearchHit { title, snippet, url })
        })
        .take(max_results)
        .collect()
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `//duckduckgo.com/l/?uddg=<target>` links to their target
fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .filter(|u| u.path() == "/l/")
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Builds evidence bundles for entries
#[derive(Clone)]
pub struct EvidenceGatherer {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl EvidenceGatherer {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            max_results: MAX_RESULTS,
        }
    }

    pub fn query_for(entry: &str) -> String {
        format!("{entry} movie country origin")
    }

    /// Never fails; search errors and empty result sets both produce
    /// [`EvidenceBundle::Unavailable`].
    pub async fn gather(&self, entry: &str) -> EvidenceBundle {
        let query = Self::query_for(entry);
        debug!(entry = %entry, query = %query, "Searching for evidence");

        match self.provider.search(&query, self.max_results).await {
            Ok(mut hits) if !hits.is_empty() => {
                hits.truncate(self.max_results);
                info!(entry = %entry, count = hits.len(), "Found search results");
                EvidenceBundle::Found(hits)
            }
            Ok(_) => {
                info!(entry = %entry, "Search returned no results");
                EvidenceBundle::Unavailable
            }
            Err(e) => {
                warn!(entry = %entry, error = %e, "Error searching for evidence");
                EvidenceBundle::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RESULTS_PAGE: &str = r#"
<html><body>
  <div class="result results_links result--ad">
    <a class="result__a" href="https://ads.example/">Buy tickets</a>
    <a class="result__snippet">Sponsored</a>
  </div>
  <div class="result results_links">
    <h2 class="result__title">
      <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FRRR_(film)&amp;rut=abc">RRR (film) - <b>Wikipedia</b></a>
    </h2>
    <a class="result__snippet">RRR is a 2022 Indian Telugu-language
      epic action drama film.</a>
  </div>
  <div class="result results_links">
    <a class="result__a" href="https://www.imdb.com/title/tt8178634/">RRR (2022) - IMDb</a>
  </div>
</body></html>
"#;

    struct FixedProvider(Result<Vec<SearchHit>, String>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            self.0.clone().map_err(anyhow::Error::msg)
        }
    }

    fn hit(n: usize) -> SearchHit {
        SearchHit {
            title: format!("Title {n}"),
            snippet: format!("Snippet {n}"),
            url: format!("https://example.com/{n}"),
        }
    }

    #[test]
    fn test_parse_results_skips_ads_and_unwraps_links() {
        let hits = parse_results(RESULTS_PAGE, MAX_RESULTS);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "RRR (film) - Wikipedia");
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/RRR_(film)");
        assert_eq!(
            hits[0].snippet,
            "RRR is a 2022 Indian Telugu-language epic action drama film."
        );
        assert_eq!(hits[1].snippet, "");
        assert_eq!(hits[1].url, "https://www.imdb.com/title/tt8178634/");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        assert_eq!(parse_results(RESULTS_PAGE, 1).len(), 1);
        assert!(parse_results("<html></html>", MAX_RESULTS).is_empty());
    }

    #[test]
    fn test_render_numbered_results() {
        let rendered = EvidenceBundle::Found(vec![hit(1), hit(2)]).render();
        assert!(rendered.starts_with("Result 1:\nTitle: Title 1\nSnippet: Snippet 1"));
        assert!(rendered.contains("\n\nResult 2:\nTitle: Title 2"));
    }

    #[test]
    fn test_render_missing_fields_as_na() {
        let bundle = EvidenceBundle::Found(vec![SearchHit {
            title: "Only title".to_string(),
            snippet: String::new(),
            url: String::new(),
        }]);
        assert_eq!(
            bundle.render(),
            "Result 1:\nTitle: Only title\nSnippet: N/A\nURL: N/A"
        );
    }

    #[test]
    fn test_query_format() {
        assert_eq!(
            EvidenceGatherer::query_for("Lagaan"),
            "Lagaan movie country origin"
        );
    }

    #[tokio::test]
    async fn test_gather_failure_is_unavailable() {
        let gatherer = EvidenceGatherer::new(Arc::new(FixedProvider(Err("offline".into()))));
        let bundle = gatherer.gather("Lagaan").await;
        assert_eq!(bundle, EvidenceBundle::Unavailable);
        assert_eq!(bundle.render(), NO_EVIDENCE);
    }

    #[tokio::test]
    async fn test_gather_empty_is_unavailable() {
        let gatherer = EvidenceGatherer::new(Arc::new(FixedProvider(Ok(vec![]))));
        assert_eq!(gatherer.gather("Lagaan").await, EvidenceBundle::Unavailable);
    }

    #[tokio::test]
    async fn test_gather_caps_results() {
        let hits = (1..=8).map(hit).collect();
        let gatherer = EvidenceGatherer::new(Arc::new(FixedProvider(Ok(hits))));
        let bundle = gatherer.gather("Lagaan").await;
        assert_eq!(bundle.hits().len(), MAX_RESULTS);
    }
}
