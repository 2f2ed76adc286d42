use quarry_config::{ConfigError, CredentialError};
use serde_json::Value;
use thiserror::Error;

use crate::provider::SearchProvider;
use crate::types::{SearchOptions, SearchResult};

/// Field of the provider response that carries the hits.
pub const RESULTS_FIELD: &str = "results";

/// Everything a search can fail with.
///
/// Provider failures are kept in the provider's own error type; `Display` and
/// `source()` pass straight through to it.
#[derive(Debug, Error)]
pub enum SearchError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Provider(E),

    #[error("search response has no `{0}` field")]
    MissingField(&'static str),

    #[error("search results are malformed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Settings(#[from] ConfigError),
}

/// Runs one search against a provider and returns its result list.
#[derive(Debug)]
pub struct SearchInvoker<P> {
    provider: P,
    options: SearchOptions,
}

impl<P: SearchProvider> SearchInvoker<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: SearchOptions::default(),
        }
    }

    /// Replace the provider options. Raw content is always requested.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = SearchOptions {
            include_raw_content: true,
            ..options
        };
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// The phrase goes to the provider unchanged, empty or not.
    pub async fn invoke(&self, phrase: &str) -> Result<Vec<SearchResult>, SearchError<P::Error>> {
        let response = self
            .provider
            .search(phrase, &self.options)
            .await
            .map_err(SearchError::Provider)?;

        let results = extract_results(response)?;
        tracing::debug!(
            target: "search.invoker",
            result_count = results.len(),
            "search.invoke.done"
        );
        Ok(results)
    }
}

/// Take the [`RESULTS_FIELD`] list out of a provider response.
///
/// ```
/// use quarry_search::invoker::{extract_results, SearchError};
/// use serde_json::json;
///
/// let hits = extract_results::<std::io::Error>(json!({
///     "results": [{"content": "a", "url": "http://x"}]
/// }))
/// .unwrap();
/// assert_eq!(hits[0].url, "http://x");
///
/// let missing = extract_results::<std::io::Error>(json!({"answer": null}));
/// assert!(matches!(missing, Err(SearchError::MissingField("results"))));
/// ```
pub fn extract_results<E>(mut response: Value) -> Result<Vec<SearchResult>, SearchError<E>>
where
    E: std::error::Error + 'static,
{
    let results = response
        .get_mut(RESULTS_FIELD)
        .map(Value::take)
        .ok_or(SearchError::MissingField(RESULTS_FIELD))?;
    serde_json::from_value(results).map_err(SearchError::Decode)
}
