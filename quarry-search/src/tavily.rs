use std::time::{Duration, Instant};

use async_trait::async_trait;
use quarry_config::{Credential, SearchSettings};
use quarry_http::{HttpClient, HttpError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::provider::SearchProvider;
use crate::types::SearchOptions;

const QUERY_LOG_CHARS: usize = 160;

#[derive(Debug, Error)]
pub enum TavilyError {
    #[error("no Tavily API key was provided")]
    MissingApiKey,

    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    search_depth: &'static str,
    topic: &'static str,
    max_results: u32,
    include_raw_content: bool,
}

/// Client for the Tavily `/search` endpoint.
#[derive(Clone)]
pub struct TavilyClient {
    http: HttpClient,
    api_key: String,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("base_url", &self.http.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl TavilyClient {
    /// Client against the public endpoint with default settings.
    ///
    /// Fails with [`TavilyError::MissingApiKey`] when `api_key` is `None`.
    ///
    /// ```
    /// use quarry_search::tavily::{TavilyClient, TavilyError};
    ///
    /// assert!(matches!(TavilyClient::new(None), Err(TavilyError::MissingApiKey)));
    /// ```
    pub fn new(api_key: Option<&Credential>) -> Result<Self, TavilyError> {
        Self::with_settings(api_key, &SearchSettings::default())
    }

    pub fn with_settings(
        api_key: Option<&Credential>,
        settings: &SearchSettings,
    ) -> Result<Self, TavilyError> {
        let api_key = api_key.ok_or(TavilyError::MissingApiKey)?;
        let http = HttpClient::new(&settings.base_url)?
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        Ok(Self {
            http,
            api_key: api_key.expose().to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    type Error = TavilyError;

    async fn search(&self, phrase: &str, options: &SearchOptions) -> Result<Value, TavilyError> {
        let query_snippet: String = phrase.chars().take(QUERY_LOG_CHARS).collect();
        let req = TavilySearchRequest {
            query: phrase,
            search_depth: options.search_depth.as_str(),
            topic: options.topic.as_str(),
            max_results: options.max_results,
            include_raw_content: options.include_raw_content,
        };

        let started = Instant::now();
        tracing::info!(
            target: "search.tavily",
            query = %query_snippet,
            search_depth = req.search_depth,
            max_results = req.max_results,
            "tavily.search.start"
        );

        match self
            .http
            .post_json::<_, Value>("search", Some(&self.api_key), &req)
            .await
        {
            Ok(resp) => {
                tracing::info!(
                    target: "search.tavily",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tavily.search.success"
                );
                Ok(resp)
            }
            Err(e) => {
                tracing::warn!(
                    target: "search.tavily",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "tavily.search.error"
                );
                Err(e.into())
            }
        }
    }
}
