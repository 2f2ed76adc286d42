use quarry_config::{SearchDepth, SearchSettings, SearchTopic};
use serde::{Deserialize, Serialize};

/// One hit as returned by the provider, in provider order.
///
/// `content` and `url` are always present. The optional fields are only
/// serialized when the provider sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Text the provider extracted for this hit.
    pub content: String,
    /// Source locator.
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Provider relevance score, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Full page text; present when raw content was requested and available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

/// Knobs forwarded to [`SearchProvider::search`](crate::provider::SearchProvider::search).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub include_raw_content: bool,
    pub search_depth: SearchDepth,
    pub topic: SearchTopic,
    pub max_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchSettings::default())
    }
}

impl From<&SearchSettings> for SearchOptions {
    fn from(s: &SearchSettings) -> Self {
        Self {
            include_raw_content: true,
            search_depth: s.search_depth,
            topic: s.topic,
            max_results: s.max_results,
        }
    }
}
