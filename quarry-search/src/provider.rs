use async_trait::async_trait;
use serde_json::Value;

use crate::types::SearchOptions;

/// A web search backend.
///
/// Implementations return the provider's response body as-is; pulling the
/// result list out of it is the invoker's job. Errors are the provider's own
/// type so callers see exactly what the backend reported.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn search(&self, phrase: &str, options: &SearchOptions) -> Result<Value, Self::Error>;
}
