//! Web search with a resolved API key.
//!
//! - [`provider::SearchProvider`]: the backend seam (one `search` call)
//! - [`tavily::TavilyClient`]: the Tavily implementation
//! - [`invoker::SearchInvoker`]: calls a provider and pulls out `results`
//! - [`perform_search`]: key resolution + Tavily + invoker in one call
//!
//! Nothing here caches, retries or reorders. Provider failures come back as
//! [`SearchError::Provider`] holding the provider's own error.
//!
//! ```no_run
//! # async fn demo() -> Result<(), quarry_search::SearchError<quarry_search::TavilyError>> {
//! for hit in quarry_search::perform_search("rust borrow checker").await? {
//!     println!("{} -> {} chars", hit.url, hit.content.len());
//! }
//! # Ok(()) }
//! ```

pub mod invoker;
pub mod provider;
pub mod tavily;
pub mod types;

pub use invoker::{SearchError, SearchInvoker};
pub use provider::SearchProvider;
pub use tavily::{TavilyClient, TavilyError};
pub use types::{SearchOptions, SearchResult};

use quarry_config::{Credential, CredentialResolver, SearchSettings};

/// Resolve the key with the standard chain, load settings, and search Tavily.
///
/// The key is resolved before `quarry.yaml` is read, so credential problems
/// are reported first. A settings file that fails to load comes back as
/// [`SearchError::Settings`].
pub async fn perform_search(phrase: &str) -> Result<Vec<SearchResult>, SearchError<TavilyError>> {
    let credential = CredentialResolver::standard().resolve()?;
    let settings = SearchSettings::load()?;
    search_with_credential(credential.as_ref(), &settings, phrase).await
}

/// [`perform_search`] with an explicit resolver and settings.
///
/// The credential is resolved on every call. When no source yields one the
/// Tavily client refuses to build and that error is returned.
pub async fn perform_search_with(
    resolver: &CredentialResolver,
    settings: &SearchSettings,
    phrase: &str,
) -> Result<Vec<SearchResult>, SearchError<TavilyError>> {
    let credential = resolver.resolve()?;
    search_with_credential(credential.as_ref(), settings, phrase).await
}

async fn search_with_credential(
    credential: Option<&Credential>,
    settings: &SearchSettings,
    phrase: &str,
) -> Result<Vec<SearchResult>, SearchError<TavilyError>> {
    let client = TavilyClient::with_settings(credential, settings).map_err(SearchError::Provider)?;

    SearchInvoker::new(client)
        .with_options(SearchOptions::from(settings))
        .invoke(phrase)
        .await
}
