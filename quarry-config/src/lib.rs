//! Credential lookup and provider settings for Quarry.
//!
//! - [`credentials`]: the ordered fallback chain that yields the search API key
//! - [`settings`]: tunables for the search provider client (endpoint, depth,
//!   result count), loaded with the `config` crate from YAML + env overlays
//!
//! The two are deliberately separate: the API key is never read from the
//! settings sources, only from the chain in [`credentials`].

pub mod credentials;
pub mod settings;

pub use config::ConfigError;
pub use credentials::{
    Credential, CredentialError, CredentialResolver, CredentialSource, EnvSource, FileSource,
};
pub use settings::{SearchDepth, SearchSettings, SearchSettingsLoader, SearchTopic};
