//! Search provider settings with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, YAML sources in the
//! order they were added, then `QUARRY_SEARCH__*` environment variables.
//! String values may reference `${VAR}` placeholders, which are expanded after
//! merging.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
pub const ENV_PREFIX: &str = "QUARRY_SEARCH";
pub const DEFAULT_SETTINGS_FILE: &str = "quarry.yaml";
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

impl SearchTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchTopic::General => "general",
            SearchTopic::News => "news",
        }
    }
}

/// Tunables for the provider client. The API key is not one of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: String,
    pub search_depth: SearchDepth,
    pub topic: SearchTopic,
    pub max_results: u32,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_depth: SearchDepth::Basic,
            topic: SearchTopic::General,
            max_results: 5,
            timeout_secs: 60,
        }
    }
}

impl SearchSettings {
    /// Defaults, then `quarry.yaml` in the working directory if present,
    /// then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        SearchSettingsLoader::new()
            .with_optional_file(DEFAULT_SETTINGS_FILE)
            .load()
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate. Environment overrides are applied last.
pub struct SearchSettingsLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SearchSettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSettingsLoader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use quarry_config::{SearchDepth, SearchSettingsLoader};
    ///
    /// let settings = SearchSettingsLoader::new()
    ///     .with_yaml_str("search_depth: advanced\nmax_results: 10")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(settings.search_depth, SearchDepth::Advanced);
    /// assert_eq!(settings.max_results, 10);
    /// assert_eq!(settings.base_url, "https://api.tavily.com");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    pub fn load(self) -> Result<SearchSettings, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let settings: SearchSettings =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        tracing::debug!(
            target: "quarry.config",
            base_url = %settings.base_url,
            search_depth = settings.search_depth.as_str(),
            topic = settings.topic.as_str(),
            max_results = settings.max_results,
            "settings.loaded"
        );
        Ok(settings)
    }
}
