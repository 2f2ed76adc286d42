//! Resolution of the search API key from an ordered list of sources.
//!
//! The standard chain is:
//!
//! 1. the `TAVILY_API_KEY` environment variable
//! 2. `tavily_api.txt` in the current working directory
//! 3. `tavily_api.txt` three directories above this source file, which is the
//!    workspace root
//!
//! The first source that yields a non-empty value wins and later sources are
//! not consulted. A missing file counts as "no value"; any other I/O failure is
//! returned to the caller. Running out of sources is not an error: the
//! resolver returns `Ok(None)` and the provider client decides what a missing
//! key means.
//!
//! ```
//! use quarry_config::credentials::{CredentialResolver, CredentialSource, CredentialError};
//!
//! struct Fixed(&'static str);
//!
//! impl CredentialSource for Fixed {
//!     fn name(&self) -> String {
//!         "fixed".into()
//!     }
//!     fn lookup(&self) -> Result<Option<String>, CredentialError> {
//!         Ok(Some(self.0.to_string()))
//!     }
//! }
//!
//! let resolver = CredentialResolver::new(vec![Box::new(Fixed("tvly-demo"))]);
//! let key = resolver.resolve().unwrap().expect("fixed source always answers");
//! assert_eq!(key.expose(), "tvly-demo");
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const CREDENTIAL_ENV: &str = "TAVILY_API_KEY";
pub const CREDENTIAL_FILE: &str = "tavily_api.txt";
/// Levels above the module file that make up the install-relative root.
pub const INSTALL_ROOT_DEPTH: usize = 3;

/// Opaque API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credential file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("environment variable {var} is not valid unicode")]
    NotUnicode { var: String },
}

/// One place a credential might live.
///
/// `Ok(None)` means "nothing here, try the next source".
pub trait CredentialSource: Send + Sync {
    /// Label used in logs. Must not contain the credential.
    fn name(&self) -> String;

    fn lookup(&self) -> Result<Option<String>, CredentialError>;
}

/// Reads a single environment variable. Unset and empty are both absent.
#[derive(Debug, Clone)]
pub struct EnvSource {
    var: String,
}

impl EnvSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvSource {
    fn name(&self) -> String {
        format!("env:{}", self.var)
    }

    fn lookup(&self) -> Result<Option<String>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(CredentialError::NotUnicode {
                var: self.var.clone(),
            }),
        }
    }
}

/// Reads a whole file and trims surrounding whitespace.
///
/// Relative paths are resolved against the working directory at lookup time.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `file_name` in whatever the current directory is when [`lookup`] runs.
    ///
    /// [`lookup`]: CredentialSource::lookup
    pub fn working_dir(file_name: &str) -> Self {
        Self::new(file_name)
    }

    /// `file_name` under the install-relative root of this crate.
    pub fn install_relative(file_name: &str) -> Self {
        Self::install_relative_to(&module_file(), file_name)
    }

    /// `file_name` under [`install_root`] of `module_file`.
    pub fn install_relative_to(module_file: &Path, file_name: &str) -> Self {
        Self::new(install_root(module_file).join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for FileSource {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn lookup(&self) -> Result<Option<String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Lexically walk [`INSTALL_ROOT_DEPTH`] levels up from `module_file`.
///
/// `<root>/quarry-config/src/credentials.rs` yields `<root>`. Walking past
/// the filesystem root stays at the root, the same as `..` does on the
/// filesystem.
pub fn install_root(module_file: &Path) -> PathBuf {
    module_file
        .ancestors()
        .nth(INSTALL_ROOT_DEPTH)
        .or_else(|| module_file.ancestors().last())
        .unwrap_or(module_file)
        .to_path_buf()
}

/// This source file, fixed at build time.
fn module_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("credentials.rs")
}

/// Ordered credential lookup. Built fresh per search; holds no values.
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Environment, then working directory file, then install-relative file.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(EnvSource::new(CREDENTIAL_ENV)),
            Box::new(FileSource::working_dir(CREDENTIAL_FILE)),
            Box::new(FileSource::install_relative(CREDENTIAL_FILE)),
        ])
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Try each source in order; stop at the first value.
    pub fn resolve(&self) -> Result<Option<Credential>, CredentialError> {
        for source in &self.sources {
            match source.lookup() {
                Ok(Some(value)) => {
                    tracing::debug!(
                        target: "quarry.credentials",
                        source = %source.name(),
                        "credential.resolved"
                    );
                    return Ok(Some(Credential(value)));
                }
                Ok(None) => {
                    tracing::trace!(
                        target: "quarry.credentials",
                        source = %source.name(),
                        "credential.source_empty"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "quarry.credentials",
                        source = %source.name(),
                        error = %e,
                        "credential.source_failed"
                    );
                    return Err(e);
                }
            }
        }

        tracing::warn!(
            target: "quarry.credentials",
            sources = ?self.source_names(),
            "credential.exhausted"
        );
        Ok(None)
    }
}
