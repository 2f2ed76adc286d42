//! Shared plumbing for the Quarry crates.
//!
//! Right now this is only the tracing setup in [`observability`]; the crate
//! stays free of HTTP or provider dependencies so that every other crate
//! (and their integration tests) can pull it in cheaply.
//!
//! ```rust
//! use quarry_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "quarry");
//! ```

pub mod observability;
