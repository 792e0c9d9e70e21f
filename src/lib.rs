//! # geosearch
//!
//! Application layer around [`geosearch_core`]: TOML configuration with
//! server-owned provider keys, environment overrides, platform paths, and
//! the `geosearch` command-line tool.

pub mod config;
pub mod error;
pub mod paths;

pub use config::{AppConfig, ServerCredentials};
pub use error::{AppError, Result};
