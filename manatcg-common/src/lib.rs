//! # manatcg Common Library
//!
//! Shared code for the manatcg workspace:
//! - Common error and result types
//! - TOML configuration model (matching policy, alias tables, verifier,
//!   review, output and logging settings)
//! - Configuration file resolution

pub mod config;
pub mod error;

pub use config::TomlConfig;
pub use error::{Error, Result};
