//! SM Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the SM dataset services.
//!
//! # Overview
//!
//! - **Types**: datasets, acting users, and molecular database descriptors
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Errors**: the shared error base type
//!
//! # Example
//!
//! ```no_run
//! use sm_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SmError};
pub use types::{Dataset, MolecularDatabase, User, UserRole};
