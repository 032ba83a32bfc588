//! SM dataset mutation core
//!
//! Validates, classifies and forwards edits to imaging mass-spectrometry
//! datasets. Datasets are processed by a separate engine; this crate decides
//! what the engine must be asked to do and asks it.
//!
//! # Overview
//!
//! - **Schema validation** ([`metadata`]): trims empty optional fields, then
//!   reports every violation at once
//! - **Diffing** ([`diff`]): deterministic JSON patch with move detection
//! - **Change impact** ([`reprocessing`]): no change, database update, or
//!   processing settings update
//! - **Collaborators**: [`engine`], [`registry`], [`store`], [`auth`],
//!   [`processing_config`]
//! - **Orchestrators** ([`features`]): one command per mutation, dispatched
//!   through [`cqrs::build_mediator`]
//!
//! # Architecture
//!
//! Every mutation is a command handled by `handle(ctx, command)`. A handler
//! authorizes first, serializes on the dataset id through [`locks`], and
//! fails fast on every step except the optical image removal that precedes
//! a dataset deletion.
//!
//! # Example
//!
//! ```no_run
//! use sm_server::features::datasets::commands::delete::{handle, DeleteDatasetCommand};
//! use sm_server::features::MutationContext;
//! use sm_common::User;
//!
//! async fn delete(ctx: MutationContext) -> anyhow::Result<()> {
//!     let body = handle(ctx, DeleteDatasetCommand {
//!         dataset_id: "2017-05-23_09h00m00s".to_string(),
//!         user: User::admin("admin@example.org"),
//!     })
//!     .await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod cqrs;
pub mod diff;
pub mod engine;
pub mod error;
pub mod features;
pub mod locks;
pub mod metadata;
pub mod processing_config;
pub mod registry;
pub mod reprocessing;
pub mod store;

// Re-export commonly used types
pub use error::{MutationError, MutationResult};
pub use features::MutationContext;
