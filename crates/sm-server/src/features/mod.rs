//! Feature modules implementing the dataset mutation operations
//!
//! Each feature is a vertical slice with its own commands and queries.
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate; handlers take a [`MutationContext`] and the request by value.
//!
//! # Features
//!
//! - **datasets**: submit, update, delete, optical image attach/detach and
//!   the reprocessing dry-run

pub mod datasets;
pub mod shared;

use std::sync::Arc;

use crate::auth::EditPermission;
use crate::engine::EngineGateway;
use crate::locks::DatasetLocks;
use crate::metadata::MetadataSchema;
use crate::processing_config::ConfigDeriver;
use crate::registry::MolecularDatabaseRegistry;
use crate::store::DatasetStore;

/// Collaborators shared by every mutation handler
///
/// Cheap to clone; all members are shared handles.
#[derive(Clone)]
pub struct MutationContext {
    /// Read access to stored datasets
    pub store: Arc<dyn DatasetStore>,
    /// Edit capability check
    pub permissions: Arc<dyn EditPermission>,
    /// Molecular database registry
    pub registry: Arc<dyn MolecularDatabaseRegistry>,
    /// Derives `config` from metadata, databases and adducts
    pub config_deriver: Arc<dyn ConfigDeriver>,
    /// Processing engine client
    pub engine: EngineGateway,
    /// Metadata schema, compiled once at startup
    pub schema: Arc<MetadataSchema>,
    /// Per-dataset serialization
    pub locks: DatasetLocks,
    /// Base URL for optical image URLs given as absolute paths
    pub image_storage_url: String,
}
