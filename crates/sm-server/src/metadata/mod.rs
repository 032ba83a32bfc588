//! Dataset metadata handling: schema validation and submitter of record

pub mod schema;
pub mod submitter;

pub use schema::{MetadataSchema, SchemaError, Violation};
pub use submitter::assign_submitter_email;
