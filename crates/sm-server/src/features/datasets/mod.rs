pub mod commands;
pub mod queries;
pub mod types;

pub use commands::{
    AddOpticalImageCommand, DeleteDatasetCommand, DeleteOpticalImageCommand,
    SubmitDatasetCommand, UpdateDatasetCommand,
};

pub use queries::ReprocessingNeededQuery;

pub use types::{DatasetSubmitInput, DatasetUpdateInput};
