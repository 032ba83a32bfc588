pub mod reprocessing_needed;

pub use reprocessing_needed::ReprocessingNeededQuery;
