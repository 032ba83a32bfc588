pub mod add_optical_image;
pub mod delete;
pub mod delete_optical_image;
pub mod submit;
pub mod update;

pub use add_optical_image::AddOpticalImageCommand;
pub use delete::DeleteDatasetCommand;
pub use delete_optical_image::DeleteOpticalImageCommand;
pub use submit::SubmitDatasetCommand;
pub use update::UpdateDatasetCommand;
