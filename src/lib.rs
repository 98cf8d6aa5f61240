pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use api::error::AppError;
pub use models::{FileRecord, ImageSize, Tags};
pub use services::file_service::FileService;
pub use services::upload::{LocalFile, UploadSource};
