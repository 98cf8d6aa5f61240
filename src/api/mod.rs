pub mod client;
pub mod error;
pub mod multipart;

pub use client::{ApiClient, Connection};
pub use error::AppError;
pub use multipart::MultipartPayload;
