pub mod dimensions;
pub mod file_service;
pub mod persistence;
pub mod query;
pub mod upload;
