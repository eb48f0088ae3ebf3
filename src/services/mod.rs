pub mod blob_store;
pub mod download_service;
pub mod file_service;
pub mod upload_service;
