mod file_storage_service;

pub use file_storage_service::FileStorageService;
