//! # file-store
//!
//! Network file storage service. Files are uploaded, downloaded, described and
//! deleted over gRPC and kept as plain files under one storage directory.
//!
//! - `storage`: the backend seam (`LocalFsBackend`, `MemoryBackend`)
//! - `services`: the Storage Handler mapping operations onto artifacts
//! - `handlers`: the tonic service adapter
//! - `server`: listener lifecycle and call cancellation

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;

/// Types generated from `proto/file_service.proto`.
pub mod pb {
    tonic::include_proto!("filestore.v1");
}

pub use server::FileServer;
pub use services::storage_service::StorageService;
