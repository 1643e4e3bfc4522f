//! gRPC handlers for the four file operations.
//! Unpacks requests, hands each call a cancellation token and delegates the
//! work to `StorageService`.

use crate::{
    errors::AppError,
    pb::{
        DeleteFileRequest, DeleteFileResponse, DownloadFileRequest, DownloadFileResponse,
        GetFileMetadataRequest, GetFileMetadataResponse, UploadFileRequest, UploadFileResponse,
        file_service_server::FileService,
    },
    server::CallTracker,
    services::storage_service::StorageService,
    storage::StorageBackend,
};
use tonic::{Request, Response, Status};

const STATUS_SUCCESS: &str = "success";

pub struct FileRpc<B> {
    storage: StorageService<B>,
    calls: CallTracker,
}

impl<B: StorageBackend> FileRpc<B> {
    pub fn new(storage: StorageService<B>, calls: CallTracker) -> Self {
        Self { storage, calls }
    }
}

#[tonic::async_trait]
impl<B: StorageBackend> FileService for FileRpc<B> {
    async fn upload_file(
        &self,
        req: Request<UploadFileRequest>,
    ) -> Result<Response<UploadFileResponse>, Status> {
        let cancel = self.calls.register();
        let req = req.into_inner();

        let uploaded = self
            .storage
            .upload(&req.filename, req.content, &req.metadata, &cancel)
            .await
            .map_err(|err| AppError::from_storage("uploading file", err))?;

        Ok(Response::new(UploadFileResponse {
            status: STATUS_SUCCESS.into(),
            message: "File uploaded successfully".into(),
            file_id: uploaded.id,
        }))
    }

    async fn download_file(
        &self,
        req: Request<DownloadFileRequest>,
    ) -> Result<Response<DownloadFileResponse>, Status> {
        let cancel = self.calls.register();
        let file_id = req.into_inner().file_id;

        let file = self
            .storage
            .download(&file_id, &cancel)
            .await
            .map_err(|err| AppError::from_storage("downloading file", err))?;

        Ok(Response::new(DownloadFileResponse {
            filename: file.filename,
            content: file.content,
            metadata: file.metadata,
        }))
    }

    async fn get_file_metadata(
        &self,
        req: Request<GetFileMetadataRequest>,
    ) -> Result<Response<GetFileMetadataResponse>, Status> {
        let cancel = self.calls.register();
        let file_id = req.into_inner().file_id;

        let info = self
            .storage
            .get_metadata(&file_id, &cancel)
            .await
            .map_err(|err| AppError::from_storage("getting file metadata", err))?;

        let size = i64::try_from(info.size_bytes).map_err(|_| {
            tracing::error!("Error getting file metadata: size {} overflows", info.size_bytes);
            AppError::internal()
        })?;

        Ok(Response::new(GetFileMetadataResponse {
            created_at: info.created_at_iso8601(),
            filename: info.filename,
            metadata: info.metadata,
            size,
        }))
    }

    async fn delete_file(
        &self,
        req: Request<DeleteFileRequest>,
    ) -> Result<Response<DeleteFileResponse>, Status> {
        let cancel = self.calls.register();
        let file_id = req.into_inner().file_id;

        self.storage
            .delete(&file_id, &cancel)
            .await
            .map_err(|err| AppError::from_storage("deleting file", err))?;

        Ok(Response::new(DeleteFileResponse {
            status: STATUS_SUCCESS.into(),
            message: "File deleted successfully".into(),
        }))
    }
}
