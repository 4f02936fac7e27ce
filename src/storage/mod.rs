//! Blob service backends.

mod azure;
mod block;
mod memory;

pub use azure::*;
pub use block::*;
pub use memory::*;

use async_trait::async_trait;
use url::Url;

use crate::error::StorageResult;
use crate::models::{BlobProperties, ByteSource, ContainerAccessLevel, UploadOptions};

/// Blob service operations the upload engine relies on.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    async fn container_exists(&self, container: &str) -> StorageResult<bool>;

    /// Creates the container unless it already exists; an existing container
    /// keeps its access level and contents. Returns whether it was created.
    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccessLevel,
    ) -> StorageResult<bool>;

    /// Streams `source` into a block blob, reading at most
    /// `options.buffer_size` bytes per block.
    async fn upload_stream(
        &self,
        container: &str,
        blob: &str,
        source: ByteSource,
        options: &UploadOptions,
    ) -> StorageResult<()>;

    async fn get_blob_properties(&self, container: &str, blob: &str) -> StorageResult<BlobProperties>;

    /// Deletes the blob if present. Returns whether anything was deleted.
    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool>;

    fn blob_url(&self, container: &str, blob: &str) -> StorageResult<Url>;
}
