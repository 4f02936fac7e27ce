//! Upload engine: resolves destinations and streams files into blob storage.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ResolvedOptions, StorageOptions};
use crate::error::{StorageError, StorageResult};
use crate::models::{
    ContainerAccessLevel, ContentSettings, FileInfo, IncomingFile, RequestContext, StoredFile,
    UploadOptions,
};
use crate::resolver::{ContentSettingsResolver, MetadataResolver, NameResolver};
use crate::storage::{AzureBlobBackend, BlobBackend};

/// Storage contract expected by the upload middleware.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Stores one incoming file and describes where it ended up.
    async fn handle_file(&self, req: &RequestContext, file: IncomingFile) -> StorageResult<StoredFile>;

    /// Removes a file previously returned by [`StorageEngine::handle_file`].
    async fn remove_file(&self, req: &RequestContext, file: &StoredFile) -> StorageResult<()>;
}

/// Storage engine writing uploads to blob containers.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of concurrent uploads and removals.
pub struct BlobStorageEngine<B = AzureBlobBackend> {
    backend: Arc<B>,
    container_name: NameResolver,
    blob_name: NameResolver,
    metadata: Option<MetadataResolver>,
    content_settings: Option<ContentSettingsResolver>,
    access_level: ContainerAccessLevel,
    buffer_size: usize,
    max_buffer_count: usize,
}

impl BlobStorageEngine<AzureBlobBackend> {
    /// Validates the options and connects to the configured storage account.
    pub fn new(options: StorageOptions) -> StorageResult<Self> {
        let resolved = options.validate()?;
        let backend = AzureBlobBackend::from_credentials(&resolved.credentials)?;
        Ok(Self::from_resolved(resolved, Arc::new(backend)))
    }
}

impl<B: BlobBackend> BlobStorageEngine<B> {
    /// Validates the options and stores files through `backend`.
    ///
    /// Credentials are validated like in [`BlobStorageEngine::new`] even though
    /// the backend is already built.
    pub fn with_backend(options: StorageOptions, backend: Arc<B>) -> StorageResult<Self> {
        let resolved = options.validate()?;
        Ok(Self::from_resolved(resolved, backend))
    }

    fn from_resolved(resolved: ResolvedOptions, backend: Arc<B>) -> Self {
        Self {
            backend,
            container_name: resolved.container_name,
            blob_name: resolved.blob_name,
            metadata: resolved.metadata,
            content_settings: resolved.content_settings,
            access_level: resolved.container_access_level,
            buffer_size: resolved.buffer_size,
            max_buffer_count: resolved.max_buffer_count,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    async fn upload_options(&self, req: &RequestContext, info: &FileInfo) -> StorageResult<UploadOptions> {
        let metadata = match &self.metadata {
            Some(resolver) => Some(resolver.resolve(req, info).await?),
            None => None,
        };
        let content_settings = match &self.content_settings {
            Some(resolver) => resolver.resolve(req, info).await?,
            None => ContentSettings::default(),
        };
        Ok(UploadOptions::new(self.buffer_size, self.max_buffer_count, info.content_type())
            .with_metadata(metadata)
            .with_content_settings(content_settings))
    }
}

#[async_trait]
impl<B: BlobBackend> StorageEngine for BlobStorageEngine<B> {
    async fn handle_file(&self, req: &RequestContext, file: IncomingFile) -> StorageResult<StoredFile> {
        let IncomingFile { info, stream } = file;

        let (blob_name, container_name) = futures::try_join!(
            self.blob_name.resolve(req, &info),
            self.container_name.resolve(req, &info),
        )?;
        debug!(
            container = %container_name,
            blob = %blob_name,
            original_name = %info.original_name,
            "resolved upload destination"
        );

        if self
            .backend
            .create_container_if_not_exists(&container_name, self.access_level)
            .await?
        {
            info!(container = %container_name, access = %self.access_level, "created container");
        }

        let options = self.upload_options(req, &info).await?;
        self.backend
            .upload_stream(&container_name, &blob_name, stream, &options)
            .await?;

        let properties = self
            .backend
            .get_blob_properties(&container_name, &blob_name)
            .await?;
        let url = self.backend.blob_url(&container_name, &blob_name)?;
        debug!(
            container = %container_name,
            blob = %blob_name,
            size = properties.content_length,
            "stored upload"
        );

        Ok(StoredFile::new(info, url, container_name, blob_name, properties))
    }

    async fn remove_file(&self, req: &RequestContext, file: &StoredFile) -> StorageResult<()> {
        let container_name = self.container_name.resolve(req, &file.info).await?;

        if !self.backend.container_exists(&container_name).await? {
            warn!(container = %container_name, blob = %file.blob_name, "cannot remove blob from missing container");
            return Err(StorageError::ContainerUnavailable {
                container: container_name,
            });
        }

        let deleted = self
            .backend
            .delete_blob_if_exists(&container_name, &file.blob_name)
            .await?;
        debug!(container = %container_name, blob = %file.blob_name, deleted, "removed upload");
        Ok(())
    }
}

impl<B> fmt::Debug for BlobStorageEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStorageEngine")
            .field("container_name", &self.container_name)
            .field("blob_name", &self.blob_name)
            .field("metadata", &self.metadata)
            .field("content_settings", &self.content_settings)
            .field("access_level", &self.access_level)
            .field("buffer_size", &self.buffer_size)
            .field("max_buffer_count", &self.max_buffer_count)
            .finish_non_exhaustive()
    }
}
