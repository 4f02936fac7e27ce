//! In-process model of the blob service.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use url::Url;

use super::{read_block, BlobBackend};
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{
    BlobModel, BlobProperties, ByteSource, ContainerAccessLevel, ContainerModel, UploadOptions,
};

/// Default account name for development storage.
pub const DEFAULT_ACCOUNT: &str = "devstoreaccount1";

/// Default endpoint of a local blob service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:10000";

/// Characters escaped in blob names when building URLs; `/` stays literal.
const BLOB_NAME_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Key type for blobs - uses Arc<str> to avoid allocations.
type BlobKey = (Arc<str>, Arc<str>);

/// In-memory blob service with the service's container and blob semantics.
pub struct MemoryBlobBackend {
    account: String,
    endpoint: String,
    /// Containers indexed by name.
    containers: DashMap<Arc<str>, ContainerModel>,
    /// Blobs indexed by (container, name).
    blobs: DashMap<BlobKey, BlobModel>,
    /// Number of blob deletions actually performed.
    deletes: AtomicUsize,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ACCOUNT, DEFAULT_ENDPOINT)
    }

    /// Creates a backend whose URLs look like `{endpoint}/{account}/{container}/{blob}`.
    pub fn with_endpoint(account: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            containers: DashMap::new(),
            blobs: DashMap::new(),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Returns a copy of a container record.
    pub fn container(&self, name: &str) -> Option<ContainerModel> {
        self.containers.get(name).map(|c| c.value().clone())
    }

    /// Returns a copy of a stored blob.
    pub fn blob(&self, container: &str, name: &str) -> Option<BlobModel> {
        self.blobs
            .get(&Self::blob_key(container, name))
            .map(|b| b.value().clone())
    }

    /// Stores a blob directly, bypassing the streaming path.
    pub fn put_blob(&self, container: &str, name: &str, data: Bytes, options: &UploadOptions) -> StorageResult<()> {
        if !self.containers.contains_key(container) {
            return Err(StorageError::new(ErrorCode::ContainerNotFound));
        }
        let blob = BlobModel::new(container, name, vec![data], options);
        self.blobs.insert(Self::blob_key(container, name), blob);
        Ok(())
    }

    /// Names of the blobs in a container, sorted.
    pub fn list_blobs(&self, container: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .blobs
            .iter()
            .filter(|entry| entry.key().0.as_ref() == container)
            .map(|entry| entry.key().1.to_string())
            .collect();
        names.sort();
        names
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::Relaxed)
    }

    #[inline]
    fn blob_key(container: &str, name: &str) -> BlobKey {
        (Arc::from(container), Arc::from(name))
    }

    fn validate_container_name(name: &str) -> StorageResult<()> {
        static CONTAINER_NAME: OnceLock<Regex> = OnceLock::new();
        let re = CONTAINER_NAME
            .get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid container regex"));
        let valid_length = (3..=63).contains(&name.len());
        if name == "$root" || (valid_length && re.is_match(name)) {
            Ok(())
        } else {
            Err(StorageError::with_message(
                ErrorCode::InvalidResourceName,
                format!("The specified container name '{name}' is invalid."),
            ))
        }
    }

    fn validate_blob_name(name: &str) -> StorageResult<()> {
        if name.is_empty() || name.len() > 1024 {
            return Err(StorageError::with_message(
                ErrorCode::InvalidResourceName,
                "Blob names must be between 1 and 1024 characters long.",
            ));
        }
        Ok(())
    }
}

impl Default for MemoryBlobBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn container_exists(&self, container: &str) -> StorageResult<bool> {
        Ok(self.containers.contains_key(container))
    }

    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccessLevel,
    ) -> StorageResult<bool> {
        Self::validate_container_name(container)?;
        let mut created = false;
        self.containers.entry(Arc::from(container)).or_insert_with(|| {
            created = true;
            ContainerModel::new(container, access)
        });
        Ok(created)
    }

    async fn upload_stream(
        &self,
        container: &str,
        blob: &str,
        mut source: ByteSource,
        options: &UploadOptions,
    ) -> StorageResult<()> {
        Self::validate_blob_name(blob)?;
        if !self.containers.contains_key(container) {
            return Err(StorageError::new(ErrorCode::ContainerNotFound));
        }

        // Blocks stay uncommitted until the source is drained; a failed read
        // leaves any previous version of the blob in place.
        let mut staged = Vec::new();
        while let Some(block) = read_block(&mut source, options.buffer_size).await? {
            staged.push(block);
        }
        if staged.is_empty() {
            staged.push(Bytes::new());
        }

        if !self.containers.contains_key(container) {
            return Err(StorageError::new(ErrorCode::ContainerNotFound));
        }
        let model = BlobModel::new(container, blob, staged, options);
        self.blobs.insert(Self::blob_key(container, blob), model);
        Ok(())
    }

    async fn get_blob_properties(&self, container: &str, blob: &str) -> StorageResult<BlobProperties> {
        if !self.containers.contains_key(container) {
            return Err(StorageError::new(ErrorCode::ContainerNotFound));
        }
        self.blobs
            .get(&Self::blob_key(container, blob))
            .map(|b| b.properties.clone())
            .ok_or_else(|| StorageError::new(ErrorCode::BlobNotFound))
    }

    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool> {
        if !self.containers.contains_key(container) {
            return Err(StorageError::new(ErrorCode::ContainerNotFound));
        }
        let removed = self.blobs.remove(&Self::blob_key(container, blob)).is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    fn blob_url(&self, container: &str, blob: &str) -> StorageResult<Url> {
        let blob = utf8_percent_encode(blob, BLOB_NAME_ESCAPE);
        let url = format!("{}/{}/{container}/{blob}", self.endpoint, self.account);
        Url::parse(&url).map_err(|e| {
            StorageError::with_message(ErrorCode::InvalidResourceName, format!("invalid blob url: {e}"))
        })
    }
}
