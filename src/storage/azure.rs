//! Azure Blob Storage backend built on the official SDK.

use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::request_options::Metadata as RequestMetadata;
use azure_core::StatusCode;
use azure_storage::clients::EMULATOR_ACCOUNT;
use azure_storage::{CloudLocation, ConnectionString, EndpointProtocol, StorageCredentials};
use azure_storage_blobs::blob::BlobType as ServiceBlobType;
use azure_storage_blobs::container::PublicAccess;
use azure_storage_blobs::prelude::*;
use futures::{future, stream, StreamExt, TryStreamExt};
use std::fmt;
use tracing::debug;
use url::Url;

use super::{block_id, block_stream, read_block, BlobBackend};
use crate::config::Credentials;
use crate::error::{StorageError, StorageResult};
use crate::models::{
    BlobProperties, BlobType, ByteSource, ContainerAccessLevel, ContentSettings, Metadata,
    UploadOptions,
};

/// Applies content type, metadata, and content settings to a put or commit builder.
macro_rules! with_blob_headers {
    ($builder:expr, $options:expr) => {{
        let options: &UploadOptions = $options;
        let mut builder = $builder.content_type(options.content_type.clone());
        if let Some(metadata) = &options.metadata {
            builder = builder.metadata(request_metadata(metadata));
        }
        let ContentSettings {
            content_disposition,
            content_encoding,
            content_language,
        } = options.content_settings.clone();
        if let Some(value) = content_disposition {
            builder = builder.content_disposition(value);
        }
        if let Some(value) = content_encoding {
            builder = builder.content_encoding(value);
        }
        if let Some(value) = content_language {
            builder = builder.content_language(value);
        }
        builder
    }};
}

/// Blob backend talking to an Azure storage account (or a compatible emulator).
#[derive(Clone)]
pub struct AzureBlobBackend {
    account: String,
    service: BlobServiceClient,
}

impl AzureBlobBackend {
    /// Builds the service client from whichever credential form was supplied.
    ///
    /// A connection string may point elsewhere than the public cloud through
    /// `BlobEndpoint`, `EndpointSuffix` or `UseDevelopmentStorage=true`.
    pub fn from_credentials(credentials: &Credentials) -> StorageResult<Self> {
        match credentials {
            Credentials::AccessKey { account, key } => {
                let storage_credentials = StorageCredentials::access_key(account.clone(), key.clone());
                let service = ClientBuilder::new(account.clone(), storage_credentials).blob_service_client();
                Ok(Self {
                    account: account.clone(),
                    service,
                })
            }
            Credentials::ConnectionString(conn) => {
                let parsed = ConnectionString::new(conn)?;
                if parsed.use_development_storage == Some(true) {
                    debug!(account = EMULATOR_ACCOUNT, "using development storage");
                    return Ok(Self {
                        account: EMULATOR_ACCOUNT.to_string(),
                        service: ClientBuilder::emulator().blob_service_client(),
                    });
                }
                let storage_credentials = parsed.storage_credentials()?;
                let location = cloud_location(&parsed)?;
                let account = location.account().to_string();
                debug!(account = %account, "using connection string credentials");
                Ok(Self {
                    account,
                    service: ClientBuilder::with_location(location, storage_credentials)
                        .blob_service_client(),
                })
            }
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn container_client(&self, container: &str) -> ContainerClient {
        self.service.container_client(container)
    }

    pub fn blob_client(&self, container: &str, blob: &str) -> BlobClient {
        self.container_client(container).blob_client(blob)
    }
}

impl fmt::Debug for AzureBlobBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobBackend")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BlobBackend for AzureBlobBackend {
    async fn container_exists(&self, container: &str) -> StorageResult<bool> {
        Ok(self.container_client(container).exists().await?)
    }

    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccessLevel,
    ) -> StorageResult<bool> {
        let mut create = self.container_client(container).create();
        if let Some(access) = public_access(access) {
            create = create.public_access(access);
        }
        match create.await {
            Ok(_) => Ok(true),
            Err(err) if has_status(&err, StatusCode::Conflict) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn upload_stream(
        &self,
        container: &str,
        blob: &str,
        mut source: ByteSource,
        options: &UploadOptions,
    ) -> StorageResult<()> {
        let client = self.blob_client(container, blob);
        let first = read_block(&mut source, options.buffer_size)
            .await?
            .unwrap_or_default();

        // Everything fit in one buffer: a single put is enough.
        if first.len() < options.buffer_size {
            debug!(container, blob, bytes = first.len(), "uploading blob in a single put");
            let put = with_blob_headers!(client.put_block_blob(first), options);
            put.await?;
            return Ok(());
        }

        let mut index = 0;
        let block_ids: Vec<String> = stream::once(future::ready(Ok(first)))
            .chain(block_stream(source, options.buffer_size))
            .map_err(StorageError::from)
            .map_ok(|block| {
                let id = block_id(index);
                index += 1;
                let client = client.clone();
                async move {
                    client.put_block(id.clone(), block).await?;
                    Ok::<_, StorageError>(id)
                }
            })
            .try_buffered(options.max_buffers)
            .try_collect()
            .await?;

        debug!(container, blob, blocks = block_ids.len(), "committing block list");
        let block_list = BlockList {
            blocks: block_ids
                .into_iter()
                .map(BlobBlockType::new_uncommitted)
                .collect(),
        };
        let commit = with_blob_headers!(client.put_block_list(block_list), options);
        commit.await?;
        Ok(())
    }

    async fn get_blob_properties(&self, container: &str, blob: &str) -> StorageResult<BlobProperties> {
        let response = self.blob_client(container, blob).get_properties().await?;
        let blob = response.blob;
        let content_type = blob.properties.content_type;
        Ok(BlobProperties {
            etag: blob.properties.etag.to_string(),
            blob_type: blob_type(blob.properties.blob_type),
            content_length: blob.properties.content_length,
            content_type: (!content_type.is_empty()).then_some(content_type),
            metadata: blob.metadata.unwrap_or_default(),
        })
    }

    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool> {
        match self.blob_client(container, blob).delete().await {
            Ok(_) => Ok(true),
            Err(err) if has_status(&err, StatusCode::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn blob_url(&self, container: &str, blob: &str) -> StorageResult<Url> {
        Ok(self.blob_client(container, blob).url()?)
    }
}

/// Where a parsed connection string points the blob service.
///
/// `BlobEndpoint` wins; otherwise the endpoint is built from the account,
/// `EndpointSuffix` and `DefaultEndpointsProtocol`.
fn cloud_location(parsed: &ConnectionString<'_>) -> azure_core::Result<CloudLocation> {
    let account = parsed.account_name.unwrap_or_default().to_string();
    if let Some(uri) = parsed.blob_endpoint {
        return Ok(CloudLocation::Custom {
            account,
            uri: uri.trim_end_matches('/').to_string(),
        });
    }
    if account.is_empty() {
        return Err(azure_core::Error::message(
            ErrorKind::Credential,
            "connection string needs an AccountName or a BlobEndpoint",
        ));
    }
    match (&parsed.default_endpoints_protocol, parsed.endpoint_suffix) {
        (None | Some(EndpointProtocol::Https), None) => Ok(CloudLocation::Public { account }),
        (protocol, suffix) => {
            let protocol = protocol.as_ref().unwrap_or(&EndpointProtocol::Https);
            let suffix = suffix.unwrap_or("core.windows.net").trim_matches('.');
            let uri = format!("{protocol}://{account}.blob.{suffix}");
            Ok(CloudLocation::Custom { account, uri })
        }
    }
}

fn blob_type(kind: ServiceBlobType) -> BlobType {
    match kind {
        ServiceBlobType::BlockBlob => BlobType::BlockBlob,
        ServiceBlobType::PageBlob => BlobType::PageBlob,
        ServiceBlobType::AppendBlob => BlobType::AppendBlob,
    }
}

fn public_access(access: ContainerAccessLevel) -> Option<PublicAccess> {
    match access {
        ContainerAccessLevel::Private => None,
        ContainerAccessLevel::Container => Some(PublicAccess::Container),
        ContainerAccessLevel::Blob => Some(PublicAccess::Blob),
    }
}

fn request_metadata(metadata: &Metadata) -> RequestMetadata {
    let mut out = RequestMetadata::new();
    for (key, value) in metadata {
        out.insert(key.clone(), value.clone());
    }
    out
}

fn has_status(err: &azure_core::Error, expected: StatusCode) -> bool {
    matches!(err.kind(), ErrorKind::HttpResponse { status, .. } if *status == expected)
}
