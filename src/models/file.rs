//! File descriptors exchanged with the host upload middleware.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncRead;

use super::blob::{BlobProperties, Metadata};

/// Request context handed to resolvers: the head of the upload request.
pub type RequestContext = http::request::Parts;

/// Byte source of an incoming file.
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// Descriptive fields of an uploaded file, as reported by the multipart parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Form field the file was sent under.
    pub field_name: String,
    /// File name on the client's machine.
    pub original_name: String,
    /// Transfer encoding of the part, e.g. `7bit`.
    pub encoding: String,
    /// MIME type of the part, e.g. `image/png`.
    pub mime_type: String,
}

impl FileInfo {
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Returns the extension of the original name including its leading dot,
    /// or an empty string when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Parsed MIME type, if the reported one is well formed.
    pub fn mime(&self) -> Option<mime::Mime> {
        self.mime_type.parse().ok()
    }

    /// Content type to store with the blob.
    pub fn content_type(&self) -> String {
        match self.mime() {
            Some(mime) => mime.to_string(),
            None => mime::APPLICATION_OCTET_STREAM.to_string(),
        }
    }
}

/// A file being uploaded: its descriptor plus the stream of its bytes.
pub struct IncomingFile {
    pub info: FileInfo,
    pub stream: ByteSource,
}

impl IncomingFile {
    pub fn new(info: FileInfo, stream: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            info,
            stream: Box::new(stream),
        }
    }
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Descriptor returned to the host after a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(flatten)]
    pub info: FileInfo,
    pub url: String,
    pub blob_name: String,
    pub container_name: String,
    pub etag: String,
    pub blob_type: String,
    pub blob_size: u64,
    pub metadata: Metadata,
}

impl StoredFile {
    pub fn new(
        info: FileInfo,
        url: impl Into<String>,
        container_name: impl Into<String>,
        blob_name: impl Into<String>,
        properties: BlobProperties,
    ) -> Self {
        Self {
            info,
            url: url.into(),
            blob_name: blob_name.into(),
            container_name: container_name.into(),
            etag: properties.etag,
            blob_type: properties.blob_type.as_str().to_string(),
            blob_size: properties.content_length,
            metadata: properties.metadata,
        }
    }
}
