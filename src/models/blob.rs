//! Blob data models.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User-defined metadata attached to a blob.
pub type Metadata = HashMap<String, String>;

/// Blob types supported by Azure Blob Storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobType {
    BlockBlob,
    PageBlob,
    AppendBlob,
}

impl BlobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobType::BlockBlob => "BlockBlob",
            BlobType::PageBlob => "PageBlob",
            BlobType::AppendBlob => "AppendBlob",
        }
    }
}

/// Standard HTTP headers stored with a blob, besides its content type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSettings {
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
}

impl ContentSettings {
    pub fn is_empty(&self) -> bool {
        self.content_disposition.is_none()
            && self.content_encoding.is_none()
            && self.content_language.is_none()
    }
}

/// Per-call settings for a streaming upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Largest block read from the source before it is staged.
    pub buffer_size: usize,
    /// Upper bound on blocks staged concurrently.
    pub max_buffers: usize,
    pub content_type: String,
    pub metadata: Option<Metadata>,
    pub content_settings: ContentSettings,
}

impl UploadOptions {
    pub fn new(buffer_size: usize, max_buffers: usize, content_type: impl Into<String>) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            max_buffers: max_buffers.max(1),
            content_type: content_type.into(),
            metadata: None,
            content_settings: ContentSettings::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_content_settings(mut self, settings: ContentSettings) -> Self {
        self.content_settings = settings;
        self
    }
}

/// Properties reported by the service for a stored blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobProperties {
    pub etag: String,
    pub blob_type: BlobType,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub metadata: Metadata,
}

/// Blob record kept by the in-memory backend.
#[derive(Debug, Clone)]
pub struct BlobModel {
    pub container: String,
    pub name: String,
    pub properties: BlobProperties,
    pub content_settings: ContentSettings,
    pub last_modified: DateTime<Utc>,
    /// Committed blocks in order; a single-put upload has exactly one.
    pub blocks: Vec<Bytes>,
}

impl BlobModel {
    pub fn new(container: impl Into<String>, name: impl Into<String>, blocks: Vec<Bytes>, options: &UploadOptions) -> Self {
        let content_length = blocks.iter().map(|b| b.len() as u64).sum();
        Self {
            container: container.into(),
            name: name.into(),
            properties: BlobProperties {
                etag: format!("\"0x{}\"", uuid::Uuid::new_v4().simple()),
                blob_type: BlobType::BlockBlob,
                content_length,
                content_type: Some(options.content_type.clone()),
                metadata: options.metadata.clone().unwrap_or_default(),
            },
            content_settings: options.content_settings.clone(),
            last_modified: Utc::now(),
            blocks,
        }
    }

    /// Returns the blob content as one contiguous buffer.
    pub fn content(&self) -> Bytes {
        if self.blocks.len() == 1 {
            return self.blocks[0].clone();
        }
        let mut out = Vec::with_capacity(self.properties.content_length as usize);
        for block in &self.blocks {
            out.extend_from_slice(block);
        }
        Bytes::from(out)
    }
}
