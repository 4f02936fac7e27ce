//! Azure Blob Storage engine for file uploads.
//!
//! The engine takes files handed over by an upload middleware, works out a
//! container and blob name for each one, makes sure the container exists, and
//! streams the bytes into a block blob without buffering the whole file.
//!
//! # Example
//!
//! ```no_run
//! use azure_blob_uploads::{BlobStorageEngine, FileInfo, IncomingFile, StorageEngine, StorageOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let engine = BlobStorageEngine::new(
//!         StorageOptions::new()
//!             .connection_string(std::env::var("AZURE_STORAGE_CONNECTION_STRING")?)
//!             .container_name("uploads"),
//!     )?;
//!
//!     let (req, _) = http::Request::post("/upload").body(())?.into_parts();
//!     let file = IncomingFile::new(
//!         FileInfo::new("notes.txt", "text/plain"),
//!         std::io::Cursor::new(b"hello".to_vec()),
//!     );
//!     let stored = engine.handle_file(&req, file).await?;
//!     println!("stored at {}", stored.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod resolver;
pub mod storage;

// Re-exports for convenience
pub use config::{
    Credentials, ResolvedOptions, StorageArgs, StorageOptions, DEFAULT_BUFFER_SIZE_MB,
    DEFAULT_MAX_BUFFER_COUNT,
};
pub use engine::{BlobStorageEngine, StorageEngine};
pub use error::{
    BoxError, ConfigError, ErrorCode, MissingParameter, StorageError, StorageResult,
    CONTAINER_UNAVAILABLE_MESSAGE,
};
pub use models::{
    ContainerAccessLevel, ContentSettings, FileInfo, IncomingFile, Metadata, RequestContext,
    StoredFile,
};
pub use resolver::{ContentSettingsResolver, MetadataResolver, NameResolver, Resolver};
pub use storage::{AzureBlobBackend, BlobBackend, MemoryBlobBackend};
