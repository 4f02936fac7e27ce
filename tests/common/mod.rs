//! Common test utilities.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use azure_blob_uploads::{
    BlobStorageEngine, FileInfo, IncomingFile, MemoryBlobBackend, RequestContext, StorageOptions,
};

/// Account used by every in-memory engine.
pub const ACCOUNT: &str = "devstoreaccount1";

/// Development storage key.
pub const ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Installs a log subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Options with valid credentials and nothing else set.
pub fn options() -> StorageOptions {
    StorageOptions::new().account(ACCOUNT, ACCOUNT_KEY)
}

/// Engine over a fresh in-memory backend.
pub fn engine(options: StorageOptions) -> (BlobStorageEngine<MemoryBlobBackend>, Arc<MemoryBlobBackend>) {
    init_tracing();
    let backend = Arc::new(MemoryBlobBackend::new());
    let engine = BlobStorageEngine::with_backend(options, backend.clone()).unwrap();
    (engine, backend)
}

/// Request head of a `POST /upload`.
pub fn request() -> RequestContext {
    http::Request::post("/upload")
        .header("x-tenant", "acme")
        .body(())
        .unwrap()
        .into_parts()
        .0
}

/// Incoming file backed by an in-memory buffer.
pub fn file(name: &str, mime_type: &str, data: impl Into<Vec<u8>>) -> IncomingFile {
    IncomingFile::new(
        FileInfo::new(name, mime_type)
            .with_field_name("upload")
            .with_encoding("7bit"),
        io::Cursor::new(data.into()),
    )
}

/// Reader that yields `data` and then fails with `kind`.
pub struct FailingReader {
    data: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingReader {
    pub fn new(data: impl Into<Vec<u8>>, kind: io::ErrorKind) -> Self {
        Self {
            data: io::Cursor::new(data.into()),
            kind,
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let remaining = self.data.get_ref().len() as u64 - self.data.position();
        if remaining == 0 {
            let kind = self.kind;
            return Poll::Ready(Err(io::Error::new(kind, "connection reset by client")));
        }
        Pin::new(&mut self.data).poll_read(cx, buf)
    }
}
