//! Per-upload configuration values: fixed constants or async resolvers.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::{BoxError, StorageError, StorageResult};
use crate::models::{ContentSettings, FileInfo, Metadata, RequestContext};

type ResolveFn<T> =
    dyn Fn(&RequestContext, &FileInfo) -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync;

/// A configuration value that is either fixed or derived per request and file.
pub enum Resolver<T> {
    Constant(T),
    Dynamic(Arc<ResolveFn<T>>),
}

/// Resolves container and blob names.
pub type NameResolver = Resolver<String>;

/// Resolves the metadata stored with each blob.
pub type MetadataResolver = Resolver<Metadata>;

/// Resolves the HTTP headers stored with each blob.
pub type ContentSettingsResolver = Resolver<ContentSettings>;

impl<T> Resolver<T>
where
    T: Clone + Send + 'static,
{
    pub fn constant(value: T) -> Self {
        Resolver::Constant(value)
    }

    /// Wraps an async function of the request and file.
    ///
    /// The function borrows its arguments only while building the future, so
    /// anything the future needs has to be copied out first:
    ///
    /// ```
    /// use azure_blob_uploads::NameResolver;
    ///
    /// let by_kind = NameResolver::from_fn(|_req, file| {
    ///     let kind = file.mime_type.split('/').next().unwrap_or_default().to_string();
    ///     async move { Ok(kind) }
    /// });
    /// ```
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(&RequestContext, &FileInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let resolve = move |req: &RequestContext, file: &FileInfo| -> BoxFuture<'static, Result<T, BoxError>> {
            Box::pin(f(req, file))
        };
        Resolver::Dynamic(Arc::new(resolve))
    }

    pub async fn resolve(&self, req: &RequestContext, file: &FileInfo) -> StorageResult<T> {
        match self {
            Resolver::Constant(value) => Ok(value.clone()),
            Resolver::Dynamic(resolve) => resolve(req, file).await.map_err(StorageError::Resolver),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Resolver::Constant(_))
    }
}

impl Resolver<String> {
    /// Constant names that are empty count as not configured.
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, Resolver::Constant(value) if value.is_empty())
    }
}

impl<T> Clone for Resolver<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Resolver::Constant(value) => Resolver::Constant(value.clone()),
            Resolver::Dynamic(resolve) => Resolver::Dynamic(Arc::clone(resolve)),
        }
    }
}

impl<T> fmt::Debug for Resolver<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Resolver::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for NameResolver {
    fn from(value: &str) -> Self {
        Resolver::Constant(value.to_string())
    }
}

impl From<String> for NameResolver {
    fn from(value: String) -> Self {
        Resolver::Constant(value)
    }
}

impl From<Metadata> for MetadataResolver {
    fn from(value: Metadata) -> Self {
        Resolver::Constant(value)
    }
}

impl From<ContentSettings> for ContentSettingsResolver {
    fn from(value: ContentSettings) -> Self {
        Resolver::Constant(value)
    }
}

/// Builds `<millisecond timestamp>-<uuid v4><original extension>`.
pub fn generate_blob_name(file: &FileInfo) -> String {
    format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4(),
        file.extension()
    )
}

/// Resolver used when no blob name is configured.
pub fn default_blob_name() -> NameResolver {
    NameResolver::from_fn(|_req, file| {
        let name = generate_blob_name(file);
        async move { Ok(name) }
    })
}
