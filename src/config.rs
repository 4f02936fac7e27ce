//! Engine configuration.

use clap::Parser;
use std::fmt;

use crate::error::{ConfigError, MissingParameter};
use crate::models::ContainerAccessLevel;
use crate::resolver::{
    default_blob_name, ContentSettingsResolver, MetadataResolver, NameResolver,
};

/// Default size of each streamed block, in megabytes.
pub const DEFAULT_BUFFER_SIZE_MB: usize = 4;

/// Default number of blocks kept in flight during an upload.
pub const DEFAULT_MAX_BUFFER_COUNT: usize = 20;

/// Environment variable consulted for the account name by [`StorageArgs`].
pub const ACCOUNT_NAME_ENV: &str = "AZURE_STORAGE_ACCOUNT";

/// Environment variable consulted for the access key by [`StorageArgs`].
pub const ACCESS_KEY_ENV: &str = "AZURE_STORAGE_ACCESS_KEY";

/// Environment variable consulted for the connection string by [`StorageArgs`].
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

/// Command-line arguments for applications hosting the engine.
///
/// Credential flags fall back to the usual Azure environment variables, so
/// the application resolves them once at startup and hands plain values to
/// [`StorageOptions`].
#[derive(Parser, Clone)]
#[command(name = "azure-blob-uploads")]
#[command(about = "Store uploaded files in Azure Blob Storage")]
pub struct StorageArgs {
    /// Storage account name.
    #[arg(long, env = ACCOUNT_NAME_ENV)]
    pub account_name: Option<String>,

    /// Storage account access key.
    #[arg(long, env = ACCESS_KEY_ENV, hide_env_values = true)]
    pub access_key: Option<String>,

    /// Connection string; preferred over account name and key.
    #[arg(long, env = CONNECTION_STRING_ENV, hide_env_values = true)]
    pub connection_string: Option<String>,

    /// Container that receives uploads.
    #[arg(long)]
    pub container_name: Option<String>,

    /// Public access level for created containers (off, blob, container).
    #[arg(long)]
    pub container_access_level: Option<ContainerAccessLevel>,

    /// Size of each streamed block in megabytes.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE_MB)]
    pub buffer_size_in_mb: usize,

    /// Blocks kept in flight during an upload.
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER_COUNT)]
    pub max_buffer_count: usize,
}

impl Default for StorageArgs {
    fn default() -> Self {
        Self {
            account_name: None,
            access_key: None,
            connection_string: None,
            container_name: None,
            container_access_level: None,
            buffer_size_in_mb: DEFAULT_BUFFER_SIZE_MB,
            max_buffer_count: DEFAULT_MAX_BUFFER_COUNT,
        }
    }
}

impl fmt::Debug for StorageArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageArgs")
            .field("account_name", &self.account_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("connection_string", &self.connection_string.as_ref().map(|_| "***"))
            .field("container_name", &self.container_name)
            .field("container_access_level", &self.container_access_level)
            .field("buffer_size_in_mb", &self.buffer_size_in_mb)
            .field("max_buffer_count", &self.max_buffer_count)
            .finish()
    }
}

/// Credential fields as supplied; any of them may be missing.
#[derive(Clone, Default)]
pub struct CredentialOptions {
    pub account_name: Option<String>,
    pub access_key: Option<String>,
    pub connection_string: Option<String>,
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOptions")
            .field("account_name", &self.account_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("connection_string", &self.connection_string.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Validated credentials used to build the blob service client.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ConnectionString(String),
    AccessKey { account: String, key: String },
}

impl Credentials {
    /// Account name, when it can be read without contacting the service.
    pub fn account_name(&self) -> Option<&str> {
        match self {
            Credentials::AccessKey { account, .. } => Some(account),
            Credentials::ConnectionString(conn) => conn
                .split(';')
                .find_map(|part| part.trim().strip_prefix("AccountName=")),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ConnectionString(_) => f.write_str("ConnectionString(***)"),
            Credentials::AccessKey { account, .. } => f
                .debug_struct("AccessKey")
                .field("account", account)
                .field("key", &"***")
                .finish(),
        }
    }
}

/// Engine options; build with the setters and hand to the engine constructor.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub credentials: CredentialOptions,
    pub container_name: Option<NameResolver>,
    pub blob_name: Option<NameResolver>,
    pub metadata: Option<MetadataResolver>,
    pub content_settings: Option<ContentSettingsResolver>,
    pub container_access_level: Option<ContainerAccessLevel>,
    pub buffer_size_in_mb: usize,
    pub max_buffer_count: usize,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            credentials: CredentialOptions::default(),
            container_name: None,
            blob_name: None,
            metadata: None,
            content_settings: None,
            container_access_level: None,
            buffer_size_in_mb: DEFAULT_BUFFER_SIZE_MB,
            max_buffer_count: DEFAULT_MAX_BUFFER_COUNT,
        }
    }
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both shared-key credential fields.
    pub fn account(self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.account_name(name).access_key(key)
    }

    pub fn account_name(mut self, name: impl Into<String>) -> Self {
        self.credentials.account_name = Some(name.into());
        self
    }

    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.credentials.access_key = Some(key.into());
        self
    }

    pub fn connection_string(mut self, conn: impl Into<String>) -> Self {
        self.credentials.connection_string = Some(conn.into());
        self
    }

    pub fn container_name(mut self, name: impl Into<NameResolver>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    pub fn blob_name(mut self, name: impl Into<NameResolver>) -> Self {
        self.blob_name = Some(name.into());
        self
    }

    pub fn metadata(mut self, metadata: impl Into<MetadataResolver>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn content_settings(mut self, settings: impl Into<ContentSettingsResolver>) -> Self {
        self.content_settings = Some(settings.into());
        self
    }

    pub fn container_access_level(mut self, level: ContainerAccessLevel) -> Self {
        self.container_access_level = Some(level);
        self
    }

    pub fn buffer_size_in_mb(mut self, size: usize) -> Self {
        self.buffer_size_in_mb = size;
        self
    }

    pub fn max_buffer_count(mut self, count: usize) -> Self {
        self.max_buffer_count = count;
        self
    }

    /// Checks required fields and normalizes the rest.
    ///
    /// A connection string replaces the account name and key. The container
    /// name is always required. Every violation is reported, not only the
    /// first one.
    pub fn validate(self) -> Result<ResolvedOptions, ConfigError> {
        let mut missing = Vec::new();

        let credentials = match present(self.credentials.connection_string) {
            Some(conn) => Some(Credentials::ConnectionString(conn)),
            None => {
                let key = present(self.credentials.access_key);
                let account = present(self.credentials.account_name);
                if key.is_none() {
                    missing.push(MissingParameter::AccessKey);
                }
                if account.is_none() {
                    missing.push(MissingParameter::AccountName);
                }
                match (account, key) {
                    (Some(account), Some(key)) => Some(Credentials::AccessKey { account, key }),
                    _ => None,
                }
            }
        };

        let container_name = self.container_name.filter(|name| !name.is_blank());
        if container_name.is_none() {
            missing.push(MissingParameter::ContainerName);
        }

        match (credentials, container_name) {
            (Some(credentials), Some(container_name)) => {
                Ok(ResolvedOptions {
                    credentials,
                    container_name,
                    blob_name: self.blob_name.unwrap_or_else(default_blob_name),
                    metadata: self.metadata,
                    content_settings: self.content_settings,
                    container_access_level: self.container_access_level.unwrap_or_default(),
                    buffer_size: self.buffer_size_in_mb.max(1) * 1024 * 1024,
                    max_buffer_count: self.max_buffer_count.max(1),
                })
            }
            _ => Err(ConfigError::new(missing)),
        }
    }
}

impl From<StorageArgs> for StorageOptions {
    fn from(args: StorageArgs) -> Self {
        Self {
            credentials: CredentialOptions {
                account_name: args.account_name,
                access_key: args.access_key,
                connection_string: args.connection_string,
            },
            container_name: args.container_name.map(NameResolver::from),
            container_access_level: args.container_access_level,
            buffer_size_in_mb: args.buffer_size_in_mb,
            max_buffer_count: args.max_buffer_count,
            ..Self::default()
        }
    }
}

/// Options after validation; every field has its final value.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub credentials: Credentials,
    pub container_name: NameResolver,
    pub blob_name: NameResolver,
    pub metadata: Option<MetadataResolver>,
    pub content_settings: Option<ContentSettingsResolver>,
    pub container_access_level: ContainerAccessLevel,
    /// Block size in bytes.
    pub buffer_size: usize,
    pub max_buffer_count: usize,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
