//! Container data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anonymous-read policy applied when the engine creates a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAccessLevel {
    /// No public access; also what `"off"` resolves to.
    #[default]
    Private,
    /// Anonymous read of blobs and container listings.
    Container,
    /// Anonymous read of blobs only.
    Blob,
}

impl ContainerAccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAccessLevel::Private => "",
            ContainerAccessLevel::Container => "container",
            ContainerAccessLevel::Blob => "blob",
        }
    }

    pub fn is_public(&self) -> bool {
        !matches!(self, ContainerAccessLevel::Private)
    }
}

impl FromStr for ContainerAccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "off" | "none" | "private" => Ok(ContainerAccessLevel::Private),
            "container" => Ok(ContainerAccessLevel::Container),
            "blob" => Ok(ContainerAccessLevel::Blob),
            other => Err(format!(
                "invalid container access level '{other}' (expected off, blob or container)"
            )),
        }
    }
}

impl fmt::Display for ContainerAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerAccessLevel::Private => f.write_str("off"),
            level => f.write_str(level.as_str()),
        }
    }
}

/// Container record kept by the in-memory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerModel {
    pub name: String,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub public_access: ContainerAccessLevel,
}

impl ContainerModel {
    pub fn new(name: impl Into<String>, public_access: ContainerAccessLevel) -> Self {
        Self {
            name: name.into(),
            etag: format!("\"0x{}\"", uuid::Uuid::new_v4().simple()),
            last_modified: Utc::now(),
            public_access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_is_private() {
        assert_eq!(
            "off".parse::<ContainerAccessLevel>().unwrap(),
            ContainerAccessLevel::Private
        );
        assert_eq!(
            "".parse::<ContainerAccessLevel>().unwrap(),
            ContainerAccessLevel::Private
        );
        assert!(!ContainerAccessLevel::Private.is_public());
    }

    #[test]
    fn test_public_levels() {
        assert_eq!(
            "Blob".parse::<ContainerAccessLevel>().unwrap(),
            ContainerAccessLevel::Blob
        );
        assert_eq!(
            "container".parse::<ContainerAccessLevel>().unwrap(),
            ContainerAccessLevel::Container
        );
        assert!("public".parse::<ContainerAccessLevel>().is_err());
    }
}
