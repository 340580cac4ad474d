use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("malformed data in {}: {source}", .path.display())]
    MalformedData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value{}: {source}", .key.as_deref().map(|k| format!(" for key {k}")).unwrap_or_default())]
    InvalidValue {
        key: Option<String>,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn key_not_found(key: &str) -> Self { Self::KeyNotFound(key.to_string()) }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedData { path: path.into(), source }
    }

    pub(crate) fn invalid_value(key: Option<&str>, source: serde_json::Error) -> Self {
        Self::InvalidValue { key: key.map(str::to_string), source }
    }

    pub fn is_key_not_found(&self) -> bool { matches!(self, Self::KeyNotFound(_)) }
    pub fn is_malformed(&self) -> bool { matches!(self, Self::MalformedData { .. }) }
    pub fn is_invalid_value(&self) -> bool { matches!(self, Self::InvalidValue { .. }) }
    pub fn is_io(&self) -> bool { matches!(self, Self::Io { .. }) }
}
