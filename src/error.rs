use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("could not create {name}: {source}")]
    Create { name: String, source: io::Error },

    #[error("could not delete {name}: {source}")]
    Delete { name: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("folder selection cancelled")]
    Cancelled,

    #[error("choosing a folder is not supported on this platform")]
    Unsupported,

    #[error("{0} is not a writable directory")]
    NotWritable(PathBuf),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
