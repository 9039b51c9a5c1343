//! Error types for the wiki core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WikiError {
    /// The vault root is missing or not a directory
    #[error("Vault path '{0}' is not a valid directory")]
    VaultNotFound(PathBuf),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another page already owns this slug
    #[error("A page with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("Invalid title '{0}': it must contain at least one letter or digit")]
    InvalidTitle(String),

    #[error("Content is required")]
    EmptyContent,

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl WikiError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for WikiError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;
