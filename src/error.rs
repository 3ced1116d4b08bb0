use std::path::{Path, PathBuf};

use thiserror::Error;

pub type C3poResult<T> = Result<T, C3poError>;

#[derive(Error, Debug)]
pub enum C3poError {
    /// Malformed catalog record.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// Malformed metadata record in the metadata side-table.
    #[error("invalid metadata for {file} at row {row}: {message}")]
    Metadata {
        file: String,
        row: usize,
        message: String,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("delimited text error: {0}")]
    Csv(#[from] csv::Error),

    #[error("remote document error: {0}")]
    Remote(String),

    #[error("spreadsheet encoding error: {0}")]
    Document(String),

    #[error("invalid settings: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git error: {0}")]
    Vcs(String),
}

impl C3poError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        C3poError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        C3poError::Parse {
            path: path.as_ref().display().to_string(),
            line,
            message: message.into(),
        }
    }
}
