use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("i/o failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed csv in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid partition label: {0:?}")]
    InvalidPartition(String),
    #[error("test name must not be empty")]
    EmptyTestName,
    #[error("corrupt table {path:?}: {reason}")]
    CorruptTable { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        LedgerError::Csv {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from the filesystem rather than from the data.
    pub fn is_io(&self) -> bool {
        match self {
            LedgerError::Io { .. } => true,
            LedgerError::Csv { source, .. } => source.is_io_error(),
            _ => false,
        }
    }
}
