use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot scan {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("no such container: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("compose manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),
}

pub type Result<T> = std::result::Result<T, CheckError>;
