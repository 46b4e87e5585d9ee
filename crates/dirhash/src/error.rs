use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirhashError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported hash algorithm '{0}' (supported: md5, sha1, sha224, sha256, sha384, sha512)")]
    UnsupportedAlgorithm(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Not an inventory database: {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("Algorithm mismatch: expected {expected}, inventory {path} uses {found}")]
    AlgorithmMismatch {
        expected: String,
        found: String,
        path: PathBuf,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("User input error: {0}")]
    UserInput(String),
}

impl DirhashError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DirhashError::FileIo {
            path: path.into(),
            source,
        }
    }
}

impl From<dialoguer::Error> for DirhashError {
    fn from(err: dialoguer::Error) -> Self {
        DirhashError::UserInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DirhashError>;
