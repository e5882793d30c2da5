use std::path::PathBuf;

use crate::object::ObjectKind;
use crate::Hash;

/// error type for arbor operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no arbor repository found in {0} or any parent directory")]
    RepositoryNotFound(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("{kind} not found: {hash}")]
    ObjectNotFound { kind: ObjectKind, hash: Hash },

    #[error("corrupt {kind} {hash}: {reason}")]
    CorruptObject {
        kind: ObjectKind,
        hash: Hash,
        reason: String,
    },

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntry(String),

    #[error("incomplete object: {0}")]
    IncompleteObject(String),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("HEAD not found: nothing has been committed yet")]
    HeadNotFound,

    #[error("corrupt HEAD: {0}")]
    CorruptHead(String),

    #[error("corrupt ref {name}: {reason}")]
    CorruptRef { name: String, reason: String },

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("invalid object type: {0}")]
    InvalidObjectType(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("integrity check failed: {corrupt} corrupt, {missing} missing objects")]
    IntegrityCheckFailed { corrupt: usize, missing: usize },

    #[error("lock contention on repository")]
    LockContention,

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
