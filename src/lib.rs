//! arbor - minimal content-addressed snapshot store
//!
//! snapshots a directory tree into immutable, content-addressed objects and
//! reconstructs it later.
//!
//! # Core concepts
//!
//! - **Blob**: one file's bytes, `BLOB <len>\0<content>`
//! - **Tree**: one directory's sorted listing, `TREE <path>\0<name> <KIND> <hash>\n...`
//! - **Commit**: a timestamped root tree, `COMMIT <unix-time>\0<tree-hash>`
//! - **Ref**: a named pointer to a commit, `REF <name>\0<commit-hash>`
//! - **HEAD**: plain text `<ref>@<commit-hash>`, the current snapshot
//!
//! # Storage
//!
//! objects are keyed by the SHA-256 of their canonical bytes, deflated and
//! written once to `.arbor/<kind>s/<hash[0:2]>/<hash[2:]>`. identical file
//! contents share one blob regardless of path.
//!
//! # Example usage
//!
//! ```no_run
//! use arbor::{ops, Repo};
//! use std::path::Path;
//!
//! // initialize a repository in a worktree
//! let repo = Repo::init(Path::new("/path/to/worktree")).unwrap();
//!
//! // snapshot the worktree
//! let hash = ops::commit(&repo).unwrap();
//!
//! // restore HEAD somewhere else
//! ops::restore(&repo, Path::new("/destination")).unwrap();
//! ```

mod config;
mod error;
mod hash;
mod refs;
mod repo;

pub mod object;
pub mod ops;
pub mod types;

pub use config::{Config, DEFAULT_COMPRESSION_LEVEL, DEFAULT_REF};
pub use error::{Error, Result};
pub use hash::{hash_bytes, Hash};
pub use object::{
    blob_exists, commit_exists, read_blob, read_commit, read_object, read_tree, tree_exists,
    write_blob, write_commit, write_tree, ObjectKind,
};
pub use refs::{read_head, read_ref, ref_exists, resolve_head, write_head, write_ref};
pub use repo::{Repo, RepoLock, METADATA_DIR};
pub use types::{Blob, Commit, EntryKind, Head, Object, Ref, Tree, TreeEntry};
