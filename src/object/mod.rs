//! content-addressed object store
//!
//! objects are keyed by the SHA-256 of their canonical bytes, deflated and
//! written once to `<kind>s/<hex[0:2]>/<hex[2:]>`.

pub mod blob;
pub mod commit;
pub mod tree;

pub use blob::{blob_exists, blob_path, read_blob, write_blob};
pub use commit::{commit_exists, commit_path, read_commit, write_commit};
pub use tree::{read_tree, tree_exists, tree_path, write_tree};

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{hash_bytes, Hash};
use crate::repo::Repo;
use crate::types::{Blob, Commit, Object, Tree};

/// object category, also the store subdirectory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Commit];

    /// directory holding objects of this kind
    pub fn dir(&self, repo: &Repo) -> PathBuf {
        match self {
            ObjectKind::Blob => repo.blobs_path(),
            ObjectKind::Tree => repo.trees_path(),
            ObjectKind::Commit => repo.commits_path(),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Blob => write!(f, "blob"),
            ObjectKind::Tree => write!(f, "tree"),
            ObjectKind::Commit => write!(f, "commit"),
        }
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            _ => Err(Error::InvalidObjectType(s.to_string())),
        }
    }
}

/// get the filesystem path to an object
pub fn object_path(repo: &Repo, kind: ObjectKind, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    kind.dir(repo).join(dir).join(file)
}

/// check if an object exists in the store
pub fn exists(repo: &Repo, kind: ObjectKind, hash: &Hash) -> bool {
    object_path(repo, kind, hash).exists()
}

/// store canonical bytes, returning their hash
///
/// write-if-absent: an object already on disk is left untouched.
pub fn put(repo: &Repo, kind: ObjectKind, data: &[u8]) -> Result<Hash> {
    let hash = hash_bytes(data);
    let path = object_path(repo, kind, &hash);

    // deduplication: if the object already exists, we're done
    if path.exists() {
        tracing::debug!(%kind, %hash, "object already stored");
        return Ok(hash);
    }

    let compressed = compress(data, repo.config().compression_level)?;

    if let Some(shard) = path.parent() {
        fs::create_dir_all(shard).with_path(shard)?;
    }
    write_atomic(repo, &path, &compressed)?;

    tracing::debug!(%kind, %hash, size = data.len(), "stored object");
    Ok(hash)
}

/// load the canonical bytes of an object
///
/// fails with `CorruptObject` if the file does not inflate or does not hash
/// back to `hash`.
pub fn get(repo: &Repo, kind: ObjectKind, hash: &Hash) -> Result<Vec<u8>> {
    let path = object_path(repo, kind, hash);

    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound { kind, hash: *hash }
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let data = decompress(&compressed).map_err(|e| Error::CorruptObject {
        kind,
        hash: *hash,
        reason: format!("inflate failed: {}", e),
    })?;

    // verify hash
    let actual = hash_bytes(&data);
    if actual != *hash {
        return Err(Error::CorruptObject {
            kind,
            hash: *hash,
            reason: format!("content hashes to {}", actual),
        });
    }

    Ok(data)
}

/// load and parse any stored object
pub fn read_object(repo: &Repo, kind: ObjectKind, hash: &Hash) -> Result<Object> {
    let data = get(repo, kind, hash)?;
    let parsed = match kind {
        ObjectKind::Blob => Blob::parse(&data).map(Object::Blob),
        ObjectKind::Tree => Tree::parse(&data).map(Object::Tree),
        ObjectKind::Commit => Commit::parse(&data).map(Object::Commit),
    };
    parsed.map_err(|e| Error::CorruptObject {
        kind,
        hash: *hash,
        reason: e.to_string(),
    })
}

/// deflate (zlib container) at the given level
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).with_path("<deflate>")?;
    encoder.finish().with_path("<deflate>")
}

/// inflate bytes produced by [`compress`]
pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// atomic write: temp -> fsync -> rename -> fsync parent
///
/// readers see either the old file or the complete new one.
pub(crate) fn write_atomic(repo: &Repo, dest: &Path, data: &[u8]) -> Result<()> {
    let tmp_dir = repo.tmp_path();
    fs::create_dir_all(&tmp_dir).with_path(&tmp_dir)?;
    let tmp_path = tmp_dir.join(uuid::Uuid::new_v4().to_string());

    let written = File::create(&tmp_path).and_then(|mut tmp_file| {
        tmp_file.write_all(data)?;
        tmp_file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io {
            path: tmp_path,
            source: e,
        });
    }

    if let Err(e) = fs::rename(&tmp_path, dest) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io {
            path: dest.to_path_buf(),
            source: e,
        });
    }

    if let Some(parent) = dest.parent() {
        fsync_dir(parent)?;
    }
    Ok(())
}

/// fsync a directory
fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path).with_path(path)?;
    dir.sync_all().with_path(path)?;
    Ok(())
}
