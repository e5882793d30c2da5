use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;
use crate::types::Blob;

/// write a blob to the object store
///
/// the hash covers only the serialized content, so identical files dedupe
/// regardless of their path.
pub fn write_blob(repo: &Repo, blob: &Blob) -> Result<Hash> {
    object::put(repo, ObjectKind::Blob, &blob.serialize())
}

/// read a blob back; the returned blob carries no source path
pub fn read_blob(repo: &Repo, hash: &Hash) -> Result<Blob> {
    let data = object::get(repo, ObjectKind::Blob, hash)?;
    Blob::parse(&data).map_err(|e| Error::CorruptObject {
        kind: ObjectKind::Blob,
        hash: *hash,
        reason: e.to_string(),
    })
}

/// get the filesystem path to a blob
pub fn blob_path(repo: &Repo, hash: &Hash) -> PathBuf {
    object::object_path(repo, ObjectKind::Blob, hash)
}

/// check if a blob exists in the object store
pub fn blob_exists(repo: &Repo, hash: &Hash) -> bool {
    object::exists(repo, ObjectKind::Blob, hash)
}
