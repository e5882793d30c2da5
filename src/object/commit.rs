use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;
use crate::types::Commit;

/// write a commit to the object store
pub fn write_commit(repo: &Repo, commit: &Commit) -> Result<Hash> {
    object::put(repo, ObjectKind::Commit, &commit.serialize())
}

/// read a commit from the object store
pub fn read_commit(repo: &Repo, hash: &Hash) -> Result<Commit> {
    let data = object::get(repo, ObjectKind::Commit, hash)?;
    Commit::parse(&data).map_err(|e| Error::CorruptObject {
        kind: ObjectKind::Commit,
        hash: *hash,
        reason: e.to_string(),
    })
}

/// get the filesystem path to a commit object
pub fn commit_path(repo: &Repo, hash: &Hash) -> PathBuf {
    object::object_path(repo, ObjectKind::Commit, hash)
}

/// check if a commit exists in the object store
pub fn commit_exists(repo: &Repo, hash: &Hash) -> bool {
    object::exists(repo, ObjectKind::Commit, hash)
}
