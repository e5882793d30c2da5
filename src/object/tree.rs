use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;
use crate::types::Tree;

/// write a tree to the object store
pub fn write_tree(repo: &Repo, tree: &Tree) -> Result<Hash> {
    object::put(repo, ObjectKind::Tree, &tree.serialize())
}

/// read a tree from the object store
pub fn read_tree(repo: &Repo, hash: &Hash) -> Result<Tree> {
    let data = object::get(repo, ObjectKind::Tree, hash)?;
    Tree::parse(&data).map_err(|e| Error::CorruptObject {
        kind: ObjectKind::Tree,
        hash: *hash,
        reason: e.to_string(),
    })
}

/// get the filesystem path to a tree object
pub fn tree_path(repo: &Repo, hash: &Hash) -> PathBuf {
    object::object_path(repo, ObjectKind::Tree, hash)
}

/// check if a tree exists in the object store
pub fn tree_exists(repo: &Repo, hash: &Hash) -> bool {
    object::exists(repo, ObjectKind::Tree, hash)
}
