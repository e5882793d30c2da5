use std::fs;
use std::path::Path;

use glob::Pattern;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{write_blob, write_commit, write_tree};
use crate::refs::{write_head, write_ref};
use crate::repo::Repo;
use crate::types::{validate_entry_name, Blob, Commit, Head, Ref, Tree, TreeEntry};

/// snapshot the worktree and advance the configured ref and HEAD
///
/// order matters: objects, then the ref, then HEAD. a failure at any step
/// leaves HEAD on the previous commit.
pub fn commit(repo: &Repo) -> Result<Hash> {
    let (tree_hash, tree) = build_tree(repo, repo.worktree())?;

    let commit = Commit::from_tree(repo, tree_hash)?;
    let commit_hash = write_commit(repo, &commit)?;

    let ref_name = repo.config().ref_name.as_str();
    {
        let _lock = repo.try_lock()?.ok_or(Error::LockContention)?;
        write_ref(repo, &Ref::new(ref_name, commit_hash))?;
        write_head(repo, &Head::new(ref_name, commit_hash))?;
    }

    tracing::info!(
        commit = %commit_hash,
        tree = %tree_hash,
        entries = tree.len(),
        ref_name,
        "committed"
    );
    Ok(commit_hash)
}

/// build and persist the tree for `dir`, bottom-up
///
/// returns the root tree and its hash. every subtree and blob is in the
/// store by the time this returns.
pub fn build_tree(repo: &Repo, dir: &Path) -> Result<(Hash, Tree)> {
    let ignore = repo.config().ignore_patterns()?;
    build_dir(repo, dir, "", &ignore)
}

/// recursive helper; `rel` is the worktree-relative path of `dir`
fn build_dir(repo: &Repo, dir: &Path, rel: &str, ignore: &[Pattern]) -> Result<(Hash, Tree)> {
    let mut tree = Tree::new(rel);

    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(
                    path = %rel,
                    name = %raw.to_string_lossy(),
                    "skipping entry with non-UTF-8 name"
                );
                continue;
            }
        };

        if let Err(e) = validate_entry_name(&name) {
            tracing::warn!(path = %rel, name = ?name, error = %e, "skipping unrepresentable entry");
            continue;
        }

        // the repository never snapshots itself
        if path == repo.path() {
            continue;
        }

        let logical_path = if rel.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel, name)
        };

        if ignore
            .iter()
            .any(|p| p.matches(&name) || p.matches(&logical_path))
        {
            tracing::debug!(path = %logical_path, "ignored");
            continue;
        }

        let file_type = entry.file_type().with_path(&path)?;

        let tree_entry = if file_type.is_dir() {
            let (hash, _) = build_dir(repo, &path, &logical_path, ignore)?;
            TreeEntry::tree(name, hash)
        } else if file_type.is_file() {
            let blob = Blob::from_file(&path)?;
            let hash = write_blob(repo, &blob)?;
            TreeEntry::blob(name, hash)
        } else {
            tracing::warn!(path = %logical_path, "skipping symlink or special file");
            continue;
        };

        insert_entry(&mut tree, tree_entry)?;
    }

    let hash = write_tree(repo, &tree)?;
    Ok((hash, tree))
}

/// add an entry, keeping the first one when a name repeats
fn insert_entry(tree: &mut Tree, entry: TreeEntry) -> Result<()> {
    match tree.insert(entry) {
        Ok(()) => Ok(()),
        Err(Error::DuplicateEntry(name)) => {
            tracing::warn!(path = %tree.path(), %name, "duplicate entry name, keeping the first");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
