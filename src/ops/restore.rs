use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{read_blob, read_commit, read_tree, ObjectKind};
use crate::refs::resolve_head;
use crate::repo::Repo;
use crate::types::EntryKind;

/// materialize the snapshot HEAD points at under `target`
pub fn restore(repo: &Repo, target: &Path) -> Result<()> {
    let commit_hash = resolve_head(repo)?;
    restore_commit(repo, &commit_hash, target)
}

/// materialize a specific commit under `target`
///
/// every object is loaded before anything is created for it, so a missing
/// or corrupt object aborts the restore without leaving a stub behind.
/// existing files at the same paths are overwritten.
pub fn restore_commit(repo: &Repo, commit_hash: &Hash, target: &Path) -> Result<()> {
    let commit = read_commit(repo, commit_hash)?;
    let mut stats = RestoreStats::default();

    restore_tree(repo, &commit.tree, target, "", &mut stats)?;

    tracing::info!(
        commit = %commit_hash,
        target = %target.display(),
        dirs = stats.dirs,
        files = stats.files,
        "restored"
    );
    Ok(())
}

#[derive(Default)]
struct RestoreStats {
    dirs: usize,
    files: usize,
}

/// restore a tree (recursive helper)
///
/// `rel` is where the parent tree says this directory lives; the stored
/// tree must agree.
fn restore_tree(
    repo: &Repo,
    hash: &Hash,
    target: &Path,
    rel: &str,
    stats: &mut RestoreStats,
) -> Result<()> {
    let tree = read_tree(repo, hash)?;
    if tree.path() != rel {
        return Err(Error::CorruptObject {
            kind: ObjectKind::Tree,
            hash: *hash,
            reason: format!("tree records path {:?}, expected {:?}", tree.path(), rel),
        });
    }

    let dir = join_rel(target, rel);
    fs::create_dir_all(&dir).with_path(&dir)?;
    stats.dirs += 1;
    tracing::debug!(dir = %dir.display(), "restoring tree");

    for entry in tree.entries() {
        match entry.kind {
            EntryKind::Tree => {
                let child = if rel.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", rel, entry.name)
                };
                restore_tree(repo, &entry.hash, target, &child, stats)?;
            }
            EntryKind::Blob => {
                restore_file(repo, &entry.hash, &dir.join(&entry.name))?;
                stats.files += 1;
            }
        }
    }

    Ok(())
}

/// write one blob to `dest`, byte-exact
fn restore_file(repo: &Repo, hash: &Hash, dest: &Path) -> Result<()> {
    let blob = read_blob(repo, hash)?;

    // the text/binary split only affects logging, both write the same bytes
    match std::str::from_utf8(&blob.content) {
        Ok(text) => {
            tracing::debug!(path = %dest.display(), "restoring text file");
            fs::write(dest, text).with_path(dest)?;
        }
        Err(_) => {
            tracing::debug!(path = %dest.display(), "restoring binary file");
            fs::write(dest, &blob.content).with_path(dest)?;
        }
    }
    Ok(())
}

fn join_rel(target: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        target.to_path_buf()
    } else {
        target.join(rel)
    }
}
