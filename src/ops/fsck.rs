use std::collections::HashSet;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{read_commit, read_object, read_tree, ObjectKind};
use crate::refs::{read_head, read_ref, ref_exists};
use crate::repo::Repo;
use crate::types::EntryKind;

/// fsck report
#[derive(Debug, Default)]
pub struct FsckReport {
    /// objects checked
    pub objects_checked: usize,
    /// objects that fail to inflate, re-hash or parse
    pub corrupt_objects: Vec<CorruptObject>,
    /// objects referenced from HEAD or the ref but absent from the store
    pub missing_objects: Vec<MissingObject>,
    /// objects not reachable from HEAD or the ref
    pub dangling_objects: Vec<(ObjectKind, Hash)>,
}

impl FsckReport {
    pub fn is_ok(&self) -> bool {
        self.corrupt_objects.is_empty() && self.missing_objects.is_empty()
    }
}

#[derive(Debug)]
pub struct CorruptObject {
    pub kind: ObjectKind,
    pub hash: Hash,
    pub message: String,
}

#[derive(Debug)]
pub struct MissingObject {
    pub kind: ObjectKind,
    pub hash: Hash,
    pub referenced_by: String,
}

/// verify repository integrity
pub fn fsck(repo: &Repo) -> Result<FsckReport> {
    let mut report = FsckReport::default();
    let mut present = HashSet::new();

    // every object on disk must inflate, hash back to its name and parse
    for kind in ObjectKind::ALL {
        for hash in list_objects(repo, kind) {
            report.objects_checked += 1;
            present.insert((kind, hash));

            match read_object(repo, kind, &hash) {
                Ok(_) => {}
                Err(Error::CorruptObject { reason, .. }) => {
                    report.corrupt_objects.push(CorruptObject {
                        kind,
                        hash,
                        message: reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    // walk the graph from HEAD and the configured ref; a concurrent commit
    // must not move them mid-walk
    let _lock = repo.lock()?;
    let mut roots = Vec::new();
    match read_head(repo) {
        Ok(head) => roots.push((head.commit, "HEAD".to_string())),
        Err(Error::HeadNotFound) => {}
        Err(e) => return Err(e),
    }
    let ref_name = &repo.config().ref_name;
    if ref_exists(repo, ref_name) {
        let r = read_ref(repo, ref_name)?;
        roots.push((r.target, format!("ref {}", ref_name)));
    }

    let mut reachable = HashSet::new();
    for (commit, source) in roots {
        check_commit(repo, &commit, &source, &present, &mut reachable, &mut report)?;
    }

    let mut dangling: Vec<_> = present.difference(&reachable).copied().collect();
    dangling.sort_by_key(|(_, hash)| *hash);
    report.dangling_objects = dangling;

    Ok(report)
}

fn check_commit(
    repo: &Repo,
    hash: &Hash,
    referenced_by: &str,
    present: &HashSet<(ObjectKind, Hash)>,
    reachable: &mut HashSet<(ObjectKind, Hash)>,
    report: &mut FsckReport,
) -> Result<()> {
    if !visit(ObjectKind::Commit, hash, referenced_by, present, reachable, report) {
        return Ok(());
    }

    let commit = match read_commit(repo, hash) {
        Ok(c) => c,
        // already recorded in the corruption pass
        Err(Error::CorruptObject { .. }) => return Ok(()),
        Err(e) => return Err(e),
    };

    let by = format!("commit {}", hash);
    check_tree(repo, &commit.tree, &by, present, reachable, report)
}

fn check_tree(
    repo: &Repo,
    hash: &Hash,
    referenced_by: &str,
    present: &HashSet<(ObjectKind, Hash)>,
    reachable: &mut HashSet<(ObjectKind, Hash)>,
    report: &mut FsckReport,
) -> Result<()> {
    if !visit(ObjectKind::Tree, hash, referenced_by, present, reachable, report) {
        return Ok(());
    }

    let tree = match read_tree(repo, hash) {
        Ok(t) => t,
        Err(Error::CorruptObject { .. }) => return Ok(()),
        Err(e) => return Err(e),
    };

    let by = format!("tree {}", hash);
    for entry in tree.entries() {
        match entry.kind {
            EntryKind::Tree => check_tree(repo, &entry.hash, &by, present, reachable, report)?,
            EntryKind::Blob => {
                visit(ObjectKind::Blob, &entry.hash, &by, present, reachable, report);
            }
        }
    }
    Ok(())
}

/// mark an object reachable; returns true if it should be descended into
fn visit(
    kind: ObjectKind,
    hash: &Hash,
    referenced_by: &str,
    present: &HashSet<(ObjectKind, Hash)>,
    reachable: &mut HashSet<(ObjectKind, Hash)>,
    report: &mut FsckReport,
) -> bool {
    if !reachable.insert((kind, *hash)) {
        return false;
    }
    if !present.contains(&(kind, *hash)) {
        report.missing_objects.push(MissingObject {
            kind,
            hash: *hash,
            referenced_by: referenced_by.to_string(),
        });
        return false;
    }
    true
}

/// list all objects of one kind on disk
fn list_objects(repo: &Repo, kind: ObjectKind) -> Vec<Hash> {
    let dir = kind.dir(repo);
    let mut hashes = Vec::new();

    for entry in WalkDir::new(&dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let shard = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let rest = entry.file_name().to_str().unwrap_or_default();

        match Hash::from_hex(&format!("{}{}", shard, rest)) {
            Ok(hash) => hashes.push(hash),
            Err(_) => {
                tracing::warn!(path = %entry.path().display(), "stray file in object store");
            }
        }
    }

    hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{blob_path, commit_path, compress, tree_path, write_blob};
    use crate::ops::commit::commit;
    use crate::types::Blob;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_fsck_empty_repo() {
        let (_dir, repo) = test_repo();

        let report = fsck(&repo).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.objects_checked, 0);
    }

    #[test]
    fn test_fsck_healthy_repo() {
        let (dir, repo) = test_repo();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file"), "content").unwrap();
        commit(&repo).unwrap();

        let report = fsck(&repo).unwrap();
        assert!(report.is_ok());
        // blob + sub tree + root tree + commit
        assert_eq!(report.objects_checked, 4);
        assert!(report.dangling_objects.is_empty());
    }

    #[test]
    fn test_fsck_detects_corrupt_blob() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("file"), "original").unwrap();
        let commit_hash = commit(&repo).unwrap();

        let tree = read_tree(&repo, &read_commit(&repo, &commit_hash).unwrap().tree).unwrap();
        let blob_hash = tree.get("file").unwrap().hash;
        fs::write(blob_path(&repo, &blob_hash), compress(b"BLOB 3\0bad", 6).unwrap()).unwrap();

        let report = fsck(&repo).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.corrupt_objects.len(), 1);
        assert_eq!(report.corrupt_objects[0].kind, ObjectKind::Blob);
        assert_eq!(report.corrupt_objects[0].hash, blob_hash);
    }

    #[test]
    fn test_fsck_detects_missing_tree() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("file"), "x").unwrap();
        let commit_hash = commit(&repo).unwrap();

        let root = read_commit(&repo, &commit_hash).unwrap().tree;
        fs::remove_file(tree_path(&repo, &root)).unwrap();

        let report = fsck(&repo).unwrap();
        assert_eq!(report.missing_objects.len(), 1);
        assert_eq!(report.missing_objects[0].kind, ObjectKind::Tree);
        assert_eq!(report.missing_objects[0].hash, root);
        assert_eq!(
            report.missing_objects[0].referenced_by,
            format!("commit {}", commit_hash)
        );
        // the blob under the vanished tree can no longer be reached
        assert_eq!(report.dangling_objects.len(), 1);
    }

    #[test]
    fn test_fsck_detects_missing_commit() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("file"), "x").unwrap();
        let commit_hash = commit(&repo).unwrap();
        fs::remove_file(commit_path(&repo, &commit_hash)).unwrap();

        let report = fsck(&repo).unwrap();
        assert_eq!(report.missing_objects.len(), 1);
        assert_eq!(report.missing_objects[0].kind, ObjectKind::Commit);
        assert_eq!(report.missing_objects[0].referenced_by, "HEAD");
    }

    #[test]
    fn test_fsck_reports_dangling_objects() {
        let (_dir, repo) = test_repo();

        let hash = write_blob(&repo, &Blob::new(b"orphan".to_vec())).unwrap();

        let report = fsck(&repo).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.dangling_objects, vec![(ObjectKind::Blob, hash)]);
    }

    #[test]
    fn test_fsck_superseded_commit_is_dangling() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("file"), "v1").unwrap();
        let first = commit(&repo).unwrap();
        fs::write(dir.path().join("file"), "v2").unwrap();
        commit(&repo).unwrap();

        let report = fsck(&repo).unwrap();
        assert!(report.is_ok());
        assert!(report
            .dangling_objects
            .contains(&(ObjectKind::Commit, first)));
    }
}
