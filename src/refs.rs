use std::fs;
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{commit_exists, compress, decompress, write_atomic, ObjectKind};
use crate::repo::Repo;
use crate::types::{Head, Ref};

/// write a ref (create or update)
///
/// the target commit must already be in the store.
pub fn write_ref(repo: &Repo, reference: &Ref) -> Result<()> {
    if !reference.is_complete() {
        return Err(Error::IncompleteObject(format!(
            "ref {:?} -> {} is missing a field",
            reference.name, reference.target
        )));
    }
    validate_ref_name(&reference.name)?;

    if !commit_exists(repo, &reference.target) {
        return Err(Error::ObjectNotFound {
            kind: ObjectKind::Commit,
            hash: reference.target,
        });
    }

    let ref_path = ref_path(repo, &reference.name);
    if let Some(parent) = ref_path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let compressed = compress(&reference.serialize(), repo.config().compression_level)?;
    write_atomic(repo, &ref_path, &compressed)?;

    tracing::debug!(name = %reference.name, target = %reference.target, "updated ref");
    Ok(())
}

/// read a ref
pub fn read_ref(repo: &Repo, ref_name: &str) -> Result<Ref> {
    let ref_path = ref_path(repo, ref_name);

    let compressed = fs::read(&ref_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::RefNotFound(ref_name.to_string())
        } else {
            Error::Io {
                path: ref_path.clone(),
                source: e,
            }
        }
    })?;

    let corrupt = |reason: String| Error::CorruptRef {
        name: ref_name.to_string(),
        reason,
    };

    let data = decompress(&compressed).map_err(|e| corrupt(format!("inflate failed: {}", e)))?;
    let reference = Ref::parse(&data).map_err(|e| corrupt(e.to_string()))?;

    if reference.name != ref_name {
        return Err(corrupt(format!("file names ref {:?}", reference.name)));
    }
    Ok(reference)
}

/// check if a ref exists
pub fn ref_exists(repo: &Repo, ref_name: &str) -> bool {
    ref_path(repo, ref_name).exists()
}

/// get filesystem path for a ref
fn ref_path(repo: &Repo, ref_name: &str) -> PathBuf {
    repo.refs_path().join(ref_name)
}

/// point HEAD at a ref and the commit it holds
///
/// callers write the ref first, so a crash in between leaves HEAD on the
/// previous, still valid commit.
pub fn write_head(repo: &Repo, head: &Head) -> Result<()> {
    validate_ref_name(&head.ref_name)?;
    if !commit_exists(repo, &head.commit) {
        return Err(Error::ObjectNotFound {
            kind: ObjectKind::Commit,
            hash: head.commit,
        });
    }

    write_atomic(repo, &repo.head_path(), head.to_string().as_bytes())?;

    tracing::debug!(%head, "updated HEAD");
    Ok(())
}

/// read HEAD
pub fn read_head(repo: &Repo) -> Result<Head> {
    let head_path = repo.head_path();
    let content = fs::read_to_string(&head_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::HeadNotFound
        } else {
            Error::Io {
                path: head_path.clone(),
                source: e,
            }
        }
    })?;

    content
        .parse::<Head>()
        .map_err(|e| Error::CorruptHead(e.to_string()))
}

/// resolve HEAD to the current commit hash
///
/// HEAD is authoritative: if its ref has already moved on (an interrupted
/// commit), the commit recorded in HEAD is returned.
pub fn resolve_head(repo: &Repo) -> Result<Hash> {
    let head = read_head(repo)?;
    let reference = read_ref(repo, &head.ref_name)?;

    if reference.target != head.commit {
        tracing::warn!(
            ref_name = %head.ref_name,
            head = %head.commit,
            reference = %reference.target,
            "ref has moved past HEAD, using HEAD"
        );
    }

    Ok(head.commit)
}

/// validate ref name
pub(crate) fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRef("empty ref name".to_string()));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot start or end with '/': {}",
            name
        )));
    }

    if name.contains("//") {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain '//': {}",
            name
        )));
    }

    if name.contains('\0') || name.contains('\n') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain control characters: {:?}",
            name
        )));
    }

    // check for path traversal
    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRef(format!(
                "ref name cannot contain '.' or '..': {}",
                name
            )));
        }
    }

    Ok(())
}
