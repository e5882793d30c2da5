use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::tree_exists;
use crate::repo::Repo;
use crate::types::{split_header, DecodeError};

/// a snapshot: one root tree stamped with a creation time
///
/// there is no parent pointer; history is whatever the ref points at now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// root tree hash
    pub tree: Hash,
    /// unix timestamp (seconds since epoch)
    pub timestamp: i64,
}

impl Commit {
    /// create a commit for a root tree that is already in the store
    pub fn from_tree(repo: &Repo, tree: Hash) -> Result<Self> {
        if tree.is_zero() || !tree_exists(repo, &tree) {
            return Err(Error::IncompleteObject(format!(
                "commit root tree {} has not been persisted",
                tree
            )));
        }
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(Self::with_timestamp(tree, timestamp))
    }

    /// create a commit with explicit timestamp
    pub fn with_timestamp(tree: Hash, timestamp: i64) -> Self {
        Self { tree, timestamp }
    }

    /// `COMMIT <timestamp>\0<tree-hex>`
    pub fn serialize(&self) -> Vec<u8> {
        format!("COMMIT {}\0{}", self.timestamp, self.tree).into_bytes()
    }

    /// parse canonical bytes
    pub fn parse(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (timestamp, body) = split_header(data, "COMMIT")?;
        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| DecodeError::new(format!("bad commit timestamp {:?}", timestamp)))?;
        let body = std::str::from_utf8(body)
            .map_err(|_| DecodeError::new("commit body is not UTF-8"))?;
        let tree = Hash::from_hex(body.trim())
            .map_err(|_| DecodeError::new(format!("bad root tree hash {:?}", body)))?;
        Ok(Self { tree, timestamp })
    }
}
