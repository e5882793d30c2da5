//! in-memory object model and canonical serialization
//!
//! every object serializes to `<HEADER>\0<body>`; the SHA-256 of exactly
//! these bytes is the object's hash.

mod blob;
mod commit;
mod reference;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use reference::{Head, Ref};
pub use tree::{EntryKind, Tree, TreeEntry};
pub(crate) use tree::validate_entry_name;

/// canonical bytes failed to parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// the closed set of serializable objects
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Ref(Ref),
}

impl Object {
    /// canonical serialized form
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.serialize(),
            Object::Tree(t) => t.serialize(),
            Object::Commit(c) => c.serialize(),
            Object::Ref(r) => r.serialize(),
        }
    }

    /// lowercase type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Blob(_) => "blob",
            Object::Tree(_) => "tree",
            Object::Commit(_) => "commit",
            Object::Ref(_) => "ref",
        }
    }
}

/// split canonical bytes into the header line after `tag ` and the body
///
/// `tag` is the expected keyword, e.g. `TREE`. the header runs up to the
/// first null byte and must be UTF-8.
pub(crate) fn split_header<'a>(
    data: &'a [u8],
    tag: &str,
) -> Result<(&'a str, &'a [u8]), DecodeError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| DecodeError::new("missing header terminator"))?;

    let header = std::str::from_utf8(&data[..nul])
        .map_err(|_| DecodeError::new("header is not valid UTF-8"))?;

    let arg = header
        .strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| DecodeError::new(format!("expected {} header, got {:?}", tag, header)))?;

    Ok((arg, &data[nul + 1..]))
}
