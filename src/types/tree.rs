use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::types::{split_header, DecodeError};

/// a directory listing - entries keyed (and therefore ordered) by name
///
/// `path` is the worktree-relative directory path with `/` separators,
/// empty for the root tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    path: String,
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// create an empty tree for the directory at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// add an entry; the first entry with a given name wins
    pub fn insert(&mut self, entry: TreeEntry) -> Result<()> {
        validate_entry_name(&entry.name)?;
        if self.entries.contains_key(&entry.name) {
            return Err(Error::DuplicateEntry(entry.name));
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// worktree-relative directory path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    /// look up entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `TREE <path>\0` followed by `<name> <KIND> <hash>\n` per entry
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = format!("TREE {}\0", self.path).into_bytes();
        for entry in self.entries.values() {
            out.extend_from_slice(
                format!("{} {} {}\n", entry.name, entry.kind, entry.hash).as_bytes(),
            );
        }
        out
    }

    /// parse canonical bytes
    pub fn parse(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (path, body) = split_header(data, "TREE")?;
        let body =
            std::str::from_utf8(body).map_err(|_| DecodeError::new("tree body is not UTF-8"))?;

        let mut tree = Tree::new(path);
        if body.is_empty() {
            return Ok(tree);
        }

        let lines = body
            .strip_suffix('\n')
            .ok_or_else(|| DecodeError::new("tree body is not newline-terminated"))?;

        for line in lines.split('\n') {
            // names may contain spaces, kind and hash never do
            let mut parts = line.rsplitn(3, ' ');
            let (Some(hash), Some(kind), Some(name)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(DecodeError::new(format!("malformed tree line {:?}", line)));
            };

            let hash = Hash::from_hex(hash)
                .map_err(|_| DecodeError::new(format!("bad hash in tree line {:?}", line)))?;
            let kind: EntryKind = kind.parse()?;

            tree.insert(TreeEntry::new(name, kind, hash))
                .map_err(|e| DecodeError::new(e.to_string()))?;
        }

        Ok(tree)
    }
}

/// validate an entry name
pub(crate) fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains('/') {
        return Err(Error::InvalidEntryName(format!("name contains '/': {}", name)));
    }
    if name.contains('\0') {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {:?}",
            name
        )));
    }
    if name.contains('\n') {
        return Err(Error::InvalidEntryName(format!(
            "name contains newline: {:?}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidEntryName(format!("reserved name: {}", name)));
    }
    Ok(())
}

/// a single named reference inside a tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub hash: Hash,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, hash: Hash) -> Self {
        Self {
            name: name.into(),
            kind,
            hash,
        }
    }

    pub fn blob(name: impl Into<String>, hash: Hash) -> Self {
        Self::new(name, EntryKind::Blob, hash)
    }

    pub fn tree(name: impl Into<String>, hash: Hash) -> Self {
        Self::new(name, EntryKind::Tree, hash)
    }
}

/// what a tree entry points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Blob => write!(f, "BLOB"),
            EntryKind::Tree => write!(f, "TREE"),
        }
    }
}

impl FromStr for EntryKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BLOB" => Ok(EntryKind::Blob),
            "TREE" => Ok(EntryKind::Tree),
            _ => Err(DecodeError::new(format!("unknown entry kind {:?}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(c: char) -> Hash {
        Hash::from_hex(&c.to_string().repeat(64)).unwrap()
    }

    #[test]
    fn test_tree_empty() {
        let t = Tree::new("");
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.serialize(), b"TREE \0");
    }

    #[test]
    fn test_tree_sorting() {
        let mut tree = Tree::new("");
        tree.insert(TreeEntry::blob("zebra", h('1'))).unwrap();
        tree.insert(TreeEntry::blob("alpha", h('2'))).unwrap();
        tree.insert(TreeEntry::tree("beta", h('3'))).unwrap();

        let names: Vec<_> = tree.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "zebra"]);
    }

    #[test]
    fn test_tree_serialization_independent_of_insertion_order() {
        let entries = [
            TreeEntry::blob("b.txt", h('1')),
            TreeEntry::tree("a", h('2')),
            TreeEntry::blob("C", h('3')),
        ];

        let mut forward = Tree::new("dir");
        for e in entries.iter().cloned() {
            forward.insert(e).unwrap();
        }
        let mut backward = Tree::new("dir");
        for e in entries.iter().rev().cloned() {
            backward.insert(e).unwrap();
        }

        assert_eq!(forward.serialize(), backward.serialize());
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_tree_serialize_format() {
        let mut tree = Tree::new("src");
        tree.insert(TreeEntry::blob("main.rs", h('a'))).unwrap();
        tree.insert(TreeEntry::tree("bin", h('b'))).unwrap();

        let expected = format!(
            "TREE src\0bin TREE {}\nmain.rs BLOB {}\n",
            "b".repeat(64),
            "a".repeat(64)
        );
        assert_eq!(tree.serialize(), expected.into_bytes());
    }

    #[test]
    fn test_tree_parse_roundtrip_with_spaces() {
        let mut tree = Tree::new("my dir/sub dir");
        tree.insert(TreeEntry::blob("file with spaces.txt", h('c'))).unwrap();
        tree.insert(TreeEntry::tree("nested dir", h('d'))).unwrap();

        let parsed = Tree::parse(&tree.serialize()).unwrap();
        assert_eq!(parsed, tree);
        assert_eq!(parsed.path(), "my dir/sub dir");
    }

    #[test]
    fn test_tree_get() {
        let mut tree = Tree::new("");
        tree.insert(TreeEntry::blob("alpha", h('1'))).unwrap();

        assert_eq!(tree.get("alpha").unwrap().kind, EntryKind::Blob);
        assert!(tree.get("gamma").is_none());
    }

    #[test]
    fn test_tree_rejects_duplicates() {
        let mut tree = Tree::new("");
        tree.insert(TreeEntry::blob("same", h('1'))).unwrap();
        let result = tree.insert(TreeEntry::tree("same", h('2')));

        assert!(matches!(result, Err(Error::DuplicateEntry(name)) if name == "same"));
        // first one kept
        assert_eq!(tree.get("same").unwrap().hash, h('1'));
    }

    #[test]
    fn test_tree_rejects_bad_names() {
        let mut tree = Tree::new("");
        for name in ["", "foo/bar", "foo\0bar", "foo\nbar", ".", ".."] {
            let result = tree.insert(TreeEntry::blob(name, h('1')));
            assert!(matches!(result, Err(Error::InvalidEntryName(_))), "{:?}", name);
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_tree_parse_rejects_malformed() {
        assert!(Tree::parse(b"TREE \0oops\n").is_err());
        assert!(Tree::parse(b"TREE \0a FILE 00\n").is_err());
        let unterminated = format!("TREE \0a BLOB {}", "1".repeat(64));
        assert!(Tree::parse(unterminated.as_bytes()).is_err());
        let dup = format!("TREE \0a BLOB {0}\na BLOB {0}\n", "1".repeat(64));
        assert!(Tree::parse(dup.as_bytes()).is_err());
    }

    #[test]
    fn test_entry_kind_display_parse() {
        assert_eq!(EntryKind::Blob.to_string(), "BLOB");
        assert_eq!("TREE".parse::<EntryKind>().unwrap(), EntryKind::Tree);
        assert!("tree".parse::<EntryKind>().is_err());
    }
}
