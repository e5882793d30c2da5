use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};
use crate::types::{split_header, DecodeError};

/// raw file content
///
/// the source path is bookkeeping only: it is never serialized, so two files
/// with identical bytes share one stored blob no matter where they live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub path: Option<PathBuf>,
    pub content: Vec<u8>,
}

impl Blob {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            path: None,
            content,
        }
    }

    /// read a file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).with_path(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
        })
    }

    /// `BLOB <len>\0<content>`
    pub fn serialize(&self) -> Vec<u8> {
        let header = format!("BLOB {}\0", self.content.len());
        let mut out = Vec::with_capacity(header.len() + self.content.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.content);
        out
    }

    /// parse canonical bytes
    pub fn parse(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (len, body) = split_header(data, "BLOB")?;
        let declared: usize = len
            .parse()
            .map_err(|_| DecodeError::new(format!("bad blob length {:?}", len)))?;
        if declared != body.len() {
            return Err(DecodeError::new(format!(
                "blob declares {} bytes but holds {}",
                declared,
                body.len()
            )));
        }
        Ok(Self::new(body.to_vec()))
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
