use std::fmt;
use std::str::FromStr;

use crate::hash::Hash;
use crate::types::{split_header, DecodeError};

/// a named, mutable pointer to a commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ref {
    pub name: String,
    pub target: Hash,
}

impl Ref {
    pub fn new(name: impl Into<String>, target: Hash) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// both fields set
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.target.is_zero()
    }

    /// `REF <name>\0<commit-hex>`
    pub fn serialize(&self) -> Vec<u8> {
        format!("REF {}\0{}", self.name, self.target).into_bytes()
    }

    /// parse canonical bytes
    pub fn parse(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (name, body) = split_header(data, "REF")?;
        let body =
            std::str::from_utf8(body).map_err(|_| DecodeError::new("ref body is not UTF-8"))?;
        let target = Hash::from_hex(body.trim())
            .map_err(|_| DecodeError::new(format!("bad ref target {:?}", body)))?;
        Ok(Self::new(name, target))
    }
}

/// the current ref and the commit it pointed at when HEAD was written
///
/// stored as plain text `<ref>@<commit-hex>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head {
    pub ref_name: String,
    pub commit: Hash,
}

impl Head {
    pub fn new(ref_name: impl Into<String>, commit: Hash) -> Self {
        Self {
            ref_name: ref_name.into(),
            commit,
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ref_name, self.commit)
    }
}

impl FromStr for Head {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // the hash never contains '@', the ref name might
        let (ref_name, hex) = s
            .trim()
            .rsplit_once('@')
            .ok_or_else(|| DecodeError::new(format!("expected <ref>@<hash>, got {:?}", s)))?;
        if ref_name.is_empty() {
            return Err(DecodeError::new("HEAD names an empty ref"));
        }
        let commit = Hash::from_hex(hex)
            .map_err(|_| DecodeError::new(format!("bad commit hash {:?}", hex)))?;
        Ok(Self::new(ref_name, commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h() -> Hash {
        Hash::from_hex("1111111111111111111111111111111111111111111111111111111111111111").unwrap()
    }

    #[test]
    fn test_ref_roundtrip() {
        let r = Ref::new("main", h());
        assert_eq!(Ref::parse(&r.serialize()).unwrap(), r);
    }

    #[test]
    fn test_ref_completeness() {
        assert!(Ref::new("main", h()).is_complete());
        assert!(!Ref::new("", h()).is_complete());
        assert!(!Ref::new("main", Hash::ZERO).is_complete());
    }

    #[test]
    fn test_head_format() {
        let head = Head::new("main", h());
        assert_eq!(head.to_string(), format!("main@{}", "1".repeat(64)));
    }

    #[test]
    fn test_head_parse() {
        let head: Head = format!("main@{}\n", "1".repeat(64)).parse().unwrap();
        assert_eq!(head, Head::new("main", h()));

        let at_in_name: Head = format!("rel@2@{}", "1".repeat(64)).parse().unwrap();
        assert_eq!(at_in_name.ref_name, "rel@2");
    }

    #[test]
    fn test_head_parse_rejects_garbage() {
        assert!("main".parse::<Head>().is_err());
        assert!("main@xyz".parse::<Head>().is_err());
        assert!(format!("@{}", "1".repeat(64)).parse::<Head>().is_err());
    }
}
