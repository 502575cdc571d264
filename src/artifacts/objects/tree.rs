//! Git tree object (read side)
//!
//! Trees represent directory snapshots. Each entry points at a blob (file)
//! or another tree (subdirectory).
//!
//! ## Format
//!
//! On disk (after the `"tree <size>\0"` header), each entry is
//! `<octal-mode> <name>\0<20-byte-sha1>`, with entries sorted by name.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Cursor};

/// Mode bits distinguishing entry kinds (upper octal digits of the mode)
const MODE_KIND_MASK: u32 = 0o170000;
/// Kind bits of a subdirectory entry
const MODE_DIRECTORY: u32 = 0o040000;

/// Sentinel error distinguishing "path absent from tree" from real failures
///
/// Path-scoped predicates treat a missing entry differently from an
/// unreadable one; match with `Error::downcast_ref::<PathNotFound>()` or
/// [`is_path_not_found`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNotFound;

impl std::fmt::Display for PathNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path does not exist in tree")
    }
}

impl std::error::Error for PathNotFound {}

/// Check whether an error is the path-absence sentinel
pub fn is_path_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PathNotFound>().is_some()
}

/// A single tree entry: mode, name and target object ID
#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct TreeEntry {
    pub mode: u32,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    /// Whether this entry points at a subtree rather than a blob
    pub fn is_tree(&self) -> bool {
        self.mode & MODE_KIND_MASK == MODE_DIRECTORY
    }
}

/// Git tree object representing one directory level
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Parse a tree from its content bytes (header already stripped)
    pub fn parse(content: &[u8]) -> anyhow::Result<Self> {
        let mut reader = Cursor::new(content);
        let mut entries = BTreeMap::new();

        while (reader.position() as usize) < content.len() {
            let entry = Self::parse_entry(&mut reader)?;
            entries.insert(entry.name.clone(), entry);
        }

        Ok(Tree { entries })
    }

    fn parse_entry(reader: &mut Cursor<&[u8]>) -> anyhow::Result<TreeEntry> {
        let mut mode = Vec::new();
        reader.read_until(b' ', &mut mode)?;
        if mode.pop() != Some(b' ') {
            return Err(anyhow::anyhow!("Truncated tree entry mode"));
        }
        let mode = std::str::from_utf8(&mode).context("Invalid tree entry mode")?;
        let mode = u32::from_str_radix(mode, 8).context("Invalid tree entry mode")?;

        let mut name = Vec::new();
        reader.read_until(b'\0', &mut name)?;
        if name.pop() != Some(b'\0') {
            return Err(anyhow::anyhow!("Truncated tree entry name"));
        }
        let name = String::from_utf8(name).context("Invalid tree entry name")?;

        let oid = ObjectId::read_from(reader)?;

        Ok(TreeEntry::new(mode, name, oid))
    }

    /// Look up a direct entry by name
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Iterate entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
