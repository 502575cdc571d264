//! Git references (read side)
//!
//! References are human-readable names pointing to commits. This module
//! resolves them without ever writing:
//! - HEAD: symbolic (`ref: refs/heads/main`) or detached (a bare hash)
//! - Branches and tags: loose files under `refs/`, or entries in the
//!   `packed-refs` file
//!
//! ## File Format
//!
//! Loose reference files contain either a 40-character SHA-1 hash or
//! `ref: <path>` for symbolic references.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::OBJECT_ID_HEX_LENGTH;
use anyhow::Context;
use derive_new::new;
use std::path::Path;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Git references reader
///
/// Resolves reference names and revision strings to object IDs.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the directory holding HEAD and refs/ (typically `.git`)
    path: Box<Path>,
}

/// A reference file's content: another reference name, or an object ID
#[derive(Debug, Clone)]
enum SymRefOrOid {
    SymRef(String),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_from(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Unable to read reference file {}", path.display()))?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref_match {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef(symref_match[1].to_string()))),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(content)?))),
        }
    }
}

impl Refs {
    /// Resolve HEAD to an object ID
    pub fn head(&self) -> anyhow::Result<ObjectId> {
        self.resolve(HEAD_REF_NAME)
    }

    /// Resolve a revision string to an object ID
    ///
    /// Accepts a full 40-character hash, a reference name (`HEAD`,
    /// `refs/heads/main`) or a short branch/tag name (`main`, `v1.0`).
    /// Symbolic references are followed until a direct reference is found.
    pub fn resolve(&self, revision: &str) -> anyhow::Result<ObjectId> {
        if revision.len() == OBJECT_ID_HEX_LENGTH
            && revision.chars().all(|c| c.is_ascii_hexdigit())
        {
            return ObjectId::try_parse(revision);
        }

        let mut target = revision.to_string();
        loop {
            match self.read_ref(&target)? {
                Some(SymRefOrOid::SymRef(next)) => target = next,
                Some(SymRefOrOid::Oid(oid)) => return Ok(oid),
                None => match self.packed_ref(&target)? {
                    Some(oid) => return Ok(oid),
                    None => return Err(anyhow::anyhow!("Unknown revision: {}", revision)),
                },
            }
        }
    }

    /// Read a loose reference, trying the conventional search locations
    fn read_ref(&self, name: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        for candidate in Self::search_paths(name) {
            if let Some(value) = SymRefOrOid::read_from(&self.path.join(candidate))? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Look a reference up in the packed-refs file
    fn packed_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let packed_path = self.path.join("packed-refs");
        if !packed_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&packed_path).context(format!(
            "Unable to read packed refs {}",
            packed_path.display()
        ))?;

        for line in content.lines() {
            // comments and peeled-tag lines carry no reference name
            if line.starts_with('#') || line.starts_with('^') {
                continue;
            }

            let Some((oid, ref_name)) = line.split_once(' ') else {
                continue;
            };
            if Self::search_paths(name).contains(&ref_name.trim().to_string()) {
                return Ok(Some(ObjectId::try_parse(oid)?));
            }
        }

        Ok(None)
    }

    fn search_paths(name: &str) -> Vec<String> {
        vec![
            name.to_string(),
            format!("refs/{name}"),
            format!("refs/heads/{name}"),
            format!("refs/tags/{name}"),
        ]
    }
}
