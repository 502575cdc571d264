//! Git object identifier (SHA-1 digest)
//!
//! Object IDs are 20-byte SHA-1 digests that uniquely identify all objects
//! in a repository (blobs, trees, commits, tags).
//!
//! ## Format
//!
//! - Binary: 20 raw bytes, as found in tree entries, pack indexes and
//!   RefDelta headers
//! - Hex: 40 lowercase hex characters (e.g., "abc123...def")
//! - Short: first 7 hex characters (e.g., "abc123")
//!
//! ## Storage
//!
//! Loose objects are stored in `objects/<first-2-hex-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_HEX_LENGTH, OBJECT_ID_SIZE};
use std::io::Read;
use std::path::PathBuf;

/// Git object identifier (SHA-1 digest)
///
/// A 20-byte value that uniquely identifies an object. Equality is byte
/// equality; the canonical display form is the 40-character lowercase hex
/// string. Implements various utilities for parsing and path conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_SIZE]);

impl ObjectId {
    /// Parse and validate an object ID from its hex form
    ///
    /// # Arguments
    ///
    /// * `id` - 40-character hexadecimal string
    ///
    /// # Returns
    ///
    /// Validated ObjectId or error if invalid length/characters
    pub fn try_parse(id: &str) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_HEX_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }

        let mut bytes = [0u8; OBJECT_ID_SIZE];
        for (pair, byte) in id.as_bytes().chunks(2).zip(bytes.iter_mut()) {
            let pair = std::str::from_utf8(pair)
                .map_err(|_| anyhow::anyhow!("Invalid object ID characters: {}", id))?;
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| anyhow::anyhow!("Invalid object ID characters: {}", id))?;
        }

        Ok(Self(bytes))
    }

    /// Build an object ID from its 20 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let bytes: [u8; OBJECT_ID_SIZE] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Invalid object ID size: {}", bytes.len()))?;

        Ok(Self(bytes))
    }

    /// Read an object ID in binary form (20 bytes)
    ///
    /// Used when deserializing tree entries and RefDelta base references.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| anyhow::anyhow!("Too short for an object ID"))?;

        Ok(Self(bytes))
    }

    /// Get the raw 20 bytes
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_SIZE] {
        &self.0
    }

    /// Canonical 40-character lowercase hex form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    /// Convert to the loose-object path fragment
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 hex chars.
    /// For example, `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Get abbreviated form of the object ID
    ///
    /// # Returns
    ///
    /// First 7 hex characters of the hash (standard Git abbreviation)
    pub fn to_short_oid(&self) -> String {
        self.to_hex().split_at(7).0.to_string()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
