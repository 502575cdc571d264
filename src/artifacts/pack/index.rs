//! Pack index (version-2 `.idx`) reader
//!
//! A pack index maps object IDs to byte offsets inside its sibling `.pack`
//! file. The version-2 layout, parsed strictly in order:
//!
//! 1. Magic `{0xFF, 't', 'O', 'c'}` and big-endian version 2
//! 2. Fanout: 256 big-endian u32 values; entry 255 is the object count
//! 3. N object IDs of 20 bytes each, sorted ascending
//! 4. N CRC-32 values (skipped)
//! 5. N 31-bit offsets; a set top bit redirects into the 64-bit table
//! 6. The 64-bit offset table
//! 7. SHA-1 of the sibling pack file (skipped)
//! 8. SHA-1 of this file's preceding bytes, verified against a running hash
//!
//! The 64-bit table is sized from the file length rather than from the
//! number of redirecting slots, since the redirect values are absolute
//! indexes into the full table.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::OBJECT_ID_SIZE;
use anyhow::Context;
use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Index file magic
const INDEX_MAGIC: [u8; 4] = [0xFF, b't', b'O', b'c'];
/// Pack file magic
const PACK_MAGIC: [u8; 4] = *b"PACK";
/// Only version-2 indexes and packs are supported
const SUPPORTED_VERSION: u32 = 2;
/// Fanout table entries (one per possible first byte)
const FANOUT_ENTRIES: usize = 256;
/// Flag bit marking a 31-bit offset slot as an index into the 64-bit table
const LARGE_OFFSET_FLAG: u32 = 1 << 31;
/// Trailing bytes after the 64-bit table: pack digest plus index digest
const TRAILER_SIZE: u64 = 2 * OBJECT_ID_SIZE as u64;

/// Reader that feeds every consumed byte through a running SHA-1
///
/// The index trailer is the digest of everything before it, so parsing
/// through this wrapper makes the checksum fall out of the normal read
/// sequence.
struct Checksum<R: Read> {
    source: R,
    digest: Sha1,
}

impl<R: Read> Checksum<R> {
    fn new(source: R) -> Self {
        Checksum {
            source,
            digest: Sha1::new(),
        }
    }

    fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.source
            .read_exact(&mut buffer)
            .map_err(|_| anyhow::anyhow!("Unexpected end-of-file while reading pack index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    fn read_u32(&mut self) -> anyhow::Result<u32> {
        Ok(NetworkEndian::read_u32(&self.read(4)?))
    }

    fn read_u64(&mut self) -> anyhow::Result<u64> {
        Ok(NetworkEndian::read_u64(&self.read(8)?))
    }

    /// Compare the running digest against the 20-byte trailer
    fn verify(mut self) -> anyhow::Result<()> {
        let mut trailer = [0u8; OBJECT_ID_SIZE];
        self.source
            .read_exact(&mut trailer)
            .map_err(|_| anyhow::anyhow!("Unexpected end-of-file while reading pack index"))?;

        let actual = self.digest.finalize();
        if trailer != actual.as_slice() {
            return Err(anyhow::anyhow!(
                "Pack index checksum does not match value stored on disk"
            ));
        }

        Ok(())
    }
}

/// Parsed pack index: the offset map plus the sibling pack path
///
/// Immutable after load; safe to share between readers.
#[derive(Debug, Clone)]
pub struct PackIndex {
    /// Path of the sibling `.pack` file
    pack_path: PathBuf,
    /// Byte offset of every top-level object in the pack
    offsets: HashMap<ObjectId, u64>,
}

impl PackIndex {
    /// Parse a version-2 index file
    ///
    /// Verifies the trailer checksum against a running hash of the file
    /// content and checks the sibling pack's header magic and version.
    pub fn open(index_path: &Path) -> anyhow::Result<Self> {
        let pack_path = index_path.with_extension("pack");
        let file_size = std::fs::metadata(index_path)
            .context(format!("Unable to stat pack index {}", index_path.display()))?
            .len();
        let file = File::open(index_path)
            .context(format!("Unable to open pack index {}", index_path.display()))?;
        let mut reader = Checksum::new(file);

        let magic = reader.read(4)?;
        if magic[..] != INDEX_MAGIC {
            return Err(anyhow::anyhow!(
                "Unknown pack index magic {:?} in {}",
                &magic[..],
                index_path.display()
            ));
        }
        let version = reader.read_u32()?;
        if version != SUPPORTED_VERSION {
            return Err(anyhow::anyhow!("Not a version 2 pack index: {}", version));
        }

        // the fanout table is only used for its final entry, the object count
        let mut object_count = 0u32;
        for _ in 0..FANOUT_ENTRIES {
            object_count = reader.read_u32()?;
        }
        let object_count = object_count as usize;

        // object ids, stored in ascending order
        let mut ids = Vec::with_capacity(object_count);
        for _ in 0..object_count {
            ids.push(ObjectId::from_bytes(&reader.read(OBJECT_ID_SIZE)?)?);
        }

        // CRC-32 of each compressed entry, not verified here
        reader.read(4 * object_count)?;

        // 31-bit offsets; a set top bit redirects into the 64-bit table
        let mut offsets = HashMap::with_capacity(object_count);
        let mut redirected = Vec::new();
        for id in ids {
            let value = reader.read_u32()?;
            if value & LARGE_OFFSET_FLAG > 0 {
                redirected.push((id, value & !LARGE_OFFSET_FLAG));
            } else {
                offsets.insert(id, value as u64);
            }
        }

        // The 64-bit table is absolute, so size it from what remains of the
        // file before the two trailing digests.
        let position = 8
            + 4 * FANOUT_ENTRIES as u64
            + (OBJECT_ID_SIZE as u64 + 4 + 4) * object_count as u64;
        let table_size = file_size
            .checked_sub(position + TRAILER_SIZE)
            .ok_or_else(|| anyhow::anyhow!("Pack index too small for its object count"))?;
        let large_offsets: Vec<u64> = (0..table_size / 8)
            .map(|_| reader.read_u64())
            .collect::<anyhow::Result<_>>()?;

        for (id, slot) in redirected {
            let offset = large_offsets.get(slot as usize).ok_or_else(|| {
                anyhow::anyhow!(
                    "64-bit offset slot {} out of range ({} entries)",
                    slot,
                    large_offsets.len()
                )
            })?;
            offsets.insert(id, *offset);
        }

        // SHA-1 of the sibling pack; part of the hashed content but unused
        reader.read(OBJECT_ID_SIZE)?;
        reader.verify()?;

        Self::check_pack_header(&pack_path)?;

        Ok(PackIndex { pack_path, offsets })
    }

    /// Verify the sibling pack file starts with `PACK` and version 2
    fn check_pack_header(pack_path: &Path) -> anyhow::Result<()> {
        let mut file = File::open(pack_path)
            .context(format!("Missing pack file {}", pack_path.display()))?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header)
            .context(format!("Unable to read pack header {}", pack_path.display()))?;

        if header[..4] != PACK_MAGIC {
            return Err(anyhow::anyhow!(
                "Unknown pack magic {:?} in {}",
                &header[..4],
                pack_path.display()
            ));
        }
        let version = NetworkEndian::read_u32(&header[4..]);
        if version != SUPPORTED_VERSION {
            return Err(anyhow::anyhow!("Not a version 2 pack file: {}", version));
        }

        Ok(())
    }

    /// Look up the pack offset of an object
    pub fn offset_of(&self, id: &ObjectId) -> Option<u64> {
        self.offsets.get(id).copied()
    }

    pub fn pack_path(&self) -> &Path {
        &self.pack_path
    }

    pub fn object_count(&self) -> usize {
        self.offsets.len()
    }

    /// Iterate all `(id, offset)` entries
    pub fn entries(&self) -> impl Iterator<Item = (&ObjectId, u64)> {
        self.offsets.iter().map(|(id, offset)| (id, *offset))
    }
}
