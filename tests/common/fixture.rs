//! On-disk repository fixtures
//!
//! Builders that write real `.git/objects` content byte for byte: loose
//! objects, pack files and version-2 pack indexes. Tests drive the readers
//! against exactly what git would put on disk.

use assert_fs::TempDir;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lore::areas::object_store::ObjectStore;
use lore::artifacts::objects::object_id::ObjectId;
use sha1::{Digest, Sha1};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A temporary repository with a real `.git` layout
pub struct RepoFixture {
    dir: TempDir,
}

impl RepoFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join(".git/objects/pack")).unwrap();
        fs::create_dir_all(dir.path().join(".git/refs/heads")).unwrap();

        RepoFixture { dir }
    }

    pub fn workdir(&self) -> &Path {
        self.dir.path()
    }

    pub fn git_path(&self) -> PathBuf {
        self.dir.path().join(".git")
    }

    pub fn objects_path(&self) -> PathBuf {
        self.git_path().join("objects")
    }

    pub fn pack_dir(&self) -> PathBuf {
        self.objects_path().join("pack")
    }

    pub fn store(&self) -> ObjectStore {
        ObjectStore::open(&self.git_path()).expect("Failed to open object store")
    }

    /// Write a loose object in canonical deflated form, returning its id
    pub fn write_loose(&self, kind: &str, payload: &[u8]) -> ObjectId {
        let (id, raw) = hash_object(kind, payload);
        let path = self.objects_path().join(id.to_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, deflate(&raw)).unwrap();
        id
    }

    /// Write raw (pre-deflate) bytes under an arbitrary id, bypassing the
    /// canonical header; for malformed-object tests
    pub fn write_loose_raw(&self, id: &ObjectId, raw: &[u8]) {
        let path = self.objects_path().join(id.to_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, deflate(raw)).unwrap();
    }

    pub fn write_blob(&self, content: &str) -> ObjectId {
        self.write_loose("blob", content.as_bytes())
    }

    /// Write a tree; entries are `(mode, name, oid)` in sorted name order
    pub fn write_tree(&self, entries: &[(&str, &str, ObjectId)]) -> ObjectId {
        self.write_loose("tree", &tree_payload(entries))
    }

    pub fn write_commit(
        &self,
        tree: ObjectId,
        parents: &[ObjectId],
        timestamp: i64,
        message: &str,
    ) -> ObjectId {
        self.write_loose("commit", &commit_payload(tree, parents, timestamp, message))
    }

    /// Point HEAD at a branch and the branch at a commit
    pub fn set_head(&self, branch: &str, oid: ObjectId) {
        fs::write(
            self.git_path().join("HEAD"),
            format!("ref: refs/heads/{branch}\n"),
        )
        .unwrap();
        fs::write(
            self.git_path().join("refs/heads").join(branch),
            format!("{oid}\n"),
        )
        .unwrap();
    }
}

/// Compute the id and canonical raw form of an object
pub fn hash_object(kind: &str, payload: &[u8]) -> (ObjectId, Vec<u8>) {
    let mut raw = format!("{} {}\0", kind, payload.len()).into_bytes();
    raw.extend_from_slice(payload);
    let digest = Sha1::digest(&raw);

    (ObjectId::from_bytes(&digest).unwrap(), raw)
}

pub fn object_id_of(kind: &str, payload: &[u8]) -> ObjectId {
    hash_object(kind, payload).0
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn tree_payload(entries: &[(&str, &str, ObjectId)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (mode, name, oid) in entries {
        payload.extend_from_slice(mode.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(oid.as_bytes());
    }
    payload
}

pub fn commit_payload(
    tree: ObjectId,
    parents: &[ObjectId],
    timestamp: i64,
    message: &str,
) -> Vec<u8> {
    let mut lines = vec![format!("tree {tree}")];
    for parent in parents {
        lines.push(format!("parent {parent}"));
    }
    lines.push(format!(
        "author A U Thor <author@example.com> {timestamp} +0000"
    ));
    lines.push(format!(
        "committer C O Mitter <committer@example.com> {timestamp} +0000"
    ));
    lines.push(String::new());
    lines.push(message.to_string());

    lines.join("\n").into_bytes()
}

/// One pack entry as the builder will encode it
enum PackObject {
    Plain {
        kind: &'static str,
        payload: Vec<u8>,
    },
    OffsetDelta {
        base: usize,
        delta: Vec<u8>,
        result_id: ObjectId,
    },
    RefDelta {
        base_id: ObjectId,
        delta: Vec<u8>,
        result_id: ObjectId,
    },
}

/// Builds a `.pack`/`.idx` pair the way git lays them out
///
/// Delta entries are registered in the index under the id of their resolved
/// result, which the caller supplies.
pub struct PackBuilder {
    objects: Vec<PackObject>,
}

impl PackBuilder {
    pub fn new() -> Self {
        PackBuilder {
            objects: Vec::new(),
        }
    }

    /// Add a non-delta object; returns its entry handle
    pub fn add(&mut self, kind: &'static str, payload: &[u8]) -> usize {
        self.objects.push(PackObject::Plain {
            kind,
            payload: payload.to_vec(),
        });
        self.objects.len() - 1
    }

    /// Add a delta whose base is an earlier entry, addressed by offset
    pub fn add_offset_delta(&mut self, base: usize, delta: Vec<u8>, result_id: ObjectId) -> usize {
        self.objects.push(PackObject::OffsetDelta {
            base,
            delta,
            result_id,
        });
        self.objects.len() - 1
    }

    /// Add a delta whose base is addressed by object id
    pub fn add_ref_delta(&mut self, base_id: ObjectId, delta: Vec<u8>, result_id: ObjectId) -> usize {
        self.objects.push(PackObject::RefDelta {
            base_id,
            delta,
            result_id,
        });
        self.objects.len() - 1
    }

    /// Write `<name>.pack` and `<name>.idx` into the pack directory
    ///
    /// Returns the `(id, offset)` of every entry in insertion order.
    pub fn write(&self, pack_dir: &Path, name: &str) -> Vec<(ObjectId, u64)> {
        self.write_with(pack_dir, name, false)
    }

    /// Like `write`, but route every offset through the 64-bit table
    pub fn write_with_large_offsets(&self, pack_dir: &Path, name: &str) -> Vec<(ObjectId, u64)> {
        self.write_with(pack_dir, name, true)
    }

    fn write_with(&self, pack_dir: &Path, name: &str, force_large: bool) -> Vec<(ObjectId, u64)> {
        let mut pack = Vec::new();
        pack.extend_from_slice(b"PACK");
        pack.extend_from_slice(&2u32.to_be_bytes());
        pack.extend_from_slice(&(self.objects.len() as u32).to_be_bytes());

        let mut entries: Vec<(ObjectId, u64)> = Vec::new();
        for object in &self.objects {
            let offset = pack.len() as u64;
            match object {
                PackObject::Plain { kind, payload } => {
                    pack.extend(entry_header(pack_tag(kind), payload.len() as u64));
                    pack.extend(deflate(payload));
                    entries.push((object_id_of(kind, payload), offset));
                }
                PackObject::OffsetDelta {
                    base,
                    delta,
                    result_id,
                } => {
                    let distance = offset - entries[*base].1;
                    pack.extend(entry_header(6, delta.len() as u64));
                    pack.extend(encode_base_offset(distance));
                    pack.extend(deflate(delta));
                    entries.push((*result_id, offset));
                }
                PackObject::RefDelta {
                    base_id,
                    delta,
                    result_id,
                } => {
                    pack.extend(entry_header(7, delta.len() as u64));
                    pack.extend_from_slice(base_id.as_bytes());
                    pack.extend(deflate(delta));
                    entries.push((*result_id, offset));
                }
            }
        }

        let pack_digest = Sha1::digest(&pack);
        pack.extend_from_slice(&pack_digest);
        fs::write(pack_dir.join(format!("{name}.pack")), &pack).unwrap();

        write_index(pack_dir, name, &entries, &pack_digest, force_large);
        entries
    }
}

fn pack_tag(kind: &str) -> u8 {
    match kind {
        "commit" => 1,
        "tree" => 2,
        "blob" => 3,
        "tag" => 4,
        _ => panic!("Unknown object kind: {kind}"),
    }
}

/// Encode a pack entry header: type in bits 4-6 of byte 0, size low 4 bits
/// first, then 7-bit chunks
pub fn entry_header(tag: u8, size: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut byte = (tag << 4) | (size & 0x0F) as u8;
    let mut size = size >> 4;
    while size > 0 {
        out.push(byte | 0x80);
        byte = (size & 0x7F) as u8;
        size >>= 7;
    }
    out.push(byte);
    out
}

/// Encode an OffsetDelta base distance (the `(value + 1) << 7` form)
pub fn encode_base_offset(mut value: u64) -> Vec<u8> {
    let mut out = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        value -= 1;
        out.insert(0, 0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out
}

/// Encode a base-128 little-endian number
pub fn base128_le(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out;
        }
    }
}

/// Assemble a delta payload: the two size headers plus instructions
pub fn delta_payload(base_len: u64, result_len: u64, instructions: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = base128_le(base_len);
    payload.extend(base128_le(result_len));
    for instruction in instructions {
        payload.extend_from_slice(instruction);
    }
    payload
}

/// A copy-from-base delta instruction
pub fn delta_copy(offset: u32, size: u32) -> Vec<u8> {
    let mut instruction = vec![0x80];
    for bit in 0..4 {
        let byte = (offset >> (8 * bit)) as u8;
        if byte != 0 {
            instruction[0] |= 1 << bit;
            instruction.push(byte);
        }
    }
    for bit in 0..3 {
        let byte = (size >> (8 * bit)) as u8;
        if byte != 0 {
            instruction[0] |= 1 << (bit + 4);
            instruction.push(byte);
        }
    }
    instruction
}

/// A literal-insert delta instruction
pub fn delta_insert(data: &[u8]) -> Vec<u8> {
    let mut instruction = vec![data.len() as u8];
    instruction.extend_from_slice(data);
    instruction
}

/// Write a version-2 index for the given entries
///
/// The trailer checksum is computed for real; `force_large` routes every
/// offset through the 64-bit table regardless of magnitude.
pub fn write_index(
    pack_dir: &Path,
    name: &str,
    entries: &[(ObjectId, u64)],
    pack_digest: &[u8],
    force_large: bool,
) {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|(id, _)| *id);

    let mut idx = Vec::new();
    idx.extend_from_slice(&[0xFF, b't', b'O', b'c']);
    idx.extend_from_slice(&2u32.to_be_bytes());

    let mut counts = [0u32; 256];
    for (id, _) in &sorted {
        counts[id.as_bytes()[0] as usize] += 1;
    }
    let mut running = 0u32;
    for count in counts {
        running += count;
        idx.extend_from_slice(&running.to_be_bytes());
    }

    for (id, _) in &sorted {
        idx.extend_from_slice(id.as_bytes());
    }

    // CRC-32 table; the reader skips it
    idx.extend(std::iter::repeat(0u8).take(4 * sorted.len()));

    let mut large = Vec::new();
    for (_, offset) in &sorted {
        if force_large || *offset > i32::MAX as u64 {
            let slot = (large.len() / 8) as u32;
            idx.extend_from_slice(&(0x8000_0000u32 | slot).to_be_bytes());
            large.extend_from_slice(&offset.to_be_bytes());
        } else {
            idx.extend_from_slice(&(*offset as u32).to_be_bytes());
        }
    }
    idx.extend_from_slice(&large);

    idx.extend_from_slice(pack_digest);
    let digest = Sha1::digest(&idx);
    idx.extend_from_slice(&digest);

    fs::write(pack_dir.join(format!("{name}.idx")), idx).unwrap();
}
