//! Pack file object reader
//!
//! Reads one object out of a pack at a known byte offset, resolving delta
//! chains recursively against their base objects. The type returned for a
//! delta object is the type of the ultimate non-delta base.

use crate::artifacts::objects::object::RawObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::OBJECT_ID_SIZE;
use crate::artifacts::pack::index::PackIndex;
use crate::artifacts::pack::{delta, inflate, varint};
use anyhow::Context;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Enough for the largest plausible entry header: size varint, base offset
/// varint or 20-byte base id
const HEADER_BUFFER_SIZE: usize = 1024;

/// Read the object stored at `offset` in the given pack
///
/// Non-delta entries are inflated in place; delta entries resolve their
/// base (by backwards offset or by id through the pack's own index) and
/// apply the instruction stream on top of it.
///
/// With `size_only`, returns the type and logical length without touching
/// the content, closing the pack before returning.
pub fn read_pack_object(
    pack_path: &Path,
    indexes: &HashMap<PathBuf, PackIndex>,
    offset: u64,
    size_only: bool,
) -> anyhow::Result<RawObject> {
    let mut file = File::open(pack_path)
        .context(format!("Unable to open pack file {}", pack_path.display()))?;
    file.seek(SeekFrom::Start(offset))
        .context(format!("Unable to seek in pack file {}", pack_path.display()))?;

    let mut header = [0u8; HEADER_BUFFER_SIZE];
    let header_len = read_up_to(&mut file, &mut header)?;
    let header = &header[..header_len];
    if header.is_empty() {
        return Err(anyhow::anyhow!(
            "Nothing read from pack file at offset {}",
            offset
        ));
    }

    let object_type = ObjectType::from_pack_tag((header[0] & 0x70) >> 4)?;
    let (size, mut position) = varint::read_entry_size(header)?;

    let base_offset = match object_type {
        ObjectType::Commit | ObjectType::Tree | ObjectType::Blob | ObjectType::Tag => {
            if size_only {
                return Ok(RawObject::sized(object_type, size));
            }

            file.seek(SeekFrom::Start(offset + position as u64))?;
            let content = inflate::stream_exact(file, size);
            return Ok(RawObject::streamed(object_type, size, Box::new(content)));
        }
        ObjectType::OffsetDelta => {
            let (distance, advance) = varint::read_base_offset(&header[position..])?;
            position += advance;
            offset.checked_sub(distance).ok_or_else(|| {
                anyhow::anyhow!(
                    "Delta base offset {} reaches before the start of the pack",
                    distance
                )
            })?
        }
        ObjectType::RefDelta => {
            let id_bytes = header
                .get(position..position + OBJECT_ID_SIZE)
                .ok_or_else(|| anyhow::anyhow!("Truncated base id in pack entry header"))?;
            let base_id = ObjectId::from_bytes(id_bytes)?;
            position += OBJECT_ID_SIZE;

            let index_path = pack_path.with_extension("idx");
            let index = indexes
                .get(&index_path)
                .ok_or_else(|| anyhow::anyhow!("No index loaded for pack {}", pack_path.display()))?;
            index.offset_of(&base_id).ok_or_else(|| {
                anyhow::anyhow!("Base object {} is not present in the pack index", base_id)
            })?
        }
    };

    // resolve the base first, then apply this entry's delta on top of it
    let base = read_pack_object(pack_path, indexes, base_offset, false)?;
    let base_type = base.object_type;
    let base_content = base.into_bytes()?;

    file.seek(SeekFrom::Start(offset + position as u64))?;
    let mut delta_stream = inflate::stream(file);

    let _base_length = varint::read_base128_le(&mut delta_stream)?;
    let result_length = varint::read_base128_le(&mut delta_stream)?;

    if size_only {
        return Ok(RawObject::sized(base_type, result_length));
    }

    let content = delta::apply_delta(&base_content, &mut delta_stream, result_length)?;
    Ok(RawObject::buffered(base_type, result_length, content))
}

/// Fill as much of `buf` as the file has left, returning the filled length
///
/// A pack trailer can land inside the last header buffer, so a short read
/// near the end of the file is normal.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> anyhow::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let count = file.read(&mut buf[filled..])?;
        if count == 0 {
            break;
        }
        filled += count;
    }
    Ok(filled)
}
