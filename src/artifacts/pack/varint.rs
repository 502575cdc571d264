//! Variable-length integer encodings used inside pack files
//!
//! Pack files use three distinct encodings that are easy to confuse:
//!
//! - The entry header size: 4 length bits in the first byte, then 7 bits
//!   per continuation byte at increasing shifts
//! - Base-128 little-endian numbers inside delta payloads
//! - The backwards offset of an OffsetDelta entry, which folds a
//!   `(value + 1) << 7` adjustment into every continuation byte

use anyhow::Context;
use std::io::Read;

/// Continuation flag shared by all three encodings
const CONTINUE_BIT: u8 = 0x80;

/// Bit shift contributed by each byte position of an entry header size
const ENTRY_SIZE_SHIFTS: [u32; 10] = [0, 4, 11, 18, 25, 32, 39, 46, 53, 60];

/// Decode the logical object size from a pack entry header
///
/// The first byte carries the type tag in bits 4-6 and the low 4 size bits;
/// each continuation byte appends 7 bits at the next shift.
///
/// # Returns
///
/// The size and the number of header bytes consumed.
pub fn read_entry_size(buf: &[u8]) -> anyhow::Result<(u64, usize)> {
    let first = *buf
        .first()
        .ok_or_else(|| anyhow::anyhow!("Truncated pack entry header"))?;

    let mut size = (first & 0x0F) as u64;
    let mut advance = 0;

    while buf[advance] & CONTINUE_BIT > 0 {
        advance += 1;
        let byte = *buf
            .get(advance)
            .ok_or_else(|| anyhow::anyhow!("Truncated pack entry header"))?;
        let shift = *ENTRY_SIZE_SHIFTS
            .get(advance)
            .ok_or_else(|| anyhow::anyhow!("Pack entry size does not fit in 64 bits"))?;
        size += ((byte & 0x7F) as u64) << shift;
    }

    Ok((size, advance + 1))
}

/// Decode a base-128 little-endian number from a delta payload
///
/// The low 7 bits of every byte are value bits at increasing shifts of 7;
/// bit 7 signals continuation. Used for the base-length and result-length
/// headers of a delta payload.
pub fn read_base128_le(reader: &mut impl Read) -> anyhow::Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = read_byte(reader).context("Truncated delta size header")?;
        if shift >= u64::BITS {
            return Err(anyhow::anyhow!("Base-128 number does not fit in 64 bits"));
        }

        value |= ((byte & 0x7F) as u64) << shift;
        if byte & CONTINUE_BIT == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Decode the backwards base offset of an OffsetDelta entry
///
/// The first byte contributes its low 7 bits directly; every continuation
/// byte folds in via `(value + 1) << 7`, which biases the encoding so that
/// multi-byte offsets have no redundant representations.
///
/// # Returns
///
/// The offset distance and the number of bytes consumed.
pub fn read_base_offset(buf: &[u8]) -> anyhow::Result<(u64, usize)> {
    let truncated = || anyhow::anyhow!("Truncated delta base offset");
    let mut pos = 0;
    let mut byte = *buf.first().ok_or_else(truncated)?;
    let mut value = (byte & 0x7F) as u64;

    while byte & CONTINUE_BIT > 0 {
        pos += 1;
        byte = *buf.get(pos).ok_or_else(truncated)?;
        value = value
            .checked_add(1)
            .and_then(|v| v.checked_shl(7))
            .ok_or_else(|| anyhow::anyhow!("Delta base offset does not fit in 64 bits"))?
            | (byte & 0x7F) as u64;
    }

    Ok((value, pos + 1))
}

pub(crate) fn read_byte(reader: &mut impl Read) -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}
