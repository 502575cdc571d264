//! Streaming zlib inflate over pack and loose-object content
//!
//! Pack files concatenate many compressed blobs back to back, so the
//! decompressor must stop at the end of its own stream and tolerate
//! whatever bytes follow. `flate2`'s `ZlibDecoder` already behaves this
//! way; these helpers fix the types used across the object readers.

use flate2::read::ZlibDecoder;
use std::io::{Read, Take};

/// Wrap a byte source in a lazily consumed inflate stream
pub fn stream<R: Read>(source: R) -> ZlibDecoder<R> {
    ZlibDecoder::new(source)
}

/// Inflate stream limited to the logical object length
///
/// Callers read exactly `length` bytes; the limit keeps a consumer from
/// running past the end of the object it asked for.
pub fn stream_exact<R: Read>(source: R, length: u64) -> Take<ZlibDecoder<R>> {
    ZlibDecoder::new(source).take(length)
}
