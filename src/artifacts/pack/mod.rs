//! Pack file access
//!
//! A pack stores many objects in a single file, each entry zlib-deflated
//! and optionally delta-compressed against another object. A sibling
//! `.idx` file maps object IDs to byte offsets.
//!
//! - `varint`: the three integer encodings used by pack entries
//! - `inflate`: streaming zlib decompression
//! - `index`: version-2 pack index parsing and verification
//! - `delta`: delta instruction stream application
//! - `reader`: offset-addressed object reads with delta resolution

pub mod delta;
pub mod index;
pub mod inflate;
pub mod reader;
pub mod varint;
