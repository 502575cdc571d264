//! Raw object values returned by the store
//!
//! A raw object is the `(type, length, content)` triple produced by the
//! loose-object and pack readers, before any type-specific parsing.

use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::io::{Cursor, Read};

/// Byte stream over an object's inflated content
///
/// Yields exactly the object's logical length when read to the end. The
/// stream owns its underlying file handle and inflate state, so callers
/// should either consume it fully or drop it.
pub type ContentStream = Box<dyn Read>;

/// A decoded object: its type, logical length and content stream
///
/// `content` is `None` when the object was read size-only.
pub struct RawObject {
    pub object_type: ObjectType,
    pub length: u64,
    pub content: Option<ContentStream>,
}

impl std::fmt::Debug for RawObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawObject")
            .field("object_type", &self.object_type)
            .field("length", &self.length)
            .field("content", &self.content.as_ref().map(|_| "ContentStream"))
            .finish()
    }
}

impl RawObject {
    /// A size-only result carrying no content stream
    pub(crate) fn sized(object_type: ObjectType, length: u64) -> Self {
        RawObject {
            object_type,
            length,
            content: None,
        }
    }

    /// An object whose content is consumed lazily from a stream
    pub(crate) fn streamed(object_type: ObjectType, length: u64, content: ContentStream) -> Self {
        RawObject {
            object_type,
            length,
            content: Some(content),
        }
    }

    /// An object whose content is already materialized in memory
    pub(crate) fn buffered(object_type: ObjectType, length: u64, content: Bytes) -> Self {
        RawObject {
            object_type,
            length,
            content: Some(Box::new(Cursor::new(content))),
        }
    }

    /// Consume the content stream, returning the full object content
    ///
    /// Fails if the object was read size-only or if the stream yields fewer
    /// bytes than the declared length.
    pub fn into_bytes(self) -> anyhow::Result<Bytes> {
        let mut stream = self
            .content
            .ok_or_else(|| anyhow::anyhow!("Object was read size-only"))?;

        let mut content = Vec::with_capacity(self.length as usize);
        stream.read_to_end(&mut content)?;

        if content.len() as u64 != self.length {
            return Err(anyhow::anyhow!(
                "Object content is {} bytes, header declared {}",
                content.len(),
                self.length
            ));
        }

        Ok(content.into())
    }
}
