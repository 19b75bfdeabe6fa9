use bytes::Bytes;

/// An item in an HTTP entity stream.
///
/// A content decoder produces either a chunk of entity data or the EOF
/// marker that ends the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A chunk of entity data
    Chunk(Bytes),
    /// Marks the end of the entity stream
    Eof,
}

impl PayloadItem {
    /// Returns true if this item represents the end of the entity stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Returns a reference to the contained bytes if this is a chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// The framing expectation of an HTTP entity.
///
/// Determines how an entity is delimited on the wire: an exact byte count,
/// chunked transfer encoding, or no entity at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Entity with known length in bytes
    Length(u64),
    /// Entity using chunked transfer encoding
    Chunked,
    /// No entity
    Empty,
}

impl PayloadSize {
    /// Returns true if the entity uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if there is no entity
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}
