use std::fmt;
use std::io;
use std::io::{Read, Write};

use bytes::Bytes;

use crate::protocol::PayloadSize;

/// A response entity.
///
/// Either a self-contained byte payload with a known length, or a reader
/// streamed through the output buffer under chunked framing. Either way
/// the entity writes itself into the connection's output stream, so its
/// size never affects the connection's memory footprint.
pub enum RespBody {
    /// Entity with known content, framed by length
    Bytes(Bytes),
    /// Entity streamed from a reader, framed chunked
    Stream(Box<dyn Read + Send>),
}

impl RespBody {
    /// An entity streaming from the given reader.
    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// The framing this entity needs on the wire.
    pub fn payload_size(&self) -> PayloadSize {
        match self {
            Self::Bytes(bytes) => PayloadSize::Length(bytes.len() as u64),
            Self::Stream(_) => PayloadSize::Chunked,
        }
    }

    /// Writes the whole entity into `out`.
    pub fn write_to(self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Bytes(bytes) => out.write_all(&bytes),
            Self::Stream(mut reader) => {
                io::copy(&mut reader, out)?;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RespBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

impl From<Bytes> for RespBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RespBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for RespBody {
    fn from(text: String) -> Self {
        Self::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for RespBody {
    fn from(text: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(text.as_bytes()))
    }
}
