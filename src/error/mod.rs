//! Error types for packetrs.

use std::io;

/// Errors that can occur while reading, writing or configuring packets.
///
/// End-of-data and malformed-input errors are recoverable: the packet keeps
/// a consistent cursor and the caller may retry once more bytes are
/// available. Invariant violations (writing into shared chunks, double
/// recycling) are not represented here; they panic.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    /// A read needed more bytes than the input could provide.
    #[error("end of data: {required} byte(s) required but only {available} available")]
    EndOfData {
        /// Bytes the operation needed.
        required: usize,
        /// Bytes that were available when the operation failed.
        available: usize,
    },

    /// Text decoding hit an invalid or truncated UTF-8 sequence.
    #[error("malformed UTF-8 input: {message}")]
    MalformedInput {
        /// Description of what was invalid.
        message: String,
    },

    /// A line or delimited text read exceeded its character limit.
    #[error("too many characters: limit of {limit} exceeded")]
    LimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// A contiguous window larger than a chunk can hold was requested.
    #[error("window of {requested} bytes exceeds chunk capacity ({max})")]
    WindowTooLarge {
        /// The requested window size.
        requested: usize,
        /// The largest window a pooled chunk can provide.
        max: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// The underlying source or sink failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PacketError>;

impl PacketError {
    pub(crate) fn end_of_data(required: usize, available: usize) -> Self {
        PacketError::EndOfData {
            required,
            available,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        PacketError::MalformedInput {
            message: message.into(),
        }
    }

    /// Returns true for [`PacketError::EndOfData`].
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, PacketError::EndOfData { .. })
    }
}

impl From<PacketError> for io::Error {
    fn from(e: PacketError) -> Self {
        match e {
            PacketError::Io(e) => e,
            PacketError::EndOfData { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
