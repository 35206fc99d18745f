//! Codec result codes.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// The closed set of failure codes produced by the codec.
///
/// Builders coalesce these through their sticky error; parsers surface them
/// immediately. `OutOfMemory` and `GeneralFailure` are semantic aliases
/// (both mean a back-end let the codec down) and callers may collapse them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The output sink is full, or the input ran out before a complete
    /// value was read.
    OutOfSpace,
    /// A backing allocation failed.
    OutOfMemory,
    /// `write_at` targeted bytes outside the written prefix of the stream.
    InvalidPosition,
    /// Malformed wire data: a varint without a terminator in 10 bytes, a
    /// group wire type, or a length delimiter exceeding the remaining input.
    InvalidInput,
    /// Any other back-end failure, including an unsound size estimate
    /// discovered during length back-patching.
    GeneralFailure,
}

pub type Result<T> = result::Result<T, CodecError>;

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let description = match self {
            CodecError::OutOfSpace => "stream out of space",
            CodecError::OutOfMemory => "allocation failed",
            CodecError::InvalidPosition => "write position outside written range",
            CodecError::InvalidInput => "malformed wire data",
            CodecError::GeneralFailure => "codec back-end failure",
        };
        f.write_str(description)
    }
}

impl error::Error for CodecError {}

impl From<CodecError> for io::Error {
    fn from(error: CodecError) -> io::Error {
        let kind = match error {
            CodecError::OutOfSpace => io::ErrorKind::WriteZero,
            CodecError::OutOfMemory | CodecError::GeneralFailure => io::ErrorKind::Other,
            CodecError::InvalidPosition => io::ErrorKind::InvalidInput,
            CodecError::InvalidInput => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, error)
    }
}
