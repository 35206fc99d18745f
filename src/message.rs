//! The protobuf message contract.

use crate::builder::MessageBuilder;
use crate::error::Result;
use crate::parser::MessageParser;
use crate::stream::{InputStream, OutputStream, SliceInputStream, VecOutputStream};

/// A protobuf message.
///
/// Implementations are normally emitted by `protoc-gen-picopb`; the three
/// methods form one contract. `estimate_size` supplies the upper bound the
/// builder uses to size reserved length varints, so it must never
/// under-estimate (over-estimating only widens a length delimiter; the
/// builder pads the true length out to the reserved width).
pub trait Message: Default {
    /// An upper bound on the encoded size in bytes. May over-estimate.
    /// Zero means unknown and is treated as unbounded.
    fn estimate_size(&self) -> usize;

    /// Writes this message's fields, in declaration order, to the builder.
    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<S>) -> Result<()>;

    /// Merges fields from the parser into `self` until its input is
    /// exhausted. Unknown fields are skipped. On failure `self` may be
    /// partially populated and must not be relied upon.
    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<S>) -> Result<()>;

    /// Encodes this message into a fresh byte vector.
    fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut out = VecOutputStream::new(&mut buf);
            let mut builder = MessageBuilder::new(&mut out);
            self.encode(&mut builder)?;
            builder.last_error()?;
        }
        Ok(buf)
    }

    /// Merges an encoded message held in a byte slice into `self`.
    fn decode_from_slice(&mut self, data: &[u8]) -> Result<()> {
        let mut input = SliceInputStream::new(data);
        let mut parser = MessageParser::new(&mut input);
        self.decode(&mut parser)
    }
}
