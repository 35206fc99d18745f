//! Single-pass message serialization.
//!
//! A [`MessageBuilder`] writes typed fields in call order. Sub-messages and
//! packed varint blocks are framed without buffering: the builder reserves
//! a length varint wide enough for the payload's upper bound, encodes the
//! payload, then back-patches the true length into the reserved bytes,
//! padding it to the reserved width with continuation bits.

use crate::encoding::{
    encode_fixed32, encode_fixed64, encode_key, encode_varint, encoded_len_varint, varint_to_buf,
    WireType,
};
use crate::error::{CodecError, Result};
use crate::message::Message;
use crate::stream::OutputStream;

/// Writes the fields of one message to an output stream.
///
/// The builder carries a sticky error: after the first failure every
/// emitter returns the stored error without touching the stream, so a
/// sequence of emitter calls can be checked once through [`last_error`].
/// The emitters also return `Result`, so `?` works equally well.
///
/// [`last_error`]: MessageBuilder::last_error
pub struct MessageBuilder<'a, S: OutputStream> {
    out: &'a mut S,
    error: Result<()>,
}

macro_rules! varint_field {
    ($(#[$attr:meta])* $name:ident, $ty:ty, |$value:ident| $to_u64:expr) => {
        $(#[$attr])*
        pub fn $name(&mut self, tag: u32, $value: $ty) -> Result<()> {
            self.track(|builder| {
                encode_key(tag, WireType::Varint, builder.out)?;
                encode_varint($to_u64, builder.out)
            })
        }
    };
}

macro_rules! fixed_field {
    ($(#[$attr:meta])* $name:ident, $ty:ty, $wire_type:expr, $encode:ident,
     |$value:ident| $to_bits:expr) => {
        $(#[$attr])*
        pub fn $name(&mut self, tag: u32, $value: $ty) -> Result<()> {
            self.track(|builder| {
                encode_key(tag, $wire_type, builder.out)?;
                $encode($to_bits, builder.out)
            })
        }
    };
}

macro_rules! packed_varint_field {
    ($name:ident, $ty:ty, |$value:ident| $to_u64:expr) => {
        /// Emits the values as a single length-delimited block of varints.
        /// An empty slice emits nothing.
        pub fn $name(&mut self, tag: u32, values: &[$ty]) -> Result<()> {
            if values.is_empty() {
                return self.last_error();
            }
            self.track(|builder| {
                encode_key(tag, WireType::LengthDelimited, builder.out)?;
                builder.length_patched(10 * values.len() as u64, |builder| {
                    for &$value in values {
                        encode_varint($to_u64, builder.out)?;
                    }
                    Ok(())
                })
            })
        }
    };
}

macro_rules! packed_fixed_field {
    ($name:ident, $ty:ty, $width:expr, $encode:ident, |$value:ident| $to_bits:expr) => {
        /// Emits the values as a single length-delimited block of
        /// fixed-width elements. The block length is exact, so no
        /// back-patching is involved. An empty slice emits nothing.
        pub fn $name(&mut self, tag: u32, values: &[$ty]) -> Result<()> {
            if values.is_empty() {
                return self.last_error();
            }
            self.track(|builder| {
                encode_key(tag, WireType::LengthDelimited, builder.out)?;
                encode_varint($width * values.len() as u64, builder.out)?;
                for &$value in values {
                    $encode($to_bits, builder.out)?;
                }
                Ok(())
            })
        }
    };
}

impl<'a, S: OutputStream> MessageBuilder<'a, S> {
    pub fn new(out: &'a mut S) -> MessageBuilder<'a, S> {
        MessageBuilder { out, error: Ok(()) }
    }

    /// The sticky error: `Ok` until the first emitter fails, that failure
    /// afterwards.
    pub fn last_error(&self) -> Result<()> {
        self.error
    }

    fn track<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.error?;
        let result = op(self);
        self.error = result;
        result
    }

    /// Writes a length-delimited payload of at most `bound` bytes.
    ///
    /// Reserves `encoded_len_varint(bound)` zero bytes, runs the payload,
    /// then overwrites the reservation with the true length padded to the
    /// reserved width: all but the final reserved byte get the
    /// continuation bit. A payload that outgrows `bound` is an unsound
    /// estimate and fails with `GeneralFailure`.
    fn length_patched<F>(&mut self, bound: u64, payload: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let width = encoded_len_varint(bound);
        let start = self.out.position();
        self.out.write(&[0u8; 10][..width])?;

        payload(self)?;

        let len = self.out.position() - (start + width);
        if len as u64 > bound {
            return Err(CodecError::GeneralFailure);
        }
        let mut scratch = [0u8; 10];
        varint_to_buf(len as u64, &mut scratch);
        for byte in scratch[..width - 1].iter_mut() {
            *byte |= 0x80;
        }
        self.out.write_at(start, &scratch[..width])
    }

    varint_field!(
        /// `int32`: negative values sign-extend to ten wire bytes.
        int32_field, i32, |value| value as i64 as u64);
    varint_field!(int64_field, i64, |value| value as u64);
    varint_field!(uint32_field, u32, |value| u64::from(value));
    varint_field!(uint64_field, u64, |value| value);
    varint_field!(
        /// `sint32`: 32-bit zig-zag.
        sint32_field, i32, |value| u64::from(((value << 1) ^ (value >> 31)) as u32));
    varint_field!(
        /// `sint64`: 64-bit zig-zag.
        sint64_field, i64, |value| ((value << 1) ^ (value >> 63)) as u64);
    varint_field!(bool_field, bool, |value| u64::from(value));

    fixed_field!(fixed32_field, u32, WireType::Fixed32, encode_fixed32, |value| value);
    fixed_field!(sfixed32_field, i32, WireType::Fixed32, encode_fixed32, |value| value as u32);
    fixed_field!(float_field, f32, WireType::Fixed32, encode_fixed32, |value| value.to_bits());
    fixed_field!(fixed64_field, u64, WireType::Fixed64, encode_fixed64, |value| value);
    fixed_field!(sfixed64_field, i64, WireType::Fixed64, encode_fixed64, |value| value as u64);
    fixed_field!(double_field, f64, WireType::Fixed64, encode_fixed64, |value| value.to_bits());

    /// Emits a `string` field. The payload is taken verbatim; valid UTF-8
    /// is guaranteed by `&str` itself.
    pub fn string_field(&mut self, tag: u32, value: &str) -> Result<()> {
        self.track(|builder| {
            encode_key(tag, WireType::LengthDelimited, builder.out)?;
            encode_varint(value.len() as u64, builder.out)?;
            builder.out.write(value.as_bytes())
        })
    }

    /// Emits a `bytes` field. Arbitrary binary, no validation.
    pub fn bytes_field(&mut self, tag: u32, value: &[u8]) -> Result<()> {
        self.track(|builder| {
            encode_key(tag, WireType::LengthDelimited, builder.out)?;
            encode_varint(value.len() as u64, builder.out)?;
            builder.out.write(value)
        })
    }

    /// Emits a sub-message, framed by a back-patched length sized from the
    /// message's own estimate. An estimate of zero means unknown and
    /// reserves the full ten bytes.
    pub fn message_field<M: Message>(&mut self, tag: u32, value: &M) -> Result<()> {
        self.track(|builder| {
            encode_key(tag, WireType::LengthDelimited, builder.out)?;
            let estimate = value.estimate_size();
            let bound = if estimate == 0 {
                u64::max_value()
            } else {
                estimate as u64
            };
            builder.length_patched(bound, |builder| value.encode(builder))
        })
    }

    packed_varint_field!(packed_int32_field, i32, |value| value as i64 as u64);
    packed_varint_field!(packed_int64_field, i64, |value| value as u64);
    packed_varint_field!(packed_uint32_field, u32, |value| u64::from(value));
    packed_varint_field!(packed_uint64_field, u64, |value| value);
    packed_varint_field!(packed_sint32_field, i32, |value| u64::from(
        ((value << 1) ^ (value >> 31)) as u32
    ));
    packed_varint_field!(packed_sint64_field, i64, |value| ((value << 1)
        ^ (value >> 63))
        as u64);
    packed_varint_field!(packed_bool_field, bool, |value| u64::from(value));

    packed_fixed_field!(packed_fixed32_field, u32, 4, encode_fixed32, |value| value);
    packed_fixed_field!(packed_sfixed32_field, i32, 4, encode_fixed32, |value| value as u32);
    packed_fixed_field!(packed_float_field, f32, 4, encode_fixed32, |value| value.to_bits());
    packed_fixed_field!(packed_fixed64_field, u64, 8, encode_fixed64, |value| value);
    packed_fixed_field!(packed_sfixed64_field, i64, 8, encode_fixed64, |value| value as u64);
    packed_fixed_field!(packed_double_field, f64, 8, encode_fixed64, |value| value.to_bits());
}
