//! Low-level wire primitives: varints, zig-zag, fixed widths, field keys.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};
use crate::stream::{InputStream, OutputStream};

/// Minimum field id accepted by `protoc`-produced descriptors.
pub const MIN_TAG: u32 = 1;
/// Maximum field id accepted by `protoc`-produced descriptors. The wire
/// codec itself tolerates the full `u32` range.
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// The 3-bit payload framing tag carried with every field id.
///
/// `StartGroup` and `EndGroup` are recognized so that a key containing them
/// can be decoded, but any attempt to consume such a field fails with
/// `InvalidInput`; group framing is deprecated proto2 and unsupported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn try_from(value: u8) -> Result<WireType> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(CodecError::InvalidInput),
        }
    }
}

/// Returns the encoded length of the value in base-128 varint format,
/// between 1 and 10 inclusive.
#[inline]
pub fn encoded_len_varint(value: u64) -> usize {
         if value < 1 <<  7 { 1 }
    else if value < 1 << 14 { 2 }
    else if value < 1 << 21 { 3 }
    else if value < 1 << 28 { 4 }
    else if value < 1 << 35 { 5 }
    else if value < 1 << 42 { 6 }
    else if value < 1 << 49 { 7 }
    else if value < 1 << 56 { 8 }
    else if value < 1 << 63 { 9 }
    else { 10 }
}

/// Zig-zag maps signed integers onto unsigned ones so that small
/// magnitudes of either sign stay short on the wire.
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

/// Encodes `value` into the caller's scratch buffer, returning the number
/// of bytes used (1 to 10).
#[inline]
pub fn varint_to_buf(mut value: u64, buf: &mut [u8; 10]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = ((value & 0x7f) | 0x80) as u8;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Writes `value` in base-128 varint format, 1 to 10 bytes.
#[inline]
pub fn encode_varint<S>(value: u64, out: &mut S) -> Result<()>
where
    S: OutputStream,
{
    let mut scratch = [0u8; 10];
    let len = varint_to_buf(value, &mut scratch);
    out.write(&scratch[..len])
}

/// Zig-zag encodes `value`, then writes it as a varint.
#[inline]
pub fn encode_signed_varint<S>(value: i64, out: &mut S) -> Result<()>
where
    S: OutputStream,
{
    encode_varint(zigzag_encode(value), out)
}

/// Decodes a base-128 varint.
///
/// When the source supports peeking, the terminator is located in a peeked
/// window of up to 10 bytes and the input is skipped past it in one step.
/// Sources that cannot peek fall back to single-byte reads. A varint whose
/// tenth byte still has the continuation bit set, or whose terminator lies
/// beyond the readable window, is `InvalidInput`.
pub fn decode_varint<S>(input: &mut S) -> Result<u64>
where
    S: InputStream + ?Sized,
{
    let mut value = 0u64;

    let mut advance = 0;
    let window = input.peek(10);
    if !window.is_empty() {
        for (i, &byte) in window.iter().enumerate() {
            value |= u64::from(byte & 0x7f) << (i * 7);
            if byte < 0x80 {
                advance = i + 1;
                break;
            }
        }
        if advance == 0 {
            return Err(CodecError::InvalidInput);
        }
    }
    if advance > 0 {
        input.skip(advance)?;
        return Ok(value);
    }

    // Peeking unsupported: one byte at a time.
    let mut byte = [0u8; 1];
    for i in 0..10 {
        input.read(&mut byte)?;
        value |= u64::from(byte[0] & 0x7f) << (i * 7);
        if byte[0] < 0x80 {
            return Ok(value);
        }
    }
    Err(CodecError::InvalidInput)
}

/// Decodes a varint and undoes the zig-zag mapping.
#[inline]
pub fn decode_signed_varint<S>(input: &mut S) -> Result<i64>
where
    S: InputStream + ?Sized,
{
    decode_varint(input).map(zigzag_decode)
}

/// Writes a field key: the varint `(id << 3) | wire_type`.
#[inline]
pub fn encode_key<S>(tag: u32, wire_type: WireType, out: &mut S) -> Result<()>
where
    S: OutputStream,
{
    debug_assert!(tag >= MIN_TAG);
    encode_varint((u64::from(tag) << 3) | wire_type as u64, out)
}

/// Reads a field key, splitting it into the field id and wire type.
#[inline]
pub fn decode_key<S>(input: &mut S) -> Result<(u32, WireType)>
where
    S: InputStream + ?Sized,
{
    let key = decode_varint(input)?;
    let tag = key >> 3;
    if tag == 0 || tag > u64::from(u32::MAX) {
        return Err(CodecError::InvalidInput);
    }
    let wire_type = WireType::try_from((key & 0x07) as u8)?;
    Ok((tag as u32, wire_type))
}

/// The encoded width of a field key with the given id, 1 to 5 bytes.
#[inline]
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag) << 3)
}

/// Writes 4 little-endian bytes.
#[inline]
pub fn encode_fixed32<S>(value: u32, out: &mut S) -> Result<()>
where
    S: OutputStream,
{
    let mut scratch = [0u8; 4];
    LittleEndian::write_u32(&mut scratch, value);
    out.write(&scratch)
}

/// Writes 8 little-endian bytes.
#[inline]
pub fn encode_fixed64<S>(value: u64, out: &mut S) -> Result<()>
where
    S: OutputStream,
{
    let mut scratch = [0u8; 8];
    LittleEndian::write_u64(&mut scratch, value);
    out.write(&scratch)
}

#[inline]
pub fn decode_fixed32<S>(input: &mut S) -> Result<u32>
where
    S: InputStream + ?Sized,
{
    let mut scratch = [0u8; 4];
    input.read(&mut scratch)?;
    Ok(LittleEndian::read_u32(&scratch))
}

#[inline]
pub fn decode_fixed64<S>(input: &mut S) -> Result<u64>
where
    S: InputStream + ?Sized,
{
    let mut scratch = [0u8; 8];
    input.read(&mut scratch)?;
    Ok(LittleEndian::read_u64(&scratch))
}

/// Consumes a field payload of the given wire type without interpreting it.
///
/// A length delimiter that reaches past the remaining input is
/// `InvalidInput`, as are the deprecated group markers.
pub fn skip_field<S>(wire_type: WireType, input: &mut S) -> Result<()>
where
    S: InputStream + ?Sized,
{
    match wire_type {
        WireType::Varint => {
            decode_varint(input)?;
        }
        WireType::Fixed64 => input.skip(8)?,
        WireType::Fixed32 => input.skip(4)?,
        WireType::LengthDelimited => {
            let len = decode_varint(input)?;
            if len > input.bytes_available() as u64 {
                return Err(CodecError::InvalidInput);
            }
            input.skip(len as usize)?;
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(CodecError::InvalidInput);
        }
    }
    Ok(())
}
