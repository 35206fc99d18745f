//! Round-trip and wire-byte tests over hand-expanded message types written
//! in the exact shape `protoc-gen-picopb` emits.

use std::fmt::Debug;

use log::info;

use picopb::stream::{InputStream, OutputStream};
use picopb::{Message, MessageBuilder, MessageParser, Result};

// Encodes the message, checks the estimate upper bound, and decodes the
// bytes back into an equal value.
fn check_message<M>(msg: &M) -> Vec<u8>
where
    M: Message + PartialEq + Debug,
{
    let _ = env_logger::try_init();

    let buf = msg.encode_to_vec().unwrap();
    info!("encoded message: {:?}", buf);

    let estimate = msg.estimate_size();
    if estimate > 0 {
        assert!(
            buf.len() <= estimate,
            "encoded {} bytes but estimated {}",
            buf.len(),
            estimate
        );
    }

    let mut roundtrip = M::default();
    roundtrip.decode_from_slice(&buf).unwrap();
    assert_eq!(*msg, roundtrip);
    buf
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inner {
    pub sizes: Vec<i32>,
    pub count: i32,
}

impl Message for Inner {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += (picopb::encoding::key_len(1) + 10) * self.sizes.len();
        size += picopb::encoding::key_len(2) + 10;
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        for value in &self.sizes {
            builder.int32_field(1, *value)?;
        }
        builder.int32_field(2, self.count)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.repeated_int32_field(&mut self.sizes)?,
                2 => self.count = parser.int32_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Greeting {
    pub text: String,
    pub inner: Option<Box<Inner>>,
    pub ratio: f32,
}

impl Message for Greeting {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.text.len();
        if let Some(value) = &self.inner {
            size += picopb::encoding::key_len(2) + 10 + value.estimate_size();
        }
        size += picopb::encoding::key_len(3) + 4;
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.text)?;
        if let Some(value) = &self.inner {
            builder.message_field(2, value.as_ref())?;
        }
        builder.float_field(3, self.ratio)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.text)?,
                2 => {
                    let value = self.inner.get_or_insert_with(Default::default);
                    parser.message_field(value.as_mut())?;
                }
                3 => self.ratio = parser.float_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn nested_message_wire_bytes() {
    let msg = Greeting {
        text: "Hello world".to_string(),
        inner: Some(Box::new(Inner {
            sizes: vec![12345],
            count: 6789,
        })),
        ratio: 1.0,
    };

    let buf = check_message(&msg);
    assert_eq!(
        buf,
        vec![
            0x0a, 0x0b, 0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x20, 0x77, 0x6f, 0x72, 0x6c, 0x64, 0x12,
            0x06, 0x08, 0xb9, 0x60, 0x10, 0x85, 0x35, 0x1d, 0x00, 0x00, 0x80, 0x3f,
        ]
    );
}

#[test]
fn absent_submessage_is_omitted() {
    let msg = Greeting {
        text: String::new(),
        inner: None,
        ratio: 0.0,
    };
    let buf = check_message(&msg);
    // Empty string and zero float are still emitted; the message field is not.
    assert_eq!(buf, vec![0x0a, 0x00, 0x1d, 0x00, 0x00, 0x00, 0x00]);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scalars {
    pub v_int32: i32,
    pub v_int64: i64,
    pub v_uint32: u32,
    pub v_uint64: u64,
    pub v_sint32: i32,
    pub v_sint64: i64,
    pub v_bool: bool,
    pub v_fixed32: u32,
    pub v_sfixed32: i32,
    pub v_float: f32,
    pub v_fixed64: u64,
    pub v_sfixed64: i64,
    pub v_double: f64,
    pub v_string: String,
    pub v_bytes: Vec<u8>,
}

impl Message for Scalars {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10;
        size += picopb::encoding::key_len(2) + 10;
        size += picopb::encoding::key_len(3) + 10;
        size += picopb::encoding::key_len(4) + 10;
        size += picopb::encoding::key_len(5) + 10;
        size += picopb::encoding::key_len(6) + 10;
        size += picopb::encoding::key_len(7) + 10;
        size += picopb::encoding::key_len(8) + 4;
        size += picopb::encoding::key_len(9) + 4;
        size += picopb::encoding::key_len(10) + 4;
        size += picopb::encoding::key_len(11) + 8;
        size += picopb::encoding::key_len(12) + 8;
        size += picopb::encoding::key_len(13) + 8;
        size += picopb::encoding::key_len(14) + 10 + self.v_string.len();
        size += picopb::encoding::key_len(15) + 10 + self.v_bytes.len();
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.int32_field(1, self.v_int32)?;
        builder.int64_field(2, self.v_int64)?;
        builder.uint32_field(3, self.v_uint32)?;
        builder.uint64_field(4, self.v_uint64)?;
        builder.sint32_field(5, self.v_sint32)?;
        builder.sint64_field(6, self.v_sint64)?;
        builder.bool_field(7, self.v_bool)?;
        builder.fixed32_field(8, self.v_fixed32)?;
        builder.sfixed32_field(9, self.v_sfixed32)?;
        builder.float_field(10, self.v_float)?;
        builder.fixed64_field(11, self.v_fixed64)?;
        builder.sfixed64_field(12, self.v_sfixed64)?;
        builder.double_field(13, self.v_double)?;
        builder.string_field(14, &self.v_string)?;
        builder.bytes_field(15, &self.v_bytes)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => self.v_int32 = parser.int32_field()?,
                2 => self.v_int64 = parser.int64_field()?,
                3 => self.v_uint32 = parser.uint32_field()?,
                4 => self.v_uint64 = parser.uint64_field()?,
                5 => self.v_sint32 = parser.sint32_field()?,
                6 => self.v_sint64 = parser.sint64_field()?,
                7 => self.v_bool = parser.bool_field()?,
                8 => self.v_fixed32 = parser.fixed32_field()?,
                9 => self.v_sfixed32 = parser.sfixed32_field()?,
                10 => self.v_float = parser.float_field()?,
                11 => self.v_fixed64 = parser.fixed64_field()?,
                12 => self.v_sfixed64 = parser.sfixed64_field()?,
                13 => self.v_double = parser.double_field()?,
                14 => parser.string_field(&mut self.v_string)?,
                15 => parser.bytes_field(&mut self.v_bytes)?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn scalar_roundtrip() {
    check_message(&Scalars::default());
    check_message(&Scalars {
        v_int32: -42,
        v_int64: i64::min_value(),
        v_uint32: u32::max_value(),
        v_uint64: u64::max_value(),
        v_sint32: -1,
        v_sint64: i64::min_value(),
        v_bool: true,
        v_fixed32: 0xdead_beef,
        v_sfixed32: -7,
        v_float: 3.5,
        v_fixed64: 0xdead_beef_dead_beef,
        v_sfixed64: -9,
        v_double: -2.25,
        v_string: "snazzy new codec".to_string(),
        v_bytes: vec![0x00, 0xff, 0x7f],
    });
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedNumbers {
    pub values: Vec<i32>,
    pub samples: Vec<f32>,
    pub deltas: Vec<i64>,
}

impl Message for PackedNumbers {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        if !self.values.is_empty() {
            size += picopb::encoding::key_len(1) + 10 + 10 * self.values.len();
        }
        if !self.samples.is_empty() {
            size += picopb::encoding::key_len(2) + 10 + 4 * self.samples.len();
        }
        if !self.deltas.is_empty() {
            size += picopb::encoding::key_len(3) + 10 + 10 * self.deltas.len();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.packed_int32_field(1, &self.values)?;
        builder.packed_float_field(2, &self.samples)?;
        builder.packed_sint64_field(3, &self.deltas)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.repeated_int32_field(&mut self.values)?,
                2 => parser.repeated_float_field(&mut self.samples)?,
                3 => parser.repeated_sint64_field(&mut self.deltas)?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn packed_roundtrip() {
    check_message(&PackedNumbers::default());
    check_message(&PackedNumbers {
        values: vec![0, 1, -1, 300, i32::min_value(), i32::max_value()],
        samples: vec![0.0, -1.5, 3.25],
        deltas: vec![-1, 1, i64::min_value(), i64::max_value()],
    });
}

#[test]
fn unpacked_input_reads_into_packed_field() {
    // Two unpacked varint occurrences of field 1 decode identically to the
    // packed block the encoder would produce.
    let unpacked = [0x08, 0x01, 0x08, 0x02];
    let mut msg = PackedNumbers::default();
    msg.decode_from_slice(&unpacked).unwrap();
    assert_eq!(msg.values, vec![1, 2]);

    let packed = [0x0a, 0x02, 0x01, 0x02];
    let mut msg = PackedNumbers::default();
    msg.decode_from_slice(&packed).unwrap();
    assert_eq!(msg.values, vec![1, 2]);
}

#[test]
fn unknown_fields_are_skipped() {
    // Unknown ids over every live wire type, then known field 2 (count).
    let bytes = [
        0x48, 0x05, // id 9, varint
        0x55, 0x01, 0x02, 0x03, 0x04, // id 10, fixed32
        0x59, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // id 11, fixed64
        0x62, 0x03, 0xaa, 0xbb, 0xcc, // id 12, length-delimited
        0x10, 0x2a, // id 2, varint 42
    ];
    let mut msg = Inner::default();
    msg.decode_from_slice(&bytes).unwrap();
    assert_eq!(msg.count, 42);
    assert!(msg.sizes.is_empty());
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Message for Point {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10;
        size += picopb::encoding::key_len(2) + 10;
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.int32_field(1, self.x)?;
        builder.int32_field(2, self.y)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => self.x = parser.int32_field()?,
                2 => self.y = parser.int32_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub labels: Vec<String>,
}

impl Message for Polyline {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        for value in &self.points {
            size += picopb::encoding::key_len(1) + 10 + value.estimate_size();
        }
        for value in &self.labels {
            size += picopb::encoding::key_len(2) + 10 + value.len();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        for value in &self.points {
            builder.message_field(1, value)?;
        }
        for value in &self.labels {
            builder.string_field(2, value)?;
        }
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => {
                    let mut value = Point::default();
                    parser.message_field(&mut value)?;
                    self.points.push(value);
                }
                2 => {
                    let mut value = String::new();
                    parser.string_field(&mut value)?;
                    self.labels.push(value);
                }
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn repeated_messages_preserve_order() {
    check_message(&Polyline {
        points: vec![
            Point { x: 1, y: 2 },
            Point { x: -3, y: 4 },
            Point { x: 0, y: 0 },
        ],
        labels: vec!["start".to_string(), String::new(), "end".to_string()],
    });
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub child: Option<Box<TreeNode>>,
}

impl Message for TreeNode {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.label.len();
        if let Some(value) = &self.child {
            size += picopb::encoding::key_len(2) + 10 + value.estimate_size();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.label)?;
        if let Some(value) = &self.child {
            builder.message_field(2, value.as_ref())?;
        }
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.label)?,
                2 => {
                    let value = self.child.get_or_insert_with(Default::default);
                    parser.message_field(value.as_mut())?;
                }
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn recursive_message_roundtrip() {
    check_message(&TreeNode {
        label: "root".to_string(),
        child: Some(Box::new(TreeNode {
            label: "middle".to_string(),
            child: Some(Box::new(TreeNode {
                label: "leaf".to_string(),
                child: None,
            })),
        })),
    });
}

// A message that deliberately over-estimates so the enclosing length
// delimiter is wider than the payload needs.
#[derive(Clone, Debug, Default, PartialEq)]
struct Wide {
    flag: bool,
}

impl Message for Wide {
    fn estimate_size(&self) -> usize {
        300
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.bool_field(1, self.flag)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => self.flag = parser.bool_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct WideHolder {
    wide: Option<Box<Wide>>,
}

impl Message for WideHolder {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        if let Some(value) = &self.wide {
            size += picopb::encoding::key_len(1) + 10 + value.estimate_size();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        if let Some(value) = &self.wide {
            builder.message_field(1, value.as_ref())?;
        }
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => {
                    let value = self.wide.get_or_insert_with(Default::default);
                    parser.message_field(value.as_mut())?;
                }
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[test]
fn over_estimated_length_is_padded_and_decodes() {
    let msg = WideHolder {
        wide: Some(Box::new(Wide { flag: true })),
    };
    let buf = check_message(&msg);
    // A 300-byte bound reserves two length bytes; the true two-byte payload
    // patches back as 0x82 0x00.
    assert_eq!(buf, vec![0x0a, 0x82, 0x00, 0x08, 0x01]);
}

#[test]
fn truncated_submessage_is_invalid() {
    // Field 1 sub-message declaring 9 bytes, input ends early.
    let bytes = [0x0a, 0x09, 0x08, 0x01];
    let mut msg = WideHolder::default();
    assert!(msg.decode_from_slice(&bytes).is_err());
}
