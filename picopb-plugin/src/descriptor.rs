//! The subset of `google/protobuf/descriptor.proto` and
//! `google/protobuf/compiler/plugin.proto` the plug-in needs, hand-expanded
//! in exactly the shape the generator emits. Fields the plug-in never reads
//! (source code info, file options, reserved ranges, ...) are omitted and
//! fall to the codec's unknown-field skipping.

use picopb::stream::{InputStream, OutputStream};
use picopb::{Message, MessageBuilder, MessageParser, Result};

/// Describes a complete `.proto` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileDescriptorProto {
    /// File name, relative to the root of the source tree.
    pub name: String,
    /// Dotted package, e.g. `foo.bar`.
    pub package: String,
    pub message_type: Vec<DescriptorProto>,
    /// `"proto2"` (or empty) or `"proto3"`.
    pub syntax: String,
}

impl Message for FileDescriptorProto {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.name.len();
        size += picopb::encoding::key_len(2) + 10 + self.package.len();
        for value in &self.message_type {
            size += picopb::encoding::key_len(4) + 10 + value.estimate_size();
        }
        size += picopb::encoding::key_len(12) + 10 + self.syntax.len();
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.name)?;
        builder.string_field(2, &self.package)?;
        for value in &self.message_type {
            builder.message_field(4, value)?;
        }
        builder.string_field(12, &self.syntax)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.name)?,
                2 => parser.string_field(&mut self.package)?,
                4 => {
                    let mut value = DescriptorProto::default();
                    parser.message_field(&mut value)?;
                    self.message_type.push(value);
                }
                12 => parser.string_field(&mut self.syntax)?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

/// Describes a message type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DescriptorProto {
    pub name: String,
    pub field: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub options: Option<Box<MessageOptions>>,
    pub oneof_decl: Vec<OneofDescriptorProto>,
}

impl Message for DescriptorProto {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.name.len();
        for value in &self.field {
            size += picopb::encoding::key_len(2) + 10 + value.estimate_size();
        }
        for value in &self.nested_type {
            size += picopb::encoding::key_len(3) + 10 + value.estimate_size();
        }
        for value in &self.extension {
            size += picopb::encoding::key_len(6) + 10 + value.estimate_size();
        }
        if let Some(value) = &self.options {
            size += picopb::encoding::key_len(7) + 10 + value.estimate_size();
        }
        for value in &self.oneof_decl {
            size += picopb::encoding::key_len(8) + 10 + value.estimate_size();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.name)?;
        for value in &self.field {
            builder.message_field(2, value)?;
        }
        for value in &self.nested_type {
            builder.message_field(3, value)?;
        }
        for value in &self.extension {
            builder.message_field(6, value)?;
        }
        if let Some(value) = &self.options {
            builder.message_field(7, value.as_ref())?;
        }
        for value in &self.oneof_decl {
            builder.message_field(8, value)?;
        }
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.name)?,
                2 => {
                    let mut value = FieldDescriptorProto::default();
                    parser.message_field(&mut value)?;
                    self.field.push(value);
                }
                3 => {
                    let mut value = DescriptorProto::default();
                    parser.message_field(&mut value)?;
                    self.nested_type.push(value);
                }
                6 => {
                    let mut value = FieldDescriptorProto::default();
                    parser.message_field(&mut value)?;
                    self.extension.push(value);
                }
                7 => {
                    let value = self.options.get_or_insert_with(Default::default);
                    parser.message_field(value.as_mut())?;
                }
                8 => {
                    let mut value = OneofDescriptorProto::default();
                    parser.message_field(&mut value)?;
                    self.oneof_decl.push(value);
                }
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

/// Describes a single field of a message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDescriptorProto {
    pub name: String,
    pub number: i32,
    /// A `field_descriptor_proto::Label` value.
    pub label: i32,
    /// A `field_descriptor_proto::Type` value. Named `type` in the
    /// descriptor schema.
    pub field_type: i32,
    /// Fully-qualified type name (with a leading dot) for message and enum
    /// typed fields.
    pub type_name: String,
    pub options: Option<Box<FieldOptions>>,
}

impl Message for FieldDescriptorProto {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.name.len();
        size += picopb::encoding::key_len(3) + 10;
        size += picopb::encoding::key_len(4) + 10;
        size += picopb::encoding::key_len(5) + 10;
        size += picopb::encoding::key_len(6) + 10 + self.type_name.len();
        if let Some(value) = &self.options {
            size += picopb::encoding::key_len(8) + 10 + value.estimate_size();
        }
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.name)?;
        builder.int32_field(3, self.number)?;
        builder.int32_field(4, self.label)?;
        builder.int32_field(5, self.field_type)?;
        builder.string_field(6, &self.type_name)?;
        if let Some(value) = &self.options {
            builder.message_field(8, value.as_ref())?;
        }
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.name)?,
                3 => self.number = parser.int32_field()?,
                4 => self.label = parser.int32_field()?,
                5 => self.field_type = parser.int32_field()?,
                6 => parser.string_field(&mut self.type_name)?,
                8 => {
                    let value = self.options.get_or_insert_with(Default::default);
                    parser.message_field(value.as_mut())?;
                }
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

pub mod field_descriptor_proto {
    /// Declared field types. 0 is reserved for errors.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Type {
        Double = 1,
        Float = 2,
        Int64 = 3,
        Uint64 = 4,
        Int32 = 5,
        Fixed64 = 6,
        Fixed32 = 7,
        Bool = 8,
        String = 9,
        Group = 10,
        Message = 11,
        Bytes = 12,
        Uint32 = 13,
        Enum = 14,
        Sfixed32 = 15,
        Sfixed64 = 16,
        Sint32 = 17,
        Sint64 = 18,
    }

    impl Type {
        pub fn from_i32(value: i32) -> Option<Type> {
            match value {
                1 => Some(Type::Double),
                2 => Some(Type::Float),
                3 => Some(Type::Int64),
                4 => Some(Type::Uint64),
                5 => Some(Type::Int32),
                6 => Some(Type::Fixed64),
                7 => Some(Type::Fixed32),
                8 => Some(Type::Bool),
                9 => Some(Type::String),
                10 => Some(Type::Group),
                11 => Some(Type::Message),
                12 => Some(Type::Bytes),
                13 => Some(Type::Uint32),
                14 => Some(Type::Enum),
                15 => Some(Type::Sfixed32),
                16 => Some(Type::Sfixed64),
                17 => Some(Type::Sint32),
                18 => Some(Type::Sint64),
                _ => None,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Label {
        Optional = 1,
        Required = 2,
        Repeated = 3,
    }

    impl Label {
        pub fn from_i32(value: i32) -> Option<Label> {
            match value {
                1 => Some(Label::Optional),
                2 => Some(Label::Required),
                3 => Some(Label::Repeated),
                _ => None,
            }
        }
    }
}

/// Describes a oneof. The plug-in only needs its presence to reject it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OneofDescriptorProto {
    pub name: String,
}

impl Message for OneofDescriptorProto {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(1) + 10 + self.name.len();
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.string_field(1, &self.name)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                1 => parser.string_field(&mut self.name)?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageOptions {
    /// Set on the synthetic entry types backing map fields.
    pub map_entry: bool,
}

impl Message for MessageOptions {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(7) + 10;
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.bool_field(7, self.map_entry)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                7 => self.map_entry = parser.bool_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldOptions {
    pub packed: bool,
}

impl Message for FieldOptions {
    fn estimate_size(&self) -> usize {
        let mut size = 0;
        size += picopb::encoding::key_len(2) + 10;
        size
    }

    fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
        builder.bool_field(2, self.packed)?;
        builder.last_error()
    }

    fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
        while parser.next_field()? {
            match parser.field_id() {
                2 => self.packed = parser.bool_field()?,
                _ => parser.skip_field()?,
            }
        }
        Ok(())
    }
}

/// The `protoc` plug-in handshake types.
pub mod compiler {
    use super::FileDescriptorProto;
    use picopb::stream::{InputStream, OutputStream};
    use picopb::{Message, MessageBuilder, MessageParser, Result};

    /// Everything `protoc` hands a plug-in on standard input.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct CodeGeneratorRequest {
        /// The files named on the command line; `proto_file` also carries
        /// their imports, which are not to be generated.
        pub file_to_generate: Vec<String>,
        pub parameter: String,
        pub proto_file: Vec<FileDescriptorProto>,
    }

    impl Message for CodeGeneratorRequest {
        fn estimate_size(&self) -> usize {
            let mut size = 0;
            for value in &self.file_to_generate {
                size += picopb::encoding::key_len(1) + 10 + value.len();
            }
            size += picopb::encoding::key_len(2) + 10 + self.parameter.len();
            for value in &self.proto_file {
                size += picopb::encoding::key_len(15) + 10 + value.estimate_size();
            }
            size
        }

        fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
            for value in &self.file_to_generate {
                builder.string_field(1, value)?;
            }
            builder.string_field(2, &self.parameter)?;
            for value in &self.proto_file {
                builder.message_field(15, value)?;
            }
            builder.last_error()
        }

        fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
            while parser.next_field()? {
                match parser.field_id() {
                    1 => {
                        let mut value = String::new();
                        parser.string_field(&mut value)?;
                        self.file_to_generate.push(value);
                    }
                    2 => parser.string_field(&mut self.parameter)?,
                    15 => {
                        let mut value = FileDescriptorProto::default();
                        parser.message_field(&mut value)?;
                        self.proto_file.push(value);
                    }
                    _ => parser.skip_field()?,
                }
            }
            Ok(())
        }
    }

    /// The plug-in's answer on standard output.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct CodeGeneratorResponse {
        /// A non-empty error aborts generation; `protoc` relays it to the
        /// user and ignores `file`.
        pub error: String,
        pub file: Vec<code_generator_response::File>,
    }

    impl Message for CodeGeneratorResponse {
        fn estimate_size(&self) -> usize {
            let mut size = 0;
            size += picopb::encoding::key_len(1) + 10 + self.error.len();
            for value in &self.file {
                size += picopb::encoding::key_len(15) + 10 + value.estimate_size();
            }
            size
        }

        fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
            builder.string_field(1, &self.error)?;
            for value in &self.file {
                builder.message_field(15, value)?;
            }
            builder.last_error()
        }

        fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
            while parser.next_field()? {
                match parser.field_id() {
                    1 => parser.string_field(&mut self.error)?,
                    15 => {
                        let mut value = code_generator_response::File::default();
                        parser.message_field(&mut value)?;
                        self.file.push(value);
                    }
                    _ => parser.skip_field()?,
                }
            }
            Ok(())
        }
    }

    pub mod code_generator_response {
        use picopb::stream::{InputStream, OutputStream};
        use picopb::{Message, MessageBuilder, MessageParser, Result};

        /// One synthesized output file.
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct File {
            pub name: String,
            pub content: String,
        }

        impl Message for File {
            fn estimate_size(&self) -> usize {
                let mut size = 0;
                size += picopb::encoding::key_len(1) + 10 + self.name.len();
                size += picopb::encoding::key_len(15) + 10 + self.content.len();
                size
            }

            fn encode<S: OutputStream>(&self, builder: &mut MessageBuilder<'_, S>) -> Result<()> {
                builder.string_field(1, &self.name)?;
                builder.string_field(15, &self.content)?;
                builder.last_error()
            }

            fn decode<S: InputStream>(&mut self, parser: &mut MessageParser<'_, S>) -> Result<()> {
                while parser.next_field()? {
                    match parser.field_id() {
                        1 => parser.string_field(&mut self.name)?,
                        15 => parser.string_field(&mut self.content)?,
                        _ => parser.skip_field()?,
                    }
                }
                Ok(())
            }
        }
    }
}
