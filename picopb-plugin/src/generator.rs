//! Walks a descriptor tree and emits Rust message types together with
//! their `estimate_size`/`encode`/`decode` implementations.

use std::error;
use std::fmt;

use heck::ToSnakeCase;
use itertools::Itertools;
use log::debug;

use crate::descriptor::field_descriptor_proto::{Label, Type};
use crate::descriptor::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

/// A construct the generator cannot express. Reported through the
/// response's error field rather than a panic.
#[derive(Debug)]
pub struct CodeGenError(String);

impl CodeGenError {
    fn new(message: String) -> CodeGenError {
        CodeGenError(message)
    }
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl error::Error for CodeGenError {}

/// Generates the Rust source for one `.proto` file.
pub fn generate_file(file: &FileDescriptorProto) -> Result<String, CodeGenError> {
    let mut content = String::new();
    content.push_str("// Generated by protoc-gen-picopb. Do not edit.\n");

    let mut generator = CodeGenerator {
        package: file.package.clone(),
        proto3: file.syntax == "proto3",
        depth: 0,
        buf: &mut content,
    };
    for message in &file.message_type {
        generator.append_message(message)?;
    }
    Ok(content)
}

// How a field's payload travels on the wire, with the names generated code
// uses for it.
enum FieldClass {
    Varint { stem: &'static str, ty: &'static str },
    Fixed { stem: &'static str, ty: &'static str, width: usize },
    Str,
    Bytes,
    Message { ty: String },
}

struct FieldGen {
    member: String,
    tag: u32,
    repeated: bool,
    packed: bool,
    class: FieldClass,
}

struct CodeGenerator<'a> {
    // The dotted proto scope: the file package plus the names of enclosing
    // messages while nested types are generated.
    package: String,
    proto3: bool,
    depth: u8,
    buf: &'a mut String,
}

impl<'a> CodeGenerator<'a> {
    fn append_message(&mut self, message: &DescriptorProto) -> Result<(), CodeGenError> {
        debug!("message: {:?}.{:?}", self.package, message.name);

        let map_entry = message
            .options
            .as_ref()
            .map(|options| options.map_entry)
            .unwrap_or(false);
        if map_entry {
            return Err(CodeGenError::new(format!(
                "map fields are not supported ({}.{})",
                self.package, message.name
            )));
        }
        if !message.oneof_decl.is_empty() {
            return Err(CodeGenError::new(format!(
                "oneof (including proto3 optional) is not supported ({}.{})",
                self.package, message.name
            )));
        }
        if !message.extension.is_empty() {
            return Err(CodeGenError::new(format!(
                "extensions are not supported ({}.{})",
                self.package, message.name
            )));
        }

        let fields = message
            .field
            .iter()
            .map(|field| self.field_gen(field, &message.name))
            .collect::<Result<Vec<FieldGen>, CodeGenError>>()?;

        self.append_struct(&message.name, &fields);
        self.append_impl(&message.name, &fields);

        if !message.nested_type.is_empty() {
            self.push_mod(&message.name);
            for nested in &message.nested_type {
                self.append_message(nested)?;
            }
            self.pop_mod();
        }
        Ok(())
    }

    fn field_gen(
        &self,
        field: &FieldDescriptorProto,
        message_name: &str,
    ) -> Result<FieldGen, CodeGenError> {
        let unsupported = |what: &str| {
            CodeGenError::new(format!(
                "{} ({}.{}.{})",
                what, self.package, message_name, field.name
            ))
        };

        let field_type =
            Type::from_i32(field.field_type).ok_or_else(|| unsupported("unknown field type"))?;
        let label =
            Label::from_i32(field.label).ok_or_else(|| unsupported("unknown field label"))?;

        let class = match field_type {
            Type::Int32 => FieldClass::Varint { stem: "int32", ty: "i32" },
            Type::Int64 => FieldClass::Varint { stem: "int64", ty: "i64" },
            Type::Uint32 => FieldClass::Varint { stem: "uint32", ty: "u32" },
            Type::Uint64 => FieldClass::Varint { stem: "uint64", ty: "u64" },
            Type::Sint32 => FieldClass::Varint { stem: "sint32", ty: "i32" },
            Type::Sint64 => FieldClass::Varint { stem: "sint64", ty: "i64" },
            Type::Bool => FieldClass::Varint { stem: "bool", ty: "bool" },
            // Enumerations pass through as their integer wire value.
            Type::Enum => FieldClass::Varint { stem: "int32", ty: "i32" },
            Type::Fixed32 => FieldClass::Fixed { stem: "fixed32", ty: "u32", width: 4 },
            Type::Sfixed32 => FieldClass::Fixed { stem: "sfixed32", ty: "i32", width: 4 },
            Type::Float => FieldClass::Fixed { stem: "float", ty: "f32", width: 4 },
            Type::Fixed64 => FieldClass::Fixed { stem: "fixed64", ty: "u64", width: 8 },
            Type::Sfixed64 => FieldClass::Fixed { stem: "sfixed64", ty: "i64", width: 8 },
            Type::Double => FieldClass::Fixed { stem: "double", ty: "f64", width: 8 },
            Type::String => FieldClass::Str,
            Type::Bytes => FieldClass::Bytes,
            Type::Message => FieldClass::Message {
                ty: self.resolve_ident(&field.type_name),
            },
            Type::Group => return Err(unsupported("group fields are not supported")),
        };

        let repeated = label == Label::Repeated;
        let packable = match &class {
            FieldClass::Varint { .. } | FieldClass::Fixed { .. } => true,
            _ => false,
        };
        let packed = repeated
            && packable
            && match &field.options {
                Some(options) => options.packed,
                None => self.proto3,
            };

        Ok(FieldGen {
            member: rust_field_name(&field.name),
            tag: field.number as u32,
            repeated,
            packed,
            class,
        })
    }

    fn append_struct(&mut self, name: &str, fields: &[FieldGen]) {
        self.line("");
        self.line("#[derive(Clone, Debug, Default, PartialEq)]");
        self.line(&format!("pub struct {} {{", name));
        for field in fields {
            let element = match &field.class {
                FieldClass::Varint { ty, .. } => (*ty).to_string(),
                FieldClass::Fixed { ty, .. } => (*ty).to_string(),
                FieldClass::Str => "String".to_string(),
                FieldClass::Bytes => "Vec<u8>".to_string(),
                FieldClass::Message { ty } => ty.clone(),
            };
            let member_ty = if field.repeated {
                format!("Vec<{}>", element)
            } else if let FieldClass::Message { .. } = field.class {
                format!("Option<Box<{}>>", element)
            } else {
                element
            };
            self.line(&format!("    pub {}: {},", field.member, member_ty));
        }
        self.line("}");
    }

    fn append_impl(&mut self, name: &str, fields: &[FieldGen]) {
        self.line("");
        self.line(&format!("impl ::picopb::Message for {} {{", name));
        self.append_estimate_size(fields);
        self.line("");
        self.append_encode(fields);
        self.line("");
        self.append_decode(fields);
        self.line("}");
    }

    fn append_estimate_size(&mut self, fields: &[FieldGen]) {
        self.line("    fn estimate_size(&self) -> usize {");
        if fields.is_empty() {
            self.line("        0");
        } else {
            self.line("        let mut size = 0;");
            for field in fields {
                for line in estimate_lines(field) {
                    self.line(&format!("        {}", line));
                }
            }
            self.line("        size");
        }
        self.line("    }");
    }

    fn append_encode(&mut self, fields: &[FieldGen]) {
        self.line(
            "    fn encode<S: ::picopb::stream::OutputStream>(\
             &self, builder: &mut ::picopb::MessageBuilder<'_, S>) -> ::picopb::Result<()> {",
        );
        for field in fields {
            for line in encode_lines(field) {
                self.line(&format!("        {}", line));
            }
        }
        self.line("        builder.last_error()");
        self.line("    }");
    }

    fn append_decode(&mut self, fields: &[FieldGen]) {
        self.line(
            "    fn decode<S: ::picopb::stream::InputStream>(\
             &mut self, parser: &mut ::picopb::MessageParser<'_, S>) -> ::picopb::Result<()> {",
        );
        self.line("        while parser.next_field()? {");
        self.line("            match parser.field_id() {");
        for field in fields {
            for line in decode_lines(field) {
                self.line(&format!("                {}", line));
            }
        }
        self.line("                _ => parser.skip_field()?,");
        self.line("            }");
        self.line("        }");
        self.line("        Ok(())");
        self.line("    }");
    }

    fn push_mod(&mut self, message_name: &str) {
        self.line("");
        self.line(&format!("pub mod {} {{", message_name.to_snake_case()));
        self.package.push('.');
        self.package.push_str(message_name);
        self.depth += 1;
    }

    fn pop_mod(&mut self) {
        self.depth -= 1;
        let idx = self.package.rfind('.').unwrap();
        self.package.truncate(idx);
        self.line("}");
    }

    fn line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str("    ");
            }
            self.buf.push_str(line);
        }
        self.buf.push('\n');
    }

    // Turns a fully-qualified proto name into a Rust path relative to the
    // module currently being generated: shared scope is dropped, each
    // remaining local level becomes a `super`, and intervening message
    // scopes become their snake-cased module names.
    fn resolve_ident(&self, pb_ident: &str) -> String {
        let ident = pb_ident.trim_start_matches('.');

        let mut local_path = self
            .package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .peekable();
        let mut ident_path = ident.split('.');
        let ident_type = ident_path.next_back().unwrap_or(ident);
        let mut ident_path = ident_path.filter(|segment| !segment.is_empty()).peekable();

        while local_path.peek().is_some() && local_path.peek() == ident_path.peek() {
            local_path.next();
            ident_path.next();
        }

        local_path
            .map(|_| "super".to_string())
            .chain(ident_path.map(|segment| segment.to_snake_case()))
            .chain(Some(ident_type.to_string()))
            .join("::")
    }
}

fn estimate_lines(field: &FieldGen) -> Vec<String> {
    let key = format!("::picopb::encoding::key_len({})", field.tag);
    let member = &field.member;
    match (&field.class, field.repeated, field.packed) {
        (FieldClass::Varint { .. }, false, _) => vec![format!("size += {} + 10;", key)],
        (FieldClass::Fixed { width, .. }, false, _) => {
            vec![format!("size += {} + {};", key, width)]
        }
        (FieldClass::Str, false, _) | (FieldClass::Bytes, false, _) => {
            vec![format!("size += {} + 10 + self.{}.len();", key, member)]
        }
        (FieldClass::Message { .. }, false, _) => vec![
            format!("if let Some(value) = &self.{} {{", member),
            format!("    size += {} + 10 + value.estimate_size();", key),
            "}".to_string(),
        ],
        (FieldClass::Varint { .. }, true, true) => vec![
            format!("if !self.{}.is_empty() {{", member),
            format!("    size += {} + 10 + 10 * self.{}.len();", key, member),
            "}".to_string(),
        ],
        (FieldClass::Varint { .. }, true, false) => {
            vec![format!("size += ({} + 10) * self.{}.len();", key, member)]
        }
        (FieldClass::Fixed { width, .. }, true, true) => vec![
            format!("if !self.{}.is_empty() {{", member),
            format!("    size += {} + 10 + {} * self.{}.len();", key, width, member),
            "}".to_string(),
        ],
        (FieldClass::Fixed { width, .. }, true, false) => {
            vec![format!("size += ({} + {}) * self.{}.len();", key, width, member)]
        }
        (FieldClass::Str, true, _) | (FieldClass::Bytes, true, _) => vec![
            format!("for value in &self.{} {{", member),
            format!("    size += {} + 10 + value.len();", key),
            "}".to_string(),
        ],
        (FieldClass::Message { .. }, true, _) => vec![
            format!("for value in &self.{} {{", member),
            format!("    size += {} + 10 + value.estimate_size();", key),
            "}".to_string(),
        ],
    }
}

fn encode_lines(field: &FieldGen) -> Vec<String> {
    let tag = field.tag;
    let member = &field.member;
    match (&field.class, field.repeated, field.packed) {
        (FieldClass::Varint { stem, .. }, false, _) | (FieldClass::Fixed { stem, .. }, false, _) => {
            vec![format!("builder.{}_field({}, self.{})?;", stem, tag, member)]
        }
        (FieldClass::Str, false, _) => {
            vec![format!("builder.string_field({}, &self.{})?;", tag, member)]
        }
        (FieldClass::Bytes, false, _) => {
            vec![format!("builder.bytes_field({}, &self.{})?;", tag, member)]
        }
        (FieldClass::Message { .. }, false, _) => vec![
            format!("if let Some(value) = &self.{} {{", member),
            format!("    builder.message_field({}, value.as_ref())?;", tag),
            "}".to_string(),
        ],
        (FieldClass::Varint { stem, .. }, true, true)
        | (FieldClass::Fixed { stem, .. }, true, true) => {
            vec![format!("builder.packed_{}_field({}, &self.{})?;", stem, tag, member)]
        }
        (FieldClass::Varint { stem, .. }, true, false)
        | (FieldClass::Fixed { stem, .. }, true, false) => vec![
            format!("for value in &self.{} {{", member),
            format!("    builder.{}_field({}, *value)?;", stem, tag),
            "}".to_string(),
        ],
        (FieldClass::Str, true, _) => vec![
            format!("for value in &self.{} {{", member),
            format!("    builder.string_field({}, value)?;", tag),
            "}".to_string(),
        ],
        (FieldClass::Bytes, true, _) => vec![
            format!("for value in &self.{} {{", member),
            format!("    builder.bytes_field({}, value)?;", tag),
            "}".to_string(),
        ],
        (FieldClass::Message { .. }, true, _) => vec![
            format!("for value in &self.{} {{", member),
            format!("    builder.message_field({}, value)?;", tag),
            "}".to_string(),
        ],
    }
}

fn decode_lines(field: &FieldGen) -> Vec<String> {
    let tag = field.tag;
    let member = &field.member;
    match (&field.class, field.repeated) {
        (FieldClass::Varint { stem, .. }, false) | (FieldClass::Fixed { stem, .. }, false) => {
            vec![format!("{} => self.{} = parser.{}_field()?,", tag, member, stem)]
        }
        (FieldClass::Str, false) => {
            vec![format!("{} => parser.string_field(&mut self.{})?,", tag, member)]
        }
        (FieldClass::Bytes, false) => {
            vec![format!("{} => parser.bytes_field(&mut self.{})?,", tag, member)]
        }
        (FieldClass::Message { .. }, false) => vec![
            format!("{} => {{", tag),
            format!("    let value = self.{}.get_or_insert_with(Default::default);", member),
            "    parser.message_field(value.as_mut())?;".to_string(),
            "}".to_string(),
        ],
        (FieldClass::Varint { stem, .. }, true) | (FieldClass::Fixed { stem, .. }, true) => {
            vec![format!("{} => parser.repeated_{}_field(&mut self.{})?,", tag, stem, member)]
        }
        (FieldClass::Str, true) => vec![
            format!("{} => {{", tag),
            "    let mut value = String::new();".to_string(),
            "    parser.string_field(&mut value)?;".to_string(),
            format!("    self.{}.push(value);", member),
            "}".to_string(),
        ],
        (FieldClass::Bytes, true) => vec![
            format!("{} => {{", tag),
            "    let mut value = Vec::new();".to_string(),
            "    parser.bytes_field(&mut value)?;".to_string(),
            format!("    self.{}.push(value);", member),
            "}".to_string(),
        ],
        (FieldClass::Message { ty }, true) => vec![
            format!("{} => {{", tag),
            format!("    let mut value = {}::default();", ty),
            "    parser.message_field(&mut value)?;".to_string(),
            format!("    self.{}.push(value);", member),
            "}".to_string(),
        ],
    }
}

// Member names follow the proto field name; Rust keywords become raw
// identifiers, and the few that cannot be raw get a trailing underscore.
fn rust_field_name(name: &str) -> String {
    let name = name.to_snake_case();
    match name.as_str() {
        "as" | "async" | "await" | "become" | "box" | "break" | "const" | "continue" | "do"
        | "dyn" | "else" | "enum" | "extern" | "false" | "final" | "fn" | "for" | "if"
        | "impl" | "in" | "let" | "loop" | "macro" | "match" | "mod" | "move" | "mut"
        | "override" | "priv" | "pub" | "ref" | "return" | "static" | "struct" | "trait"
        | "true" | "try" | "type" | "typeof" | "unsafe" | "unsized" | "use" | "virtual"
        | "where" | "while" | "yield" => format!("r#{}", name),
        "self" | "super" | "crate" => format!("{}_", name),
        _ => name,
    }
}
