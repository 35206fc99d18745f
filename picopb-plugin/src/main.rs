//! `protoc` plug-in emitting picopb serialization code.
//!
//! `protoc` hands the plug-in a `CodeGeneratorRequest` on standard input
//! and expects a `CodeGeneratorResponse` on standard output; both travel as
//! protobuf messages, which this binary decodes and encodes with the codec
//! it generates code for. Every requested `foo/bar.proto` yields one
//! synthesized `foo/bar.proto.rs`. Generation failures are reported through
//! the response's error field so `protoc` can relay them.

use std::io::{self, Read, Write};

use log::{debug, trace};

use picopb::Message;

mod descriptor;
mod generator;

use crate::descriptor::compiler::{
    code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse,
};

fn main() -> io::Result<()> {
    env_logger::init();

    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes)?;

    let mut request = CodeGeneratorRequest::default();
    request.decode_from_slice(&bytes).map_err(io::Error::from)?;
    trace!("{:#?}", request);

    let mut response = CodeGeneratorResponse::default();
    for file in &request.proto_file {
        // The request also carries transitive imports; only the files named
        // on the command line are generated.
        if !request.file_to_generate.contains(&file.name) {
            continue;
        }
        debug!("file: {:?}, package: {:?}", file.name, file.package);

        match generator::generate_file(file) {
            Ok(content) => response.file.push(code_generator_response::File {
                name: format!("{}.rs", file.name),
                content,
            }),
            Err(error) => {
                response.file.clear();
                response.error = error.to_string();
                break;
            }
        }
    }

    let out = response.encode_to_vec().map_err(io::Error::from)?;
    io::stdout().write_all(&out)?;
    Ok(())
}
