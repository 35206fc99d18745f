#![doc(html_root_url = "https://docs.rs/picopb/0.1.0")]

//! A compact Protocol Buffers (proto3) wire codec.
//!
//! `picopb` encodes and decodes the proto3 wire format through a small set of
//! byte streams, a [`MessageBuilder`] that writes typed fields, and a
//! [`MessageParser`] that reads them back. Message types implement
//! [`Message`]; the implementations are normally emitted ahead of time by
//! `protoc-gen-picopb` from `.proto` descriptors.
//!
//! Length-delimited framing is single-pass: the builder reserves a length
//! varint sized from the message's [`Message::estimate_size`] upper bound,
//! encodes the payload, then back-patches the true length into the reserved
//! bytes. This trades one estimate call for zero payload buffering and is
//! the reason output streams expose `write_at`.

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

mod builder;
mod error;
mod message;
mod parser;

pub mod encoding;
pub mod stream;

pub use crate::builder::MessageBuilder;
pub use crate::error::{CodecError, Result};
pub use crate::message::Message;
pub use crate::parser::MessageParser;
