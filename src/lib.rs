//! h2-frame-parser: an incremental, sans-I/O HTTP/2 frame parser
//!
//! Turns an arbitrarily chunked HTTP/2 byte stream into validated protocol
//! events. The parser owns no socket and spawns nothing: you push bytes in,
//! it calls back into your [`FrameHandler`].
//!
//! # Features
//!
//! - **Incremental**: accepts chunks of any size, down to one byte at a time
//! - **Header block reassembly**: HEADERS / PUSH_PROMISE + CONTINUATION,
//!   decoded through HPACK (via fluke-hpack) into pseudo and regular headers
//! - **Error classification**: stream errors are reported and parsing
//!   continues; connection errors are reported and returned from `push`
//! - **Resource bounds**: frame size, header block size and SETTINGS size
//!   limits against hostile peers
//!
//! # Quick Start
//!
//! ```rust
//! use h2_frame_parser::{compile_frame, flags, frame_type, H2Event, Http2Parser, ParserConfig};
//!
//! let mut parser = Http2Parser::new(Vec::<H2Event>::new(), ParserConfig::default());
//!
//! let frame = compile_frame(b"hello", frame_type::DATA, flags::END_STREAM, 1);
//! parser.push(&frame).unwrap();
//!
//! for event in parser.handler() {
//!     match event {
//!         H2Event::Data { stream_id, data } => {
//!             println!("Data on stream {}: {} bytes", stream_id, data.len());
//!         }
//!         H2Event::StreamEnd { stream_id } => println!("Stream {} ended", stream_id),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`h2_codec`]: frame header codec, wire constants, frame builders
//! - [`parser`]: byte consumer and per-frame decoders
//! - [`header_block`]: CONTINUATION reassembly and header validation
//! - [`hpack`]: HPACK wrapper
//! - [`handler`]: the event sink trait
//! - [`error`]: error codes and stream/connection classification
//!
//! It does NOT provide flow-control accounting, stream scheduling, TLS or
//! transport. The connection preface is left to the transport
//! (see [`is_h2c_preface`]).

pub mod config;
pub mod error;
pub mod h2_codec;
pub mod handler;
pub mod header_block;
pub mod hpack;
pub mod parser;

pub use config::{ParserConfig, MAX_HEADER_BLOCK_SIZE};
pub use error::{ConnectionError, ErrorCode, ErrorKind, FrameError, ParseError, Scope, StreamError};
pub use h2_codec::{
    compile_frame, continuation_frame, flags, frame_name, frame_type, goaway_frame,
    is_h2c_preface, ping_frame, rst_stream_frame, settings_ack_frame, settings_frame,
    settings_id, settings_payload, window_update_frame, H2FrameHeader, Priority,
    CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN,
};
pub use handler::{FrameHandler, H2Event, Settings};
pub use header_block::{HeaderBlock, HeaderFrameKind, HeaderSet};
pub use hpack::{H2Header, HpackDecoder, HpackEncoder, HpackError};
pub use parser::{Http2Parser, MAX_SETTINGS_PAYLOAD};
