//! HTTP/2 frame header codec and wire constants.
//!
//! Every frame starts with a fixed 9-byte header:
//! ```text
//! +-----------------------------------------------+
//! |                 Length (24)                    |
//! +---------------+---------------+---------------+
//! |   Type (8)    |   Flags (8)   |
//! +-+-------------+---------------+------...------+
//! |R|                 Stream Identifier (31)       |
//! +-+---------------------------------------------+
//! |                   Frame Payload ...            |
//! +-----------------------------------------------+
//! ```
//!
//! Reference: RFC 9113 Section 4.1

use std::borrow::Cow;

use tracing::trace;

/// HTTP/2 frame types (RFC 9113 Section 6)
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;
}

/// HTTP/2 frame flags
pub mod flags {
    pub const NONE: u8 = 0x0;
    /// SETTINGS and PING
    pub const ACK: u8 = 0x1;
    pub const END_STREAM: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 SETTINGS identifiers (RFC 9113 Section 6.5.2)
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// Frame header size in bytes.
pub const FRAME_HEADER_LEN: usize = 9;

/// Initial SETTINGS_MAX_FRAME_SIZE; also the default frame and header limits.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 14;

/// Largest payload length the 24-bit length field can carry.
pub const MAX_FRAME_LENGTH: usize = (1 << 24) - 1;

/// Mask clearing the reserved high bit of stream identifiers.
pub const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;

/// The HTTP/2 connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Check if data starts with HTTP/2 connection preface (h2c detection)
pub fn is_h2c_preface(data: &[u8]) -> bool {
    data.starts_with(CONNECTION_PREFACE)
}

/// A parsed HTTP/2 frame header (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct H2FrameHeader {
    pub length: u32,    // 24 bits
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32, // 31 bits (high bit reserved)
}

impl H2FrameHeader {
    /// Parse a 9-byte frame header. Returns `None` if fewer than 9 bytes are given.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let bytes: &[u8; FRAME_HEADER_LEN] = data.get(..FRAME_HEADER_LEN)?.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: &[u8; FRAME_HEADER_LEN]) -> Self {
        let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let stream_id = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);

        Self {
            length: word >> 8,
            frame_type: word as u8,
            flags: bytes[4],
            stream_id: stream_id & STREAM_ID_MASK,
        }
    }

    /// Encode into wire layout. The reserved stream bit is always sent as zero.
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let word = (self.length << 8) | self.frame_type as u32;
        let word = word.to_be_bytes();
        let stream = (self.stream_id & STREAM_ID_MASK).to_be_bytes();
        [
            word[0], word[1], word[2], word[3], self.flags, stream[0], stream[1], stream[2],
            stream[3],
        ]
    }

    /// Total frame size including header
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_LEN + self.length as usize
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Check if END_STREAM flag is set
    pub fn is_end_stream(&self) -> bool {
        self.has_flag(flags::END_STREAM)
    }

    /// Check if END_HEADERS flag is set
    pub fn is_end_headers(&self) -> bool {
        self.has_flag(flags::END_HEADERS)
    }

    pub fn is_ack(&self) -> bool {
        self.has_flag(flags::ACK)
    }

    pub fn is_padded(&self) -> bool {
        self.has_flag(flags::PADDED)
    }

    pub fn has_priority(&self) -> bool {
        self.has_flag(flags::PRIORITY)
    }
}

/// Stream dependency carried by PRIORITY frames and prioritized HEADERS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub dependency: u32,
    /// Effective weight, 1..=256 (the wire byte plus one).
    pub weight: u16,
    pub exclusive: bool,
}

impl Priority {
    /// Decode the 5-byte dependency block: E bit + 31-bit parent, then weight.
    pub fn decode(bytes: &[u8; 5]) -> Self {
        let raw = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Self {
            dependency: raw & STREAM_ID_MASK,
            weight: bytes[4] as u16 + 1,
            exclusive: raw & !STREAM_ID_MASK != 0,
        }
    }
}

/// Human-readable frame type name for logs.
pub fn frame_name(frame_type: u8) -> Cow<'static, str> {
    let name = match frame_type {
        frame_type::DATA => "DATA",
        frame_type::HEADERS => "HEADERS",
        frame_type::PRIORITY => "PRIORITY",
        frame_type::RST_STREAM => "RST_STREAM",
        frame_type::SETTINGS => "SETTINGS",
        frame_type::PUSH_PROMISE => "PUSH_PROMISE",
        frame_type::PING => "PING",
        frame_type::GOAWAY => "GOAWAY",
        frame_type::WINDOW_UPDATE => "WINDOW_UPDATE",
        frame_type::CONTINUATION => "CONTINUATION",
        other => return Cow::Owned(format!("{:#04x}", other)),
    };
    Cow::Borrowed(name)
}

/// Serialize one frame: 9-byte header followed by `payload`.
///
/// `payload` must fit the 24-bit length field.
pub fn compile_frame(payload: &[u8], frame_type: u8, flags: u8, stream_id: u32) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_FRAME_LENGTH, "frame payload exceeds 24-bit length");

    trace!(
        frame = %frame_name(frame_type),
        flags = format_args!("{:#04x}", flags),
        stream_id,
        length = payload.len(),
        "send"
    );

    let header = H2FrameHeader {
        length: payload.len() as u32,
        frame_type,
        flags,
        stream_id,
    };
    let mut frame = Vec::with_capacity(header.total_size());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(payload);
    frame
}

/// Create a RST_STREAM frame
pub fn rst_stream_frame(stream_id: u32, error_code: u32) -> Vec<u8> {
    compile_frame(&error_code.to_be_bytes(), frame_type::RST_STREAM, flags::NONE, stream_id)
}

/// Create a GOAWAY frame with optional opaque debug data
pub fn goaway_frame(last_stream_id: u32, error_code: u32, debug_data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8 + debug_data.len());
    payload.extend_from_slice(&(last_stream_id & STREAM_ID_MASK).to_be_bytes());
    payload.extend_from_slice(&error_code.to_be_bytes());
    payload.extend_from_slice(debug_data);
    compile_frame(&payload, frame_type::GOAWAY, flags::NONE, 0)
}

/// Encode SETTINGS entries as a raw payload (6 bytes each).
pub fn settings_payload(settings: &[(u16, u32)]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(settings.len() * 6);
    for (id, value) in settings {
        payload.extend_from_slice(&id.to_be_bytes());
        payload.extend_from_slice(&value.to_be_bytes());
    }
    payload
}

/// Create a SETTINGS frame carrying the given entries
pub fn settings_frame(settings: &[(u16, u32)]) -> Vec<u8> {
    compile_frame(&settings_payload(settings), frame_type::SETTINGS, flags::NONE, 0)
}

/// Create a SETTINGS ACK frame
pub fn settings_ack_frame() -> Vec<u8> {
    compile_frame(&[], frame_type::SETTINGS, flags::ACK, 0)
}

/// Create a PING frame, or its acknowledgement when `ack` is set
pub fn ping_frame(data: [u8; 8], ack: bool) -> Vec<u8> {
    let flags = if ack { flags::ACK } else { flags::NONE };
    compile_frame(&data, frame_type::PING, flags, 0)
}

/// Create a WINDOW_UPDATE frame.
/// stream_id=0 updates connection-level window, otherwise stream-level
pub fn window_update_frame(stream_id: u32, increment: u32) -> Vec<u8> {
    let increment = increment & STREAM_ID_MASK;
    compile_frame(&increment.to_be_bytes(), frame_type::WINDOW_UPDATE, flags::NONE, stream_id)
}

/// Create a CONTINUATION frame to continue a header block
pub fn continuation_frame(stream_id: u32, fragment: &[u8], end_headers: bool) -> Vec<u8> {
    let flags = if end_headers { flags::END_HEADERS } else { flags::NONE };
    compile_frame(fragment, frame_type::CONTINUATION, flags, stream_id)
}
