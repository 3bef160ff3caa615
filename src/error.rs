//! Error taxonomy for the frame parser (RFC 9113 Section 5.4).
//!
//! Every validation failure is an [`ErrorKind`]. A kind carries a fixed
//! HTTP/2 error code and a fixed scope; [`ErrorKind::on_stream`] turns it
//! into either a [`StreamError`] (the parser keeps running) or a
//! [`ConnectionError`] (the parser stops and `push` returns it).

use thiserror::Error;

/// HTTP/2 error codes (RFC 9113 Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    /// Map a wire value to a known code. Extension codes return `None`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            _ => return None,
        })
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Whether a failure affects one stream or the whole connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Stream,
    Connection,
}

/// What went wrong while decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("invalid frame length")]
    InvalidFrameLength,

    #[error("frame size limit exceeded ({length} > {limit})")]
    FrameTooLarge { length: usize, limit: usize },

    #[error("invalid zero stream ID")]
    ZeroStreamId,

    #[error("invalid non-zero stream ID")]
    NonZeroStreamId,

    #[error("padding greater than length")]
    PaddingOverflow,

    #[error("invalid recursive dependency for stream {0}")]
    RecursiveDependency(u32),

    #[error("expected CONTINUATION frame for stream ID {0}")]
    ExpectedContinuation(u32),

    #[error("CONTINUATION frame for stream {got} while header block is open on stream {expected}")]
    ContinuationStreamMismatch { expected: u32, got: u32 },

    #[error("unexpected CONTINUATION frame for stream ID {0}")]
    UnexpectedContinuation(u32),

    #[error("excessive SETTINGS frame ({0} bytes)")]
    ExcessiveSettings(usize),

    #[error("header block too large ({size} bytes, max {limit})")]
    HeaderBlockOverflow { size: usize, limit: usize },

    #[error("headers exceed maximum configured size of {0} bytes")]
    HeaderListTooLarge(usize),

    #[error("compression error in headers: {0}")]
    Compression(String),

    #[error("invalid header field name")]
    InvalidHeaderName,

    #[error("pseudo header after other headers")]
    PseudoHeaderAfterRegular,

    #[error("repeat pseudo header {0}")]
    RepeatPseudoHeader(String),

    #[error("invalid zero window update value")]
    ZeroWindowIncrement,
}

impl ErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FrameTooLarge { .. } => ErrorCode::FrameSizeError,
            Self::HeaderBlockOverflow { .. } | Self::HeaderListTooLarge(_) => {
                ErrorCode::EnhanceYourCalm
            }
            Self::Compression(_) => ErrorCode::CompressionError,
            _ => ErrorCode::ProtocolError,
        }
    }

    /// The scope this kind has when raised on a non-zero stream.
    pub fn scope(&self) -> Scope {
        match self {
            Self::HeaderListTooLarge(_) | Self::InvalidHeaderName | Self::ZeroWindowIncrement => {
                Scope::Stream
            }
            _ => Scope::Connection,
        }
    }

    /// Classify this failure for the frame that raised it.
    ///
    /// Stream-scoped kinds raised on stream 0 have no stream to reset and
    /// escalate to the connection.
    pub fn on_stream(self, stream_id: u32) -> FrameError {
        match self.scope() {
            Scope::Stream if stream_id != 0 => FrameError::Stream(StreamError {
                stream_id,
                code: self.code(),
                kind: self,
            }),
            _ => FrameError::Connection(ConnectionError::new(self)),
        }
    }

    /// Raise this failure as a connection error regardless of its scope.
    pub fn on_connection(self) -> FrameError {
        FrameError::Connection(ConnectionError::new(self))
    }
}

/// A failure confined to one stream. The connection continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream {stream_id} error ({code:?}): {kind}")]
pub struct StreamError {
    pub stream_id: u32,
    pub code: ErrorCode,
    pub kind: ErrorKind,
}

/// A failure that tears down the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("connection error ({code:?}): {kind}")]
pub struct ConnectionError {
    pub code: ErrorCode,
    pub kind: ErrorKind,
}

impl ConnectionError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            code: kind.code(),
            kind,
        }
    }
}

/// A classified frame failure, routed by the parser loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error(transparent)]
    Stream(StreamError),

    #[error(transparent)]
    Connection(ConnectionError),
}

/// Errors returned from [`Http2Parser::push`](crate::Http2Parser::push).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("parser is closed")]
    Closed,
}
