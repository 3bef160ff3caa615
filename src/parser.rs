//! Incremental HTTP/2 frame parser.
//!
//! Bytes go in through [`Http2Parser::push`] in chunks of any size. The
//! parser buffers until a full 9-byte header and then the declared payload
//! are available, decodes the frame and reports it to its [`FrameHandler`].
//! Header blocks split over CONTINUATION frames are reassembled and decoded
//! with HPACK before the handler sees them.
//!
//! Reference: RFC 9113 Sections 4 and 6

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::error::{ConnectionError, ErrorKind, FrameError, ParseError};
use crate::h2_codec::{
    flags, frame_name, frame_type, H2FrameHeader, Priority, FRAME_HEADER_LEN, STREAM_ID_MASK,
};
use crate::handler::{FrameHandler, Settings};
use crate::header_block::{CompletedBlock, HeaderBlock, HeaderFrameKind, HeaderSet};
use crate::hpack::HpackDecoder;

/// Largest SETTINGS payload accepted: 10 entries. Anything bigger is
/// treated as a flood.
pub const MAX_SETTINGS_PAYLOAD: usize = 60;

const SETTING_ENTRY_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    AwaitingHeader,
    AwaitingPayload(H2FrameHeader),
    Closed,
}

/// Frame parser for one HTTP/2 connection.
///
/// A single owner feeds bytes in arrival order.
/// A connection error or [`cancel`](Self::cancel) closes the parser for good.
#[derive(Debug)]
pub struct Http2Parser<H> {
    handler: H,
    hpack: HpackDecoder,
    config: ParserConfig,
    /// Bytes received but not yet consumed as a frame header or payload
    buffer: BytesMut,
    state: ReadState,
    header_block: HeaderBlock,
    received_frame_count: u64,
    received_byte_count: u64,
}

impl<H: FrameHandler> Http2Parser<H> {
    pub fn new(handler: H, config: ParserConfig) -> Self {
        Self {
            handler,
            hpack: HpackDecoder::new(),
            config,
            buffer: BytesMut::new(),
            state: ReadState::AwaitingHeader,
            header_block: HeaderBlock::new(),
            received_frame_count: 0,
            received_byte_count: 0,
        }
    }

    /// Create a parser and feed it a SETTINGS payload negotiated out of band
    /// (e.g. the `HTTP2-Settings` header of an h2c upgrade). The handler sees
    /// it as an ordinary SETTINGS event before any pushed bytes.
    pub fn with_peer_settings(
        handler: H,
        config: ParserConfig,
        settings: &[u8],
    ) -> Result<Self, ConnectionError> {
        let mut parser = Self::new(handler, config);
        if let Some(settings) =
            decode_settings(flags::NONE, 0, settings).map_err(ConnectionError::new)?
        {
            parser.handler.handle_settings(settings);
        }
        Ok(parser)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn received_frame_count(&self) -> u64 {
        self.received_frame_count
    }

    pub fn received_byte_count(&self) -> u64 {
        self.received_byte_count
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Stream whose header block is waiting for CONTINUATION frames.
    pub fn pending_header_stream(&self) -> Option<u32> {
        self.header_block.is_open().then(|| self.header_block.stream_id())
    }

    pub fn is_closed(&self) -> bool {
        self.state == ReadState::Closed
    }

    /// Stop parsing. Buffered bytes are dropped and no further events fire.
    pub fn cancel(&mut self) {
        if !self.is_closed() {
            debug!(buffered = self.buffer.len(), "parser cancelled");
        }
        self.close();
    }

    fn close(&mut self) {
        self.state = ReadState::Closed;
        self.buffer = BytesMut::new();
        self.header_block.clear();
    }

    /// Feed received bytes.
    ///
    /// Stream errors go to the handler and parsing continues. A connection
    /// error goes to the handler, closes the parser and is returned.
    ///
    /// A frame rejected for its size is not counted in either counter.
    pub fn push(&mut self, data: &[u8]) -> Result<(), ParseError> {
        if self.is_closed() {
            return Err(ParseError::Closed);
        }
        self.buffer.extend_from_slice(data);

        loop {
            match self.state {
                ReadState::Closed => return Err(ParseError::Closed),
                ReadState::AwaitingHeader => {
                    if self.buffer.len() < FRAME_HEADER_LEN {
                        return Ok(());
                    }
                    let mut raw = [0u8; FRAME_HEADER_LEN];
                    raw.copy_from_slice(&self.buffer[..FRAME_HEADER_LEN]);
                    self.buffer.advance(FRAME_HEADER_LEN);

                    let header = H2FrameHeader::from_bytes(&raw);

                    // Reject before buffering the payload.
                    let length = header.length as usize;
                    if length > self.config.frame_size_limit {
                        let kind = ErrorKind::FrameTooLarge {
                            length,
                            limit: self.config.frame_size_limit,
                        };
                        return Err(self.abort(ConnectionError::new(kind)));
                    }

                    self.received_byte_count += FRAME_HEADER_LEN as u64;
                    self.state = ReadState::AwaitingPayload(header);
                }
                ReadState::AwaitingPayload(header) => {
                    let length = header.length as usize;
                    if self.buffer.len() < length {
                        return Ok(());
                    }
                    let payload = self.buffer.split_to(length).freeze();
                    self.received_byte_count += length as u64;
                    self.received_frame_count += 1;
                    self.state = ReadState::AwaitingHeader;

                    trace!(
                        frame = %frame_name(header.frame_type),
                        flags = format_args!("{:#04x}", header.flags),
                        stream_id = header.stream_id,
                        length,
                        "recv"
                    );

                    match self.dispatch(&header, payload) {
                        Ok(()) => {}
                        Err(FrameError::Stream(error)) => {
                            debug!(%error, "stream error");
                            self.handler.handle_stream_error(&error);
                        }
                        Err(FrameError::Connection(error)) => return Err(self.abort(error)),
                    }
                }
            }
        }
    }

    fn abort(&mut self, error: ConnectionError) -> ParseError {
        debug!(%error, "connection error");
        self.handler.handle_connection_error(&error);
        self.close();
        ParseError::Connection(error)
    }

    fn dispatch(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        if self.header_block.continuation_expected() && header.frame_type != frame_type::CONTINUATION {
            return Err(ErrorKind::ExpectedContinuation(self.header_block.stream_id()).on_connection());
        }

        match header.frame_type {
            frame_type::DATA => self.parse_data(header, payload),
            frame_type::HEADERS => self.parse_headers(header, payload),
            frame_type::PRIORITY => self.parse_priority(header, &payload),
            frame_type::RST_STREAM => self.parse_rst_stream(header, &payload),
            frame_type::SETTINGS => {
                if let Some(settings) = decode_settings(header.flags, header.stream_id, &payload)
                    .map_err(ErrorKind::on_connection)?
                {
                    self.handler.handle_settings(settings);
                }
                Ok(())
            }
            frame_type::PUSH_PROMISE => self.parse_push_promise(header, payload),
            frame_type::PING => self.parse_ping(header, &payload),
            frame_type::GOAWAY => self.parse_goaway(header, payload),
            frame_type::WINDOW_UPDATE => self.parse_window_update(header, &payload),
            frame_type::CONTINUATION => self.parse_continuation(header, payload),
            other => {
                trace!(frame = %frame_name(other), "discarding unknown frame");
                Ok(())
            }
        }
    }

    /// DATA (RFC 9113 Section 6.1)
    fn parse_data(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        let prefix_len = usize::from(header.is_padded());
        if payload.len() < prefix_len {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }
        let padding = pad_length(header, &payload);

        if header.stream_id == 0 {
            return Err(ErrorKind::ZeroStreamId.on_connection());
        }

        let data = unpadded(&payload, prefix_len, padding)?;
        self.handler.handle_data(header.stream_id, data);

        if header.is_end_stream() {
            self.handler.handle_stream_end(header.stream_id);
        }
        Ok(())
    }

    /// HEADERS (RFC 9113 Section 6.2)
    fn parse_headers(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        let stream_id = header.stream_id;
        if stream_id == 0 {
            return Err(ErrorKind::ZeroStreamId.on_connection());
        }

        let pad_len = usize::from(header.is_padded());
        let prefix_len = pad_len + if header.has_priority() { 5 } else { 0 };
        if payload.len() < prefix_len {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }
        let padding = pad_length(header, &payload);

        if header.has_priority() {
            let mut raw = [0u8; 5];
            raw.copy_from_slice(&payload[pad_len..prefix_len]);
            let priority = Priority::decode(&raw);
            if priority.dependency == stream_id {
                return Err(ErrorKind::RecursiveDependency(stream_id).on_connection());
            }
            self.handler.handle_priority(stream_id, priority);
        }

        let fragment = unpadded(&payload, prefix_len, padding)?;
        self.header_block
            .start(
                HeaderFrameKind::Headers,
                stream_id,
                header.is_end_stream(),
                fragment,
                self.config.header_block_cap(),
            )
            .map_err(ErrorKind::on_connection)?;

        self.end_header_fragment(header)
    }

    /// PUSH_PROMISE (RFC 9113 Section 6.6)
    fn parse_push_promise(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        let stream_id = header.stream_id;
        if stream_id == 0 {
            return Err(ErrorKind::ZeroStreamId.on_connection());
        }

        let pad_len = usize::from(header.is_padded());
        let prefix_len = pad_len + 4;
        if payload.len() < prefix_len {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }
        let padding = pad_length(header, &payload);
        let promised_stream_id = read_u32(&payload, pad_len) & STREAM_ID_MASK;

        let fragment = unpadded(&payload, prefix_len, padding)?;
        self.header_block
            .start(
                HeaderFrameKind::PushPromise { promised_stream_id },
                stream_id,
                header.is_end_stream(),
                fragment,
                self.config.header_block_cap(),
            )
            .map_err(ErrorKind::on_connection)?;

        self.end_header_fragment(header)
    }

    /// CONTINUATION (RFC 9113 Section 6.10)
    fn parse_continuation(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        self.header_block
            .continue_block(header.stream_id, payload, self.config.header_block_cap())
            .map_err(ErrorKind::on_connection)?;

        self.end_header_fragment(header)
    }

    fn end_header_fragment(&mut self, header: &H2FrameHeader) -> Result<(), FrameError> {
        if header.is_end_headers() {
            self.complete_header_block()
        } else {
            self.header_block.expect_continuation();
            Ok(())
        }
    }

    /// Decode a finished block and report it.
    ///
    /// The block always goes through HPACK first so the dynamic table stays
    /// in sync with the peer; only then is the size limit reported, and only
    /// then are the decoded names checked.
    fn complete_header_block(&mut self) -> Result<(), FrameError> {
        let limit = self.config.header_size_limit;
        let CompletedBlock {
            kind,
            stream_id,
            end_stream,
            block,
        } = self.header_block.finish();
        let too_large = block.len() > limit;

        let fields = self
            .hpack
            .decode(&block, limit)
            .map_err(|e| ErrorKind::Compression(e.to_string()).on_connection())?;

        if too_large {
            return Err(ErrorKind::HeaderListTooLarge(limit).on_stream(stream_id));
        }

        let headers = HeaderSet::from_fields(fields).map_err(|kind| kind.on_stream(stream_id))?;

        match kind {
            HeaderFrameKind::Headers => self.handler.handle_headers(stream_id, headers, end_stream),
            HeaderFrameKind::PushPromise { promised_stream_id } => {
                self.handler.handle_push_promise(stream_id, promised_stream_id, headers)
            }
        }

        if end_stream {
            self.handler.handle_stream_end(stream_id);
        }
        Ok(())
    }

    /// PRIORITY (RFC 9113 Section 6.3)
    fn parse_priority(&mut self, header: &H2FrameHeader, payload: &[u8]) -> Result<(), FrameError> {
        let raw: &[u8; 5] = payload
            .try_into()
            .map_err(|_| ErrorKind::InvalidFrameLength.on_connection())?;
        let priority = Priority::decode(raw);

        if header.stream_id == 0 {
            return Err(ErrorKind::ZeroStreamId.on_connection());
        }
        if priority.dependency == header.stream_id {
            return Err(ErrorKind::RecursiveDependency(header.stream_id).on_connection());
        }

        self.handler.handle_priority(header.stream_id, priority);
        Ok(())
    }

    /// RST_STREAM (RFC 9113 Section 6.4)
    fn parse_rst_stream(&mut self, header: &H2FrameHeader, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() != 4 {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }
        if header.stream_id == 0 {
            return Err(ErrorKind::ZeroStreamId.on_connection());
        }

        self.handler.handle_stream_reset(header.stream_id, read_u32(payload, 0));
        Ok(())
    }

    /// PING (RFC 9113 Section 6.7)
    fn parse_ping(&mut self, header: &H2FrameHeader, payload: &[u8]) -> Result<(), FrameError> {
        let data: [u8; 8] = payload
            .try_into()
            .map_err(|_| ErrorKind::InvalidFrameLength.on_connection())?;
        if header.stream_id != 0 {
            return Err(ErrorKind::NonZeroStreamId.on_connection());
        }

        if header.is_ack() {
            self.handler.handle_pong(data);
        } else {
            self.handler.handle_ping(data);
        }
        Ok(())
    }

    /// GOAWAY (RFC 9113 Section 6.8)
    fn parse_goaway(&mut self, header: &H2FrameHeader, payload: Bytes) -> Result<(), FrameError> {
        if payload.len() < 8 {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }
        if header.stream_id != 0 {
            return Err(ErrorKind::NonZeroStreamId.on_connection());
        }

        let last_stream_id = read_u32(&payload, 0) & STREAM_ID_MASK;
        let error_code = read_u32(&payload, 4);
        self.handler
            .handle_shutdown(last_stream_id, error_code, payload.slice(8..));
        Ok(())
    }

    /// WINDOW_UPDATE (RFC 9113 Section 6.9)
    fn parse_window_update(&mut self, header: &H2FrameHeader, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() != 4 {
            return Err(ErrorKind::InvalidFrameLength.on_connection());
        }

        let increment = read_u32(payload, 0) & STREAM_ID_MASK;
        if increment == 0 {
            return Err(ErrorKind::ZeroWindowIncrement.on_stream(header.stream_id));
        }

        if header.stream_id != 0 {
            self.handler
                .handle_stream_window_increment(header.stream_id, increment);
        } else {
            self.handler.handle_connection_window_increment(increment);
        }
        Ok(())
    }
}

/// SETTINGS (RFC 9113 Section 6.5). Returns `None` for an acknowledgement.
///
/// Values are passed through as received; what they mean is up to the handler.
fn decode_settings(frame_flags: u8, stream_id: u32, payload: &[u8]) -> Result<Option<Settings>, ErrorKind> {
    if stream_id != 0 {
        return Err(ErrorKind::NonZeroStreamId);
    }

    if frame_flags & flags::ACK != 0 {
        if !payload.is_empty() {
            return Err(ErrorKind::InvalidFrameLength);
        }
        return Ok(None);
    }

    if payload.len() % SETTING_ENTRY_LEN != 0 {
        return Err(ErrorKind::InvalidFrameLength);
    }
    if payload.len() > MAX_SETTINGS_PAYLOAD {
        return Err(ErrorKind::ExcessiveSettings(payload.len()));
    }

    let mut settings = Settings::with_capacity(payload.len() / SETTING_ENTRY_LEN);
    for entry in payload.chunks_exact(SETTING_ENTRY_LEN) {
        let id = u16::from_be_bytes([entry[0], entry[1]]);
        settings.insert(id, read_u32(entry, 2));
    }
    Ok(Some(settings))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Pad Length field; callers have checked the payload holds it.
fn pad_length(header: &H2FrameHeader, payload: &[u8]) -> usize {
    if header.is_padded() {
        payload[0] as usize
    } else {
        0
    }
}

/// The bytes between a `prefix_len`-byte prefix and `padding` trailing bytes.
fn unpadded(payload: &Bytes, prefix_len: usize, padding: usize) -> Result<Bytes, FrameError> {
    if payload.len() < prefix_len + padding {
        return Err(ErrorKind::PaddingOverflow.on_connection());
    }
    Ok(payload.slice(prefix_len..payload.len() - padding))
}
