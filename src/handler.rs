//! The event sink the parser reports into.
//!
//! The connection layer implements [`FrameHandler`] and decides what to do
//! with each event (acknowledge SETTINGS, answer PING, send RST_STREAM, ...).
//! `Vec<H2Event>` implements it too, recording every call in order.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{ConnectionError, StreamError};
use crate::h2_codec::Priority;
use crate::header_block::HeaderSet;

/// Decoded SETTINGS entries, keyed by identifier. A repeated identifier keeps its last value.
pub type Settings = HashMap<u16, u32>;

/// Receiver for decoded frames. One method per event.
pub trait FrameHandler {
    fn handle_data(&mut self, stream_id: u32, data: Bytes);

    fn handle_headers(&mut self, stream_id: u32, headers: HeaderSet, end_stream: bool);

    fn handle_push_promise(&mut self, stream_id: u32, promised_stream_id: u32, headers: HeaderSet);

    fn handle_priority(&mut self, stream_id: u32, priority: Priority);

    fn handle_stream_reset(&mut self, stream_id: u32, error_code: u32);

    fn handle_settings(&mut self, settings: Settings);

    fn handle_ping(&mut self, payload: [u8; 8]);

    fn handle_pong(&mut self, payload: [u8; 8]);

    fn handle_shutdown(&mut self, last_stream_id: u32, error_code: u32, debug_data: Bytes);

    fn handle_stream_window_increment(&mut self, stream_id: u32, increment: u32);

    fn handle_connection_window_increment(&mut self, increment: u32);

    fn handle_stream_end(&mut self, stream_id: u32);

    /// A stream-scoped failure. Parsing continues after this returns.
    fn handle_stream_error(&mut self, error: &StreamError);

    /// A connection-scoped failure. `push` returns the same error after this.
    fn handle_connection_error(&mut self, error: &ConnectionError);
}

/// One recorded handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum H2Event {
    Data {
        stream_id: u32,
        data: Bytes,
    },
    Headers {
        stream_id: u32,
        headers: HeaderSet,
        end_stream: bool,
    },
    PushPromise {
        stream_id: u32,
        promised_stream_id: u32,
        headers: HeaderSet,
    },
    Priority {
        stream_id: u32,
        priority: Priority,
    },
    StreamReset {
        stream_id: u32,
        error_code: u32,
    },
    Settings(Settings),
    Ping([u8; 8]),
    Pong([u8; 8]),
    GoAway {
        last_stream_id: u32,
        error_code: u32,
        debug_data: Bytes,
    },
    StreamWindowUpdate {
        stream_id: u32,
        increment: u32,
    },
    ConnectionWindowUpdate {
        increment: u32,
    },
    StreamEnd {
        stream_id: u32,
    },
    StreamError(StreamError),
    ConnectionError(ConnectionError),
}

impl FrameHandler for Vec<H2Event> {
    fn handle_data(&mut self, stream_id: u32, data: Bytes) {
        self.push(H2Event::Data { stream_id, data });
    }

    fn handle_headers(&mut self, stream_id: u32, headers: HeaderSet, end_stream: bool) {
        self.push(H2Event::Headers {
            stream_id,
            headers,
            end_stream,
        });
    }

    fn handle_push_promise(&mut self, stream_id: u32, promised_stream_id: u32, headers: HeaderSet) {
        self.push(H2Event::PushPromise {
            stream_id,
            promised_stream_id,
            headers,
        });
    }

    fn handle_priority(&mut self, stream_id: u32, priority: Priority) {
        self.push(H2Event::Priority { stream_id, priority });
    }

    fn handle_stream_reset(&mut self, stream_id: u32, error_code: u32) {
        self.push(H2Event::StreamReset {
            stream_id,
            error_code,
        });
    }

    fn handle_settings(&mut self, settings: Settings) {
        self.push(H2Event::Settings(settings));
    }

    fn handle_ping(&mut self, payload: [u8; 8]) {
        self.push(H2Event::Ping(payload));
    }

    fn handle_pong(&mut self, payload: [u8; 8]) {
        self.push(H2Event::Pong(payload));
    }

    fn handle_shutdown(&mut self, last_stream_id: u32, error_code: u32, debug_data: Bytes) {
        self.push(H2Event::GoAway {
            last_stream_id,
            error_code,
            debug_data,
        });
    }

    fn handle_stream_window_increment(&mut self, stream_id: u32, increment: u32) {
        self.push(H2Event::StreamWindowUpdate {
            stream_id,
            increment,
        });
    }

    fn handle_connection_window_increment(&mut self, increment: u32) {
        self.push(H2Event::ConnectionWindowUpdate { increment });
    }

    fn handle_stream_end(&mut self, stream_id: u32) {
        self.push(H2Event::StreamEnd { stream_id });
    }

    fn handle_stream_error(&mut self, error: &StreamError) {
        self.push(H2Event::StreamError(error.clone()));
    }

    fn handle_connection_error(&mut self, error: &ConnectionError) {
        self.push(H2Event::ConnectionError(error.clone()));
    }
}
