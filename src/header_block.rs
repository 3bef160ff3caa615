//! Header block reassembly across HEADERS / PUSH_PROMISE + CONTINUATION frames,
//! and validation of the decoded field list.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};

use crate::error::ErrorKind;
use crate::hpack::H2Header;

/// The frame that opened a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFrameKind {
    Headers,
    PushPromise { promised_stream_id: u32 },
}

/// A header block whose END_HEADERS flag has been seen.
#[derive(Debug, Clone)]
pub struct CompletedBlock {
    pub kind: HeaderFrameKind,
    pub stream_id: u32,
    /// END_STREAM from the opening frame.
    pub end_stream: bool,
    /// All fragments, concatenated in arrival order.
    pub block: Bytes,
}

/// Accumulates header block fragments for a single stream.
///
/// `stream_id == 0` means no block is open; fragments are only buffered
/// while a block is open.
#[derive(Debug, Default)]
pub struct HeaderBlock {
    kind: Option<HeaderFrameKind>,
    fragments: Vec<Bytes>,
    length: usize,
    stream_id: u32,
    end_stream: bool,
    continuation_expected: bool,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.stream_id != 0
    }

    /// Stream owning the open block, 0 if none.
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn continuation_expected(&self) -> bool {
        self.continuation_expected
    }

    /// Bytes buffered so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Open a block with the fragment carried by a HEADERS or PUSH_PROMISE frame.
    pub fn start(
        &mut self,
        kind: HeaderFrameKind,
        stream_id: u32,
        end_stream: bool,
        fragment: Bytes,
        cap: usize,
    ) -> Result<(), ErrorKind> {
        if self.is_open() && self.stream_id != stream_id {
            return Err(ErrorKind::ExpectedContinuation(self.stream_id));
        }
        self.kind = Some(kind);
        self.end_stream = end_stream;
        self.push_fragment(stream_id, fragment, cap)
    }

    /// Append the fragment carried by a CONTINUATION frame.
    pub fn continue_block(&mut self, stream_id: u32, fragment: Bytes, cap: usize) -> Result<(), ErrorKind> {
        if !self.is_open() {
            return Err(ErrorKind::UnexpectedContinuation(stream_id));
        }
        if stream_id != self.stream_id {
            return Err(ErrorKind::ContinuationStreamMismatch {
                expected: self.stream_id,
                got: stream_id,
            });
        }
        self.push_fragment(stream_id, fragment, cap)
    }

    fn push_fragment(&mut self, stream_id: u32, fragment: Bytes, cap: usize) -> Result<(), ErrorKind> {
        let size = self.length + fragment.len();
        if size > cap {
            self.clear();
            return Err(ErrorKind::HeaderBlockOverflow { size, limit: cap });
        }
        self.stream_id = stream_id;
        self.length = size;
        self.fragments.push(fragment);
        Ok(())
    }

    /// Mark that the opening frame lacked END_HEADERS.
    pub fn expect_continuation(&mut self) {
        self.continuation_expected = true;
    }

    /// Close the block and hand back its concatenated bytes. The reassembler
    /// is empty afterwards, whatever the caller does with the result.
    pub fn finish(&mut self) -> CompletedBlock {
        let block = match self.fragments.len() {
            1 => self.fragments.pop().unwrap_or_default(),
            _ => {
                let mut buf = BytesMut::with_capacity(self.length);
                for fragment in &self.fragments {
                    buf.extend_from_slice(fragment);
                }
                buf.freeze()
            }
        };
        let completed = CompletedBlock {
            kind: self.kind.unwrap_or(HeaderFrameKind::Headers),
            stream_id: self.stream_id,
            end_stream: self.end_stream,
            block,
        };
        self.clear();
        completed
    }

    pub fn clear(&mut self) {
        self.kind = None;
        self.fragments.clear();
        self.length = 0;
        self.stream_id = 0;
        self.end_stream = false;
        self.continuation_expected = false;
    }
}

/// HTTP/2 field names: visible ASCII without uppercase letters.
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| matches!(b, 0x21..=0x40 | 0x5b..=0x7e))
}

fn is_pseudo_header(name: &str) -> bool {
    name.as_bytes().first() == Some(&b':')
}

/// The header set produced by one completed header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    /// Pseudo-headers (`:method`, `:status`, ...), unique by name.
    pub pseudo: HashMap<String, String>,
    /// Regular headers; repeated names keep their decode order.
    pub regular: HashMap<String, Vec<String>>,
}

impl HeaderSet {
    /// Validate and sort decoded fields.
    ///
    /// An invalid name is checked before ordering for each field, so a field
    /// that is both badly named and misplaced reports the name.
    pub fn from_fields(fields: Vec<H2Header>) -> Result<Self, ErrorKind> {
        let mut set = Self::default();

        for H2Header { name, value } in fields {
            if !is_valid_header_name(&name) {
                return Err(ErrorKind::InvalidHeaderName);
            }

            if is_pseudo_header(&name) {
                if !set.regular.is_empty() {
                    return Err(ErrorKind::PseudoHeaderAfterRegular);
                }
                if set.pseudo.contains_key(&name) {
                    return Err(ErrorKind::RepeatPseudoHeader(name));
                }
                set.pseudo.insert(name, value);
                continue;
            }

            set.regular.entry(name).or_default().push(value);
        }

        Ok(set)
    }

    pub fn pseudo(&self, name: &str) -> Option<&str> {
        self.pseudo.get(name).map(String::as_str)
    }

    /// First value of a regular header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.regular.get(name)?.first().map(String::as_str)
    }

    /// All values of a regular header, in decode order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.regular.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
