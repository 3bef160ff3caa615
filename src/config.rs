//! Parser limits.

use crate::h2_codec::DEFAULT_MAX_FRAME_SIZE;

/// Maximum accumulated header block size (256 KB).
/// Bounds memory held across HEADERS + CONTINUATION floods.
pub const MAX_HEADER_BLOCK_SIZE: usize = 256 * 1024;

/// Resource bounds applied to one connection's inbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Largest accepted frame payload. Larger frames are a FRAME_SIZE_ERROR.
    pub frame_size_limit: usize,
    /// Largest accepted header block once reassembled; also the HPACK decode limit.
    pub header_size_limit: usize,
    /// Hard cap on fragments buffered while waiting for END_HEADERS.
    pub max_header_block_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            frame_size_limit: DEFAULT_MAX_FRAME_SIZE,
            header_size_limit: DEFAULT_MAX_FRAME_SIZE,
            max_header_block_size: MAX_HEADER_BLOCK_SIZE,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_size_limit(mut self, limit: usize) -> Self {
        self.frame_size_limit = limit;
        self
    }

    pub fn header_size_limit(mut self, limit: usize) -> Self {
        self.header_size_limit = limit;
        self
    }

    pub fn max_header_block_size(mut self, limit: usize) -> Self {
        self.max_header_block_size = limit;
        self
    }

    /// The accumulation cap actually enforced; never below `header_size_limit`.
    pub fn header_block_cap(&self) -> usize {
        self.max_header_block_size.max(self.header_size_limit)
    }
}
