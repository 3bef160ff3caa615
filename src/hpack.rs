//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! Thin wrapper around `fluke-hpack`. The decoder holds the connection's
//! dynamic table, so every completed header block must pass through it in
//! arrival order even when the block is later rejected.

use thiserror::Error;

/// A decoded HTTP/2 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H2Header {
    pub name: String,
    pub value: String,
}

impl H2Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name and value length, the unit counted against the decode limit.
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HpackError {
    #[error("HPACK decode error: {0}")]
    Decode(String),

    #[error("decoded header list exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// HPACK decoder for HTTP/2 header blocks.
/// Wraps `fluke_hpack::Decoder` which maintains dynamic table state per-connection.
pub struct HpackDecoder {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecoder").finish()
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// Decode a complete header block.
    ///
    /// Fails if the block is not valid HPACK or if the decoded names and
    /// values together exceed `size_limit` bytes. The dynamic table is
    /// updated either way.
    pub fn decode(&mut self, block: &[u8], size_limit: usize) -> Result<Vec<H2Header>, HpackError> {
        let pairs = self
            .inner
            .decode(block)
            .map_err(|e| HpackError::Decode(format!("{:?}", e)))?;

        let mut size = 0usize;
        let mut headers = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            let header = H2Header::new(
                String::from_utf8_lossy(&name).into_owned(),
                String::from_utf8_lossy(&value).into_owned(),
            );
            size = size.saturating_add(header.size());
            if size > size_limit {
                return Err(HpackError::TooLarge { limit: size_limit });
            }
            headers.push(header);
        }
        Ok(headers)
    }
}

/// HPACK encoder for HTTP/2 header blocks.
/// Wraps `fluke_hpack::Encoder` which maintains dynamic table state per-connection.
pub struct HpackEncoder {
    inner: fluke_hpack::Encoder<'static>,
}

impl std::fmt::Debug for HpackEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackEncoder").finish()
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Encoder::new(),
        }
    }

    /// Encode headers into an HPACK header block.
    pub fn encode(&mut self, headers: &[H2Header]) -> Vec<u8> {
        let pairs: Vec<(&[u8], &[u8])> = headers
            .iter()
            .map(|h| (h.name.as_bytes(), h.value.as_bytes()))
            .collect();
        self.inner.encode(pairs)
    }
}
