//! Byte cursor over an in-memory buffer.
//!
//! The container parsers walk tagged binary records by offset. Keeping the
//! position explicit over a plain slice means the same walk runs against a
//! whole file read into memory and against nested payloads (an ID3 block
//! inside a WAV chunk) without touching the filesystem twice, and tests can
//! feed in fixture byte arrays directly.

/// How a parsing pass over a buffer ended.
///
/// Truncation and malformed sizes are expected conditions for the formats we
/// read; both end the walk early with whatever was gathered so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The walk consumed the buffer up to its declared end.
    Complete,
    /// A header or payload read ran off the end of the buffer.
    Truncated,
    /// A declared size was inconsistent (e.g. smaller than its own header).
    Malformed,
}

/// Forward-only cursor with explicit seeks, clamped to the buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Read exactly `n` bytes, or `None` without consuming anything.
    pub fn read_exact(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    /// Read up to `n` bytes; short reads happen only at end of buffer.
    pub fn read_up_to(&mut self, n: usize) -> &'a [u8] {
        let take = n.min(self.remaining());
        let slice = &self.buf[self.pos..self.pos + take];
        self.pos += take;
        slice
    }

    pub fn read_fourcc(&mut self) -> Option<[u8; 4]> {
        let bytes = self.read_exact(4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        let bytes = self.read_exact(4)?;
        Some(u32::from_be_bytes(bytes.try_into().ok()?))
    }

    pub fn read_u64_be(&mut self) -> Option<u64> {
        let bytes = self.read_exact(8)?;
        Some(u64::from_be_bytes(bytes.try_into().ok()?))
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.read_exact(4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    /// Advance by `n` bytes. Returns false (with the position clamped to the
    /// end) when the buffer is shorter than the skip, i.e. truncated input.
    pub fn skip(&mut self, n: usize) -> bool {
        if self.remaining() < n {
            self.pos = self.buf.len();
            false
        } else {
            self.pos += n;
            true
        }
    }

    /// Jump to an absolute offset, clamped to the end of the buffer.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }
}
