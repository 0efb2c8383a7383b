//! Buffered byte-level reader over the dump stream.
//!
//! Unlike `std::io::BufRead::lines`, which the old admin-cli dump reader
//! used, this format mixes ASCII header lines with binary blocks whose
//! length is given ahead of time by a header value, so callers need to
//! switch between line-oriented and exact-length reads mid-stream. A
//! single pending-line slot gives the parser the one line of lookahead it
//! needs to tell a stray blank line from the next header block.

use crate::error::{FilterError, Result};
use std::io::Read;

const CHUNK: usize = 64 * 1024;

pub struct ByteReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    base_position: u64,
    eof: bool,
    pending_line: Option<(u64, Vec<u8>)>,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            pos: 0,
            filled: 0,
            base_position: 0,
            eof: false,
            pending_line: None,
        }
    }

    /// Absolute byte offset of the next unread byte.
    pub fn position(&self) -> u64 {
        match &self.pending_line {
            Some((start, _)) => *start,
            None => self.base_position + self.pos as u64,
        }
    }

    fn fill(&mut self) -> Result<bool> {
        if self.pos < self.filled {
            return Ok(true);
        }
        self.base_position += self.filled as u64;
        self.buf.clear();
        self.pos = 0;
        self.filled = 0;
        if self.eof {
            return Ok(false);
        }
        let mut chunk = vec![0u8; CHUNK];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        chunk.truncate(n);
        self.buf = chunk;
        self.filled = n;
        Ok(true)
    }

    /// True if no more bytes remain (does not consume the pending line, if any).
    pub fn at_eof(&mut self) -> Result<bool> {
        if self.pending_line.is_some() {
            return Ok(false);
        }
        Ok(!self.fill()?)
    }

    /// Reads one line including its terminating `\n`. Fails with `Eof` if
    /// called with nothing left to read, or `TruncatedBody` if the stream
    /// ends mid-line without a terminator.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        if let Some((_, line)) = self.pending_line.take() {
            return Ok(line);
        }
        let start = self.position();
        let mut out = Vec::new();
        loop {
            if self.pos >= self.filled && !self.fill()? {
                if out.is_empty() {
                    return Err(FilterError::Eof { position: start });
                }
                return Err(FilterError::TruncatedBody {
                    position: self.position(),
                    message: "line not terminated by newline before end of input".into(),
                });
            }
            let slice = &self.buf[self.pos..self.filled];
            if let Some(idx) = slice.iter().position(|&b| b == b'\n') {
                out.extend_from_slice(&slice[..=idx]);
                self.pos += idx + 1;
                return Ok(out);
            }
            out.extend_from_slice(slice);
            self.pos = self.filled;
        }
    }

    /// Pushes a line back so the next `read_line` returns it again.
    pub fn unread_line(&mut self, position: u64, line: Vec<u8>) {
        debug_assert!(self.pending_line.is_none(), "at most one line of lookahead is supported");
        self.pending_line = Some((position, line));
    }

    /// Reads exactly `n` bytes, failing with `TruncatedBody` if the stream
    /// ends first.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if self.pos >= self.filled && !self.fill()? {
                return Err(FilterError::TruncatedBody {
                    position: self.position(),
                    message: format!("expected {} bytes, got {}", n, out.len()),
                });
            }
            let need = n - out.len();
            let avail = self.filled - self.pos;
            let take = need.min(avail);
            out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_lines_and_tracks_position() {
        let mut r = ByteReader::new(Cursor::new(b"abc\ndef\n".to_vec()));
        assert_eq!(r.read_line().unwrap(), b"abc\n");
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_line().unwrap(), b"def\n");
        assert!(r.at_eof().unwrap());
    }

    #[test]
    fn read_exact_spans_chunks() {
        let data = vec![b'x'; CHUNK + 10];
        let mut r = ByteReader::new(Cursor::new(data.clone()));
        let got = r.read_exact(CHUNK + 10).unwrap();
        assert_eq!(got, data);
        assert!(r.at_eof().unwrap());
    }

    #[test]
    fn truncated_line_is_an_error() {
        let mut r = ByteReader::new(Cursor::new(b"no newline".to_vec()));
        assert!(matches!(r.read_line(), Err(FilterError::TruncatedBody { .. })));
    }

    #[test]
    fn eof_on_empty_stream() {
        let mut r = ByteReader::new(Cursor::new(Vec::new()));
        assert!(matches!(r.read_line(), Err(FilterError::Eof { .. })));
    }

    #[test]
    fn unread_line_is_replayed() {
        let mut r = ByteReader::new(Cursor::new(b"one\ntwo\n".to_vec()));
        let pos = r.position();
        let line = r.read_line().unwrap();
        r.unread_line(pos, line.clone());
        assert_eq!(r.read_line().unwrap(), line);
        assert_eq!(r.read_line().unwrap(), b"two\n");
    }
}
