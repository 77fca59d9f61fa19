//! Framed I/O for the IMAP protocol.
//!
//! IMAP responses are CRLF-terminated lines that may carry `{n}` literals:
//! a byte count announced at the end of a line, followed by exactly `n` raw
//! bytes, followed by more line text. The framer reassembles one logical
//! server message at a time and only hands it to the parser when complete.

#![allow(clippy::missing_errors_doc)]

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::Result;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// One logical server message: line text (with `{n}` markers left in
/// place) plus the collected literal payloads in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMessage {
    /// The line text, including any interior CRLFs that preceded literals.
    pub line: Vec<u8>,
    /// Literal payloads, one per `{n}` marker in `line`.
    pub literals: Vec<Bytes>,
}

impl LiteralMessage {
    /// Reassembles the message with literal bytes inline after their
    /// `{n}` markers, the form the response parser consumes.
    #[must_use]
    pub fn flattened(&self) -> Vec<u8> {
        if self.literals.is_empty() {
            return self.line.clone();
        }

        let mut out = Vec::with_capacity(
            self.line.len() + self.literals.iter().map(Bytes::len).sum::<usize>(),
        );
        let mut literals = self.literals.iter();
        for segment in split_after_literal_markers(&self.line) {
            out.extend_from_slice(segment);
            if segment_ends_with_marker(segment) {
                if let Some(literal) = literals.next() {
                    out.extend_from_slice(literal);
                }
            }
        }
        out
    }
}

/// Splits line text into segments, each ending right after a literal
/// marker's CRLF (or at end of input).
fn split_after_literal_markers(line: &[u8]) -> Vec<&[u8]> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while pos < line.len() {
        if line[pos] == b'\n' {
            let segment = &line[start..=pos];
            if segment_ends_with_marker(segment) {
                segments.push(segment);
                start = pos + 1;
            }
        }
        pos += 1;
    }
    if start < line.len() {
        segments.push(&line[start..]);
    }
    segments
}

fn segment_ends_with_marker(segment: &[u8]) -> bool {
    parse_literal_length(segment).is_some()
}

/// Framed connection for the IMAP protocol.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
        }
    }

    /// Reads one complete logical message, collecting `{n}` literals.
    pub async fn read_message(&mut self) -> Result<LiteralMessage> {
        let mut line = Vec::new();
        let mut literals = Vec::new();

        loop {
            let segment = self.read_line().await?;
            line.extend_from_slice(&segment);

            let Some(literal_len) = parse_literal_length(&segment) else {
                break;
            };
            if literal_len > MAX_LITERAL_SIZE {
                return Err(crate::Error::Protocol(format!(
                    "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let mut literal = vec![0u8; literal_len];
            self.reader.read_exact(&mut literal).await?;
            literals.push(Bytes::from(literal));
            // Continuation text follows the literal; loop for more.
        }

        Ok(LiteralMessage { line, literals })
    }

    /// Reads a single line. CRLF is canonical; bare LF is tolerated.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(crate::Error::ConnectionClosed);
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(crate::Error::Protocol("line too long".to_string()));
            }
        }

        Ok(line)
    }

    /// Writes a command line to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Writes raw bytes (literal payloads, IDLE `DONE`).
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Any buffered unread data is lost; callers resynchronize after
    /// in-place TLS or compression upgrades where the server is quiescent.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Parses a literal length from the end of a line.
///
/// Matches `{n}` or `{n+}` (LITERAL+) immediately before the line ending.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    } else {
        return None;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    let line = &line[..end];

    if !line.ends_with(b"}") {
        return None;
    }
    let open = line.iter().rposition(|&b| b == b'{')?;
    let mut digits = &line[open + 1..line.len() - 1];
    if digits.ends_with(b"+") {
        digits = &digits[..digits.len() - 1];
    }
    if digits.is_empty() {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
