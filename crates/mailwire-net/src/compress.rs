//! Raw-DEFLATE stream wrapper for COMPRESS=DEFLATE (RFC 4978).
//!
//! Both directions use raw deflate (no zlib header). The write side
//! sync-flushes after every write so command boundaries reach the server
//! without waiting for the compressor window to fill.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Buffer growth step for the compressor output.
const CHUNK: usize = 8 * 1024;

/// A stream that deflates written bytes and inflates read bytes.
pub struct DeflateStream<S> {
    inner: S,
    comp: Compress,
    decomp: Decompress,
    /// Compressed bytes read from the peer, not yet inflated.
    read_in: Vec<u8>,
    read_in_pos: usize,
    /// Inflated bytes not yet handed to the caller.
    read_out: Vec<u8>,
    read_out_pos: usize,
    /// Deflated bytes not yet written to the peer.
    write_out: Vec<u8>,
    write_out_pos: usize,
    read_eof: bool,
}

impl<S> DeflateStream<S> {
    /// Wraps `inner` with raw DEFLATE in both directions.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            comp: Compress::new(Compression::default(), false),
            decomp: Decompress::new(false),
            read_in: Vec::new(),
            read_in_pos: 0,
            read_out: Vec::new(),
            read_out_pos: 0,
            write_out: Vec::new(),
            write_out_pos: 0,
            read_eof: false,
        }
    }

    /// Returns a reference to the wrapped stream.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped stream.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Inflates buffered input into `read_out`. Returns true if any
    /// plaintext was produced.
    fn inflate_buffered(&mut self) -> io::Result<bool> {
        let mut produced = false;
        while self.read_in_pos < self.read_in.len() {
            let before_in = self.decomp.total_in();
            let before_out = self.decomp.total_out();

            if self.read_out.len() == self.read_out.capacity() {
                self.read_out.reserve(CHUNK);
            }
            let status = self
                .decomp
                .decompress_vec(
                    &self.read_in[self.read_in_pos..],
                    &mut self.read_out,
                    FlushDecompress::None,
                )
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            let consumed = usize::try_from(self.decomp.total_in() - before_in)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.read_in_pos += consumed;
            produced |= self.decomp.total_out() > before_out;

            match status {
                Status::Ok => {
                    if consumed == 0 && self.decomp.total_out() == before_out {
                        break;
                    }
                }
                Status::BufError => {
                    // Needs more input or more output space; output space is
                    // grown above, so stop when no progress was made.
                    if consumed == 0 && self.decomp.total_out() == before_out {
                        break;
                    }
                }
                Status::StreamEnd => break,
            }
        }

        if self.read_in_pos >= self.read_in.len() {
            self.read_in.clear();
            self.read_in_pos = 0;
        }

        Ok(produced)
    }

    /// Deflates `data` into the pending write buffer with a sync flush.
    fn deflate_input(&mut self, data: &[u8]) -> io::Result<()> {
        let mut consumed = 0;
        loop {
            let before_in = self.comp.total_in();
            if self.write_out.len() == self.write_out.capacity() {
                self.write_out.reserve(CHUNK);
            }
            let status = self
                .comp
                .compress_vec(&data[consumed..], &mut self.write_out, FlushCompress::Sync)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            consumed += usize::try_from(self.comp.total_in() - before_in)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            match status {
                Status::Ok if consumed >= data.len() => return Ok(()),
                Status::Ok | Status::BufError => {
                    self.write_out.reserve(CHUNK);
                }
                Status::StreamEnd => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "unexpected deflate stream end",
                    ));
                }
            }
        }
    }
}

impl<S> DeflateStream<S>
where
    S: AsyncWrite + Unpin,
{
    /// Writes as much pending compressed output as the inner stream accepts.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.write_out_pos < self.write_out.len() {
            let n = std::task::ready!(
                Pin::new(&mut self.inner).poll_write(cx, &self.write_out[self.write_out_pos..])
            )?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.write_out_pos += n;
        }
        self.write_out.clear();
        self.write_out_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<S> AsyncRead for DeflateStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            // Hand out previously inflated bytes first.
            if this.read_out_pos < this.read_out.len() {
                let available = &this.read_out[this.read_out_pos..];
                let n = available.len().min(buf.remaining());
                buf.put_slice(&available[..n]);
                this.read_out_pos += n;
                if this.read_out_pos >= this.read_out.len() {
                    this.read_out.clear();
                    this.read_out_pos = 0;
                }
                return Poll::Ready(Ok(()));
            }

            if this.inflate_buffered()? {
                continue;
            }

            if this.read_eof {
                return Poll::Ready(Ok(()));
            }

            // Need more compressed input.
            let mut raw = [0u8; CHUNK];
            let mut raw_buf = ReadBuf::new(&mut raw);
            std::task::ready!(Pin::new(&mut this.inner).poll_read(cx, &mut raw_buf))?;
            if raw_buf.filled().is_empty() {
                this.read_eof = true;
                return Poll::Ready(Ok(()));
            }
            this.read_in.extend_from_slice(raw_buf.filled());
        }
    }
}

impl<S> AsyncWrite for DeflateStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        // Only accept new plaintext once the previous compressed batch is out.
        std::task::ready!(this.poll_drain(cx))?;

        this.deflate_input(buf)?;
        // Opportunistic drain; completion is driven by poll_flush.
        let _ = this.poll_drain(cx)?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        std::task::ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        std::task::ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

impl<S> std::fmt::Debug for DeflateStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateStream")
            .field("pending_read", &(self.read_out.len() - self.read_out_pos))
            .field(
                "pending_write",
                &(self.write_out.len() - self.write_out_pos),
            )
            .finish_non_exhaustive()
    }
}
