//! Buffered line-oriented stream for the SMTP dialogue.

#![allow(clippy::missing_errors_doc)]

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

/// Maximum reply line length; longer lines indicate a confused peer.
const MAX_LINE_LENGTH: usize = 16 * 1024;

/// Buffered SMTP stream.
pub struct SmtpStream<S> {
    reader: BufReader<S>,
}

impl<S> SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    /// Reads one reply line, stripping the CRLF (bare LF tolerated).
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::ConnectionClosed);
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("reply line too long".into()));
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).map_err(|_| Error::Protocol("non-UTF-8 reply line".into()))
    }

    /// Writes bytes and flushes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Returns a mutable reference to the inner stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Returns the inner stream, discarding buffered data. Used around
    /// STARTTLS where the server is quiescent.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_crlf_lines() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 ready\r\n250 ok\r\n")
            .build();
        let mut stream = SmtpStream::new(mock);
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
        assert_eq!(stream.read_line().await.unwrap(), "250 ok");
    }

    #[tokio::test]
    async fn tolerates_bare_lf() {
        let mock = tokio_test::io::Builder::new().read(b"220 ready\n").build();
        let mut stream = SmtpStream::new(mock);
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
    }

    #[tokio::test]
    async fn eof_is_connection_closed() {
        let mock = tokio_test::io::Builder::new().build();
        let mut stream = SmtpStream::new(mock);
        assert!(matches!(
            stream.read_line().await.unwrap_err(),
            Error::ConnectionClosed
        ));
    }
}
