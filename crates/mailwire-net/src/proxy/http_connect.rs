//! HTTP CONNECT tunnel handshake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::{ProxySettings, read_line};
use crate::{Error, Result};

/// Sends `CONNECT host:port` and consumes the reply header block.
///
/// Only a `200` status establishes the tunnel.
pub(super) async fn handshake<S>(
    stream: &mut S,
    settings: &ProxySettings,
    host: &str,
    port: u16,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n");

    if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
        let credentials = STANDARD.encode(format!("{user}:{pass}"));
        request.push_str(&format!("Proxy-Authorization: Basic {credentials}\r\n"));
    }
    for (name, value) in &settings.headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");

    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let status_line = read_line(stream, settings.max_reads).await?;
    let status = parse_status(&status_line)
        .ok_or_else(|| Error::Protocol(format!("malformed status line: {status_line}")))?;

    // Consume the remaining header block regardless of status.
    loop {
        let line = read_line(stream, settings.max_reads).await?;
        if line.is_empty() {
            break;
        }
    }

    match status {
        200 => Ok(()),
        407 => Err(Error::ProxyAuthFailed),
        other => Err(Error::HttpConnectFailed {
            status: other,
            text: status_line,
        }),
    }
}

/// Extracts the status code from `HTTP/1.x NNN reason`.
fn parse_status(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::proxy::ProxyKind;

    fn settings() -> ProxySettings {
        ProxySettings::new(ProxyKind::HttpConnect, "proxy.example.com", 8080)
    }

    #[test]
    fn status_parsing() {
        assert_eq!(parse_status("HTTP/1.1 200 Connection established"), Some(200));
        assert_eq!(parse_status("HTTP/1.0 407 Proxy Authentication Required"), Some(407));
        assert_eq!(parse_status("garbage"), None);
    }

    #[tokio::test]
    async fn successful_connect() {
        let mut mock = tokio_test::io::Builder::new()
            .write(b"CONNECT mail.example.com:993 HTTP/1.1\r\nHost: mail.example.com:993\r\n\r\n")
            .read(b"HTTP/1.1 200 Connection established\r\nVia: test\r\n\r\n")
            .build();

        handshake(&mut mock, &settings(), "mail.example.com", 993)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_connect() {
        let mut mock = tokio_test::io::Builder::new()
            .write(b"CONNECT mail.example.com:993 HTTP/1.1\r\nHost: mail.example.com:993\r\n\r\n")
            .read(b"HTTP/1.1 403 Forbidden\r\n\r\n")
            .build();

        let err = handshake(&mut mock, &settings(), "mail.example.com", 993)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HttpConnectFailed { status: 403, .. }));
    }

    #[tokio::test]
    async fn auth_header_and_custom_headers() {
        let mut mock = tokio_test::io::Builder::new()
            .write(
                b"CONNECT mail.example.com:143 HTTP/1.1\r\n\
                  Host: mail.example.com:143\r\n\
                  Proxy-Authorization: Basic dXNlcjpwYXNz\r\n\
                  X-Trace: 1\r\n\r\n",
            )
            .read(b"HTTP/1.1 200 OK\r\n\r\n")
            .build();

        let settings = settings().credentials("user", "pass").header("X-Trace", "1");
        handshake(&mut mock, &settings, "mail.example.com", 143)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn auth_required_maps_to_proxy_auth_failed() {
        let mut mock = tokio_test::io::Builder::new()
            .write(b"CONNECT h:1 HTTP/1.1\r\nHost: h:1\r\n\r\n")
            .read(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
            .build();

        let err = handshake(&mut mock, &settings(), "h", 1).await.unwrap_err();
        assert!(matches!(err, Error::ProxyAuthFailed));
    }
}
