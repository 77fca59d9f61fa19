//! SOCKS4 and SOCKS4a tunnel handshake.

use std::net::Ipv4Addr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ProxySettings;
use crate::{Error, Result};

const VERSION: u8 = 0x04;
const CMD_CONNECT: u8 = 0x01;
const REPLY_GRANTED: u8 = 0x5A;

/// Performs the SOCKS4 (or 4a) CONNECT handshake.
///
/// SOCKS4 proper only carries IPv4 literals; hostnames require the 4a
/// extension (destination `0.0.0.1` plus a trailing hostname).
pub(super) async fn handshake<S>(
    stream: &mut S,
    settings: &ProxySettings,
    host: &str,
    port: u16,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ipv4: Option<Ipv4Addr> = host.parse().ok();
    if ipv4.is_none() && !settings.socks4a {
        return Err(Error::UnsupportedAddressType);
    }

    let mut request = vec![VERSION, CMD_CONNECT];
    request.extend_from_slice(&port.to_be_bytes());
    match ipv4 {
        Some(addr) => request.extend_from_slice(&addr.octets()),
        // 4a marker address 0.0.0.x (x nonzero)
        None => request.extend_from_slice(&[0, 0, 0, 1]),
    }
    if let Some(user) = &settings.username {
        request.extend_from_slice(user.as_bytes());
    }
    request.push(0x00);
    if ipv4.is_none() {
        request.extend_from_slice(host.as_bytes());
        request.push(0x00);
    }

    stream.write_all(&request).await?;
    stream.flush().await?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await?;

    match reply[1] {
        REPLY_GRANTED => Ok(()),
        code => Err(Error::Socks4Rejected(code)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::proxy::ProxyKind;

    fn settings() -> ProxySettings {
        ProxySettings::new(ProxyKind::Socks4, "proxy.example.com", 1080)
    }

    #[tokio::test]
    async fn ipv4_connect_granted() {
        let mut mock = tokio_test::io::Builder::new()
            .write(&[0x04, 0x01, 0x03, 0xE1, 10, 0, 0, 5, 0x00])
            .read(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0])
            .build();

        handshake(&mut mock, &settings(), "10.0.0.5", 993)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn hostname_without_4a_fails() {
        let mut mock = tokio_test::io::Builder::new().build();
        let err = handshake(&mut mock, &settings(), "mail.example.com", 993)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAddressType));
    }

    #[tokio::test]
    async fn hostname_with_4a() {
        let mut expected = vec![0x04, 0x01, 0x00, 110, 0, 0, 0, 1];
        expected.extend_from_slice(b"alice");
        expected.push(0x00);
        expected.extend_from_slice(b"pop.example.com");
        expected.push(0x00);

        let mut mock = tokio_test::io::Builder::new()
            .write(&expected)
            .read(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0])
            .build();

        let settings = settings().socks4a(true).credentials("alice", "unused");
        handshake(&mut mock, &settings, "pop.example.com", 110)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejection_code_surfaces() {
        let mut mock = tokio_test::io::Builder::new()
            .write(&[0x04, 0x01, 0x00, 25, 127, 0, 0, 1, 0x00])
            .read(&[0x00, 0x5B, 0, 0, 0, 0, 0, 0])
            .build();

        let err = handshake(&mut mock, &settings(), "127.0.0.1", 25)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Socks4Rejected(0x5B)));
    }
}
