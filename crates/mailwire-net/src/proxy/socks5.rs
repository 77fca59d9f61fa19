//! SOCKS5 tunnel handshake (RFC 1928, RFC 1929 auth).

use std::net::{Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ProxySettings;
use crate::{Error, Result};

const VERSION: u8 = 0x05;
const CMD_CONNECT: u8 = 0x01;
const METHOD_NONE: u8 = 0x00;
const METHOD_USER_PASS: u8 = 0x02;
const METHOD_UNACCEPTABLE: u8 = 0xFF;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Performs the SOCKS5 handshake: method negotiation, optional
/// username/password subnegotiation, CONNECT request, reply consumption.
pub(super) async fn handshake<S>(
    stream: &mut S,
    settings: &ProxySettings,
    host: &str,
    port: u16,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let have_credentials = settings.username.is_some() && settings.password.is_some();

    // Method negotiation.
    let methods: &[u8] = if have_credentials {
        &[METHOD_NONE, METHOD_USER_PASS]
    } else {
        &[METHOD_NONE]
    };
    let mut greeting = vec![VERSION, methods.len() as u8];
    greeting.extend_from_slice(methods);
    stream.write_all(&greeting).await?;
    stream.flush().await?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    if choice[0] != VERSION {
        return Err(Error::Protocol(format!(
            "unexpected SOCKS version {:#04x}",
            choice[0]
        )));
    }

    match choice[1] {
        METHOD_NONE => {}
        METHOD_USER_PASS => {
            subnegotiate_user_pass(stream, settings).await?;
        }
        METHOD_UNACCEPTABLE => return Err(Error::ProxyAuthFailed),
        other => {
            return Err(Error::Protocol(format!(
                "proxy selected unsupported method {other:#04x}"
            )));
        }
    }

    // CONNECT request.
    let mut request = vec![VERSION, CMD_CONNECT, 0x00];
    if let Ok(v4) = host.parse::<Ipv4Addr>() {
        request.push(ATYP_IPV4);
        request.extend_from_slice(&v4.octets());
    } else if let Ok(v6) = host.parse::<Ipv6Addr>() {
        request.push(ATYP_IPV6);
        request.extend_from_slice(&v6.octets());
    } else {
        let name = host.as_bytes();
        if name.len() > 255 {
            return Err(Error::UnsupportedAddressType);
        }
        request.push(ATYP_DOMAIN);
        request.push(name.len() as u8);
        request.extend_from_slice(name);
    }
    request.extend_from_slice(&port.to_be_bytes());

    stream.write_all(&request).await?;
    stream.flush().await?;

    // Reply: VER REP RSV ATYP BND.ADDR BND.PORT
    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    if head[0] != VERSION {
        return Err(Error::Protocol(format!(
            "unexpected SOCKS version {:#04x} in reply",
            head[0]
        )));
    }
    if head[1] != 0x00 {
        return Err(Error::Socks5Rejected(head[1]));
    }

    // Consume the bound address.
    match head[3] {
        ATYP_IPV4 => {
            let mut addr = [0u8; 4];
            stream.read_exact(&mut addr).await?;
        }
        ATYP_IPV6 => {
            let mut addr = [0u8; 16];
            stream.read_exact(&mut addr).await?;
        }
        ATYP_DOMAIN => {
            let len = stream.read_u8().await?;
            let mut addr = vec![0u8; usize::from(len)];
            stream.read_exact(&mut addr).await?;
        }
        other => {
            return Err(Error::Protocol(format!(
                "unknown address type {other:#04x} in reply"
            )));
        }
    }
    let mut bound_port = [0u8; 2];
    stream.read_exact(&mut bound_port).await?;

    Ok(())
}

/// RFC 1929 username/password subnegotiation.
async fn subnegotiate_user_pass<S>(stream: &mut S, settings: &ProxySettings) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Some(user), Some(pass)) = (&settings.username, &settings.password) else {
        return Err(Error::ProxyAuthFailed);
    };
    if user.len() > 255 || pass.len() > 255 {
        return Err(Error::ProxyAuthFailed);
    }

    let mut auth = vec![0x01, user.len() as u8];
    auth.extend_from_slice(user.as_bytes());
    auth.push(pass.len() as u8);
    auth.extend_from_slice(pass.as_bytes());

    stream.write_all(&auth).await?;
    stream.flush().await?;

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await?;
    if reply[1] == 0x00 {
        Ok(())
    } else {
        Err(Error::ProxyAuthFailed)
    }
}
