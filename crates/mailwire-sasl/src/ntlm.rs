//! NTLM mechanism (NTLMv2 responses).
//!
//! Three-leg exchange: the client sends a Type 1 negotiate message, the
//! server answers with a Type 2 challenge, and the client finishes with a
//! Type 3 authenticate message carrying NTLMv2 proof values.

use hmac::{Hmac, Mac};
use md4::Md4;
use md5::{Digest, Md5};
use rand::RngCore;

use crate::{Error, Mechanism, Result, Step};

type HmacMd5 = Hmac<Md5>;

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SECURITY: u32 = 0x0008_0000;

/// Seconds between the Windows epoch (1601) and the Unix epoch (1970).
const FILETIME_UNIX_OFFSET: u64 = 11_644_473_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    SentNegotiate,
    Done,
}

/// NTLM client state machine producing v2 responses.
#[derive(Debug)]
pub struct Ntlm {
    username: String,
    password: String,
    domain: String,
    workstation: String,
    /// Injected for deterministic tests; otherwise random.
    client_challenge: Option<[u8; 8]>,
    /// Injected for deterministic tests; otherwise taken from the clock.
    timestamp: Option<u64>,
    state: State,
}

impl Ntlm {
    /// Creates an NTLM mechanism.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: String::new(),
            workstation: String::new(),
            client_challenge: None,
            timestamp: None,
            state: State::Initial,
        }
    }

    /// Sets the NT domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Fixes the client challenge (testing).
    #[must_use]
    pub const fn client_challenge(mut self, challenge: [u8; 8]) -> Self {
        self.client_challenge = Some(challenge);
        self
    }

    /// Fixes the FILETIME timestamp (testing).
    #[must_use]
    pub const fn timestamp(mut self, filetime: u64) -> Self {
        self.timestamp = Some(filetime);
        self
    }

    fn negotiate_message(&self) -> Vec<u8> {
        let flags = NEGOTIATE_UNICODE
            | REQUEST_TARGET
            | NEGOTIATE_NTLM
            | NEGOTIATE_ALWAYS_SIGN
            | NEGOTIATE_EXTENDED_SECURITY;

        let mut msg = Vec::with_capacity(32);
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&1u32.to_le_bytes());
        msg.extend_from_slice(&flags.to_le_bytes());
        // Empty domain and workstation security buffers.
        msg.extend_from_slice(&security_buffer(0, 32));
        msg.extend_from_slice(&security_buffer(0, 32));
        msg
    }

    fn authenticate_message(&self, challenge: &[u8]) -> Result<Vec<u8>> {
        let parsed = parse_challenge(challenge)?;

        let v2_hash = ntlmv2_hash(&self.username, &self.password, &self.domain);

        let client_challenge = self.client_challenge.unwrap_or_else(|| {
            let mut nonce = [0u8; 8];
            rand::thread_rng().fill_bytes(&mut nonce);
            nonce
        });
        let filetime = self.timestamp.unwrap_or_else(current_filetime);

        // temp blob: version, reserved, timestamp, client nonce, target info.
        let mut blob = Vec::new();
        blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]);
        blob.extend_from_slice(&[0u8; 4]);
        blob.extend_from_slice(&filetime.to_le_bytes());
        blob.extend_from_slice(&client_challenge);
        blob.extend_from_slice(&[0u8; 4]);
        blob.extend_from_slice(&parsed.target_info);
        blob.extend_from_slice(&[0u8; 4]);

        let nt_proof = hmac_md5(&v2_hash, &[&parsed.server_challenge[..], &blob].concat());
        let mut nt_response = nt_proof;
        nt_response.extend_from_slice(&blob);

        let lm_proof = hmac_md5(
            &v2_hash,
            &[&parsed.server_challenge[..], &client_challenge[..]].concat(),
        );
        let mut lm_response = lm_proof;
        lm_response.extend_from_slice(&client_challenge);

        let domain = utf16le(&self.domain);
        let user = utf16le(&self.username);
        let workstation = utf16le(&self.workstation);

        // Header: 64 bytes, then payload in a fixed order.
        let header_len = 64u32;
        let domain_off = header_len;
        let user_off = domain_off + domain.len() as u32;
        let workstation_off = user_off + user.len() as u32;
        let lm_off = workstation_off + workstation.len() as u32;
        let nt_off = lm_off + lm_response.len() as u32;
        let session_key_off = nt_off + nt_response.len() as u32;

        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&3u32.to_le_bytes());
        msg.extend_from_slice(&buffer_for(&lm_response, lm_off));
        msg.extend_from_slice(&buffer_for(&nt_response, nt_off));
        msg.extend_from_slice(&buffer_for(&domain, domain_off));
        msg.extend_from_slice(&buffer_for(&user, user_off));
        msg.extend_from_slice(&buffer_for(&workstation, workstation_off));
        msg.extend_from_slice(&security_buffer(0, session_key_off));
        msg.extend_from_slice(&parsed.flags.to_le_bytes());

        msg.extend_from_slice(&domain);
        msg.extend_from_slice(&user);
        msg.extend_from_slice(&workstation);
        msg.extend_from_slice(&lm_response);
        msg.extend_from_slice(&nt_response);
        Ok(msg)
    }
}

impl Mechanism for Ntlm {
    fn name(&self) -> &'static str {
        "NTLM"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        self.state = State::SentNegotiate;
        Some(self.negotiate_message())
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        match self.state {
            State::Initial => {
                self.state = State::SentNegotiate;
                Ok(Step::Response(self.negotiate_message()))
            }
            State::SentNegotiate => {
                let msg = self.authenticate_message(challenge)?;
                self.state = State::Done;
                Ok(Step::Response(msg))
            }
            State::Done => Err(Error::AlreadyAuthenticated),
        }
    }
}

struct Challenge {
    server_challenge: [u8; 8],
    target_info: Vec<u8>,
    flags: u32,
}

/// Parses a Type 2 challenge message.
fn parse_challenge(data: &[u8]) -> Result<Challenge> {
    if data.len() < 48 {
        return Err(Error::IncompleteChallenge("NTLM Type 2 too short".into()));
    }
    if &data[..8] != SIGNATURE {
        return Err(Error::InvalidChallenge("missing NTLMSSP signature".into()));
    }
    let msg_type = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    if msg_type != 2 {
        return Err(Error::InvalidChallenge(format!(
            "expected Type 2, got {msg_type}"
        )));
    }

    let flags = u32::from_le_bytes([data[20], data[21], data[22], data[23]]);
    let mut server_challenge = [0u8; 8];
    server_challenge.copy_from_slice(&data[24..32]);

    let info_len = usize::from(u16::from_le_bytes([data[40], data[41]]));
    let info_off = u32::from_le_bytes([data[44], data[45], data[46], data[47]]) as usize;
    let target_info = if info_len == 0 {
        Vec::new()
    } else {
        data.get(info_off..info_off + info_len)
            .ok_or_else(|| Error::InvalidChallenge("target info out of bounds".into()))?
            .to_vec()
    };

    Ok(Challenge {
        server_challenge,
        target_info,
        flags,
    })
}

/// `NTOWFv2`: HMAC-MD5 over `UPPER(user) + domain` keyed by the NT hash.
fn ntlmv2_hash(username: &str, password: &str, domain: &str) -> Vec<u8> {
    let nt_hash = Md4::digest(utf16le(password));
    let identity = utf16le(&format!("{}{domain}", username.to_uppercase()));
    hmac_md5(&nt_hash, &identity)
}

fn hmac_md5(key: &[u8], data: &[u8]) -> Vec<u8> {
    #[allow(clippy::expect_used)] // HMAC accepts keys of any length
    let mut mac = HmacMd5::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Security buffer: length, allocated length, offset (all little-endian).
fn security_buffer(len: u32, offset: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    #[allow(clippy::cast_possible_truncation)]
    let len16 = len as u16;
    out[..2].copy_from_slice(&len16.to_le_bytes());
    out[2..4].copy_from_slice(&len16.to_le_bytes());
    out[4..8].copy_from_slice(&offset.to_le_bytes());
    out
}

fn buffer_for(payload: &[u8], offset: u32) -> [u8; 8] {
    #[allow(clippy::cast_possible_truncation)]
    security_buffer(payload.len() as u32, offset)
}

fn current_filetime() -> u64 {
    let unix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    (unix + FILETIME_UNIX_OFFSET) * 10_000_000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn type2_message(challenge: [u8; 8], target_info: &[u8]) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&2u32.to_le_bytes());
        // Target name buffer (empty, offset 48).
        msg.extend_from_slice(&security_buffer(0, 48));
        msg.extend_from_slice(&NEGOTIATE_UNICODE.to_le_bytes());
        msg.extend_from_slice(&challenge);
        msg.extend_from_slice(&[0u8; 8]); // context
        let info_off = 48u32;
        msg.extend_from_slice(&buffer_for(target_info, info_off));
        msg.extend_from_slice(target_info);
        msg
    }

    #[test]
    fn negotiate_message_shape() {
        let mut mech = Ntlm::new("user", "pass");
        let msg = mech.initial_response().unwrap();
        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes([msg[8], msg[9], msg[10], msg[11]]), 1);
        assert_eq!(msg.len(), 32);
    }

    #[test]
    fn full_exchange_produces_type3() {
        let mut mech = Ntlm::new("user", "SecREt01")
            .domain("DOMAIN")
            .client_challenge([0xAA; 8])
            .timestamp(0x0090_d336_b734_c301);

        let _ = mech.initial_response().unwrap();

        let challenge = type2_message([0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF], b"info");
        let Step::Response(msg) = mech.step(&challenge).unwrap() else {
            panic!("expected Type 3");
        };

        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes([msg[8], msg[9], msg[10], msg[11]]), 3);

        // NT response buffer: 16-byte proof + blob containing target info.
        let nt_len = usize::from(u16::from_le_bytes([msg[20], msg[21]]));
        let nt_off = u32::from_le_bytes([msg[24], msg[25], msg[26], msg[27]]) as usize;
        let nt = &msg[nt_off..nt_off + nt_len];
        assert!(nt.len() > 16 + 28);
        // Blob version marker after the proof.
        assert_eq!(&nt[16..20], &[0x01, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn deterministic_with_fixed_inputs() {
        let run = || {
            let mut mech = Ntlm::new("user", "pass")
                .client_challenge([1; 8])
                .timestamp(42);
            let _ = mech.initial_response();
            let challenge = type2_message([9; 8], b"ti");
            match mech.step(&challenge).unwrap() {
                Step::Response(m) => m,
                Step::Done => panic!("expected response"),
            }
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rejects_non_type2() {
        let mut mech = Ntlm::new("user", "pass");
        let _ = mech.initial_response();
        let mut bogus = type2_message([0; 8], b"");
        bogus[8] = 3;
        assert!(mech.step(&bogus).is_err());
    }

    #[test]
    fn rejects_short_challenge() {
        let mut mech = Ntlm::new("user", "pass");
        let _ = mech.initial_response();
        assert!(mech.step(b"NTLMSSP\0").is_err());
    }
}
