//! SCRAM-SHA-1 and SCRAM-SHA-256 mechanisms (RFC 5802, RFC 7677), with the
//! `-PLUS` channel-binding variants (RFC 5929 tls-server-end-point).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::{Error, Mechanism, Result, Step};

/// Which SCRAM hash and binding mode to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScramVariant {
    /// SCRAM-SHA-1.
    Sha1,
    /// SCRAM-SHA-1-PLUS (requires channel binding).
    Sha1Plus,
    /// SCRAM-SHA-256.
    Sha256,
    /// SCRAM-SHA-256-PLUS (requires channel binding).
    Sha256Plus,
}

impl ScramVariant {
    /// The IANA mechanism name.
    #[must_use]
    pub const fn mechanism_name(self) -> &'static str {
        match self {
            Self::Sha1 => "SCRAM-SHA-1",
            Self::Sha1Plus => "SCRAM-SHA-1-PLUS",
            Self::Sha256 => "SCRAM-SHA-256",
            Self::Sha256Plus => "SCRAM-SHA-256-PLUS",
        }
    }

    /// Whether this variant mandates channel binding.
    #[must_use]
    pub const fn is_plus(self) -> bool {
        matches!(self, Self::Sha1Plus | Self::Sha256Plus)
    }
}

#[derive(Debug)]
enum State {
    Initial,
    SentFirst {
        bare: String,
        gs2: String,
    },
    SentFinal {
        server_signature: Vec<u8>,
    },
    Done,
}

/// SCRAM client state machine.
#[derive(Debug)]
pub struct Scram {
    variant: ScramVariant,
    username: String,
    password: String,
    nonce: String,
    channel_binding: Option<Vec<u8>>,
    state: State,
}

impl Scram {
    /// Creates a SCRAM mechanism with a freshly generated nonce.
    #[must_use]
    pub fn new(
        variant: ScramVariant,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            username: username.into(),
            password: password.into(),
            nonce: generate_nonce(24),
            channel_binding: None,
            state: State::Initial,
        }
    }

    /// Overrides the client nonce. Intended for verification against
    /// published test vectors.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Supplies the tls-server-end-point digest for `-PLUS` variants.
    #[must_use]
    pub fn channel_binding(mut self, data: Vec<u8>) -> Self {
        self.channel_binding = Some(data);
        self
    }

    fn gs2_header(&self) -> Result<String> {
        if self.variant.is_plus() {
            if self.channel_binding.is_none() {
                return Err(Error::ChannelBindingUnavailable);
            }
            Ok("p=tls-server-end-point,,".to_string())
        } else {
            Ok("n,,".to_string())
        }
    }

    fn client_first(&mut self) -> Result<Vec<u8>> {
        let gs2 = self.gs2_header()?;
        let bare = format!("n={},r={}", escape_username(&self.username), self.nonce);
        let message = format!("{gs2}{bare}");
        self.state = State::SentFirst { bare, gs2 };
        Ok(message.into_bytes())
    }

    fn client_final(&mut self, challenge: &[u8]) -> Result<Step> {
        let State::SentFirst { bare, gs2 } = std::mem::replace(&mut self.state, State::Done) else {
            return Err(Error::AlreadyAuthenticated);
        };

        let server_first = std::str::from_utf8(challenge)
            .map_err(|_| Error::InvalidChallenge("non-UTF-8 server-first-message".into()))?;
        let fields = parse_fields(server_first);

        let server_nonce = fields
            .iter()
            .find(|(k, _)| *k == "r")
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::IncompleteChallenge("missing r= nonce".into()))?;
        let salt_b64 = fields
            .iter()
            .find(|(k, _)| *k == "s")
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::IncompleteChallenge("missing s= salt".into()))?;
        let iterations: u32 = fields
            .iter()
            .find(|(k, _)| *k == "i")
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::IncompleteChallenge("missing i= count".into()))?
            .parse()
            .map_err(|_| Error::InvalidChallenge("non-numeric iteration count".into()))?;

        if !server_nonce.starts_with(&self.nonce) {
            return Err(Error::InvalidChallenge(
                "server nonce does not extend client nonce".into(),
            ));
        }

        let salt = STANDARD.decode(salt_b64)?;

        // cbind-input = gs2-header [ cbind-data ]
        let mut cbind_input = gs2.clone().into_bytes();
        if self.variant.is_plus() {
            let binding = self
                .channel_binding
                .as_ref()
                .ok_or(Error::ChannelBindingUnavailable)?;
            cbind_input.extend_from_slice(binding);
        }
        let channel = STANDARD.encode(&cbind_input);

        let final_without_proof = format!("c={channel},r={server_nonce}");
        let auth_message = format!("{bare},{server_first},{final_without_proof}");

        let keys = match self.variant {
            ScramVariant::Sha1 | ScramVariant::Sha1Plus => {
                derive_sha1(self.password.as_bytes(), &salt, iterations, &auth_message)
            }
            ScramVariant::Sha256 | ScramVariant::Sha256Plus => {
                derive_sha256(self.password.as_bytes(), &salt, iterations, &auth_message)
            }
        };

        let proof = STANDARD.encode(&keys.client_proof);
        self.state = State::SentFinal {
            server_signature: keys.server_signature,
        };
        Ok(Step::Response(
            format!("{final_without_proof},p={proof}").into_bytes(),
        ))
    }

    fn verify_server(&mut self, challenge: &[u8]) -> Result<Step> {
        let State::SentFinal { server_signature } = std::mem::replace(&mut self.state, State::Done)
        else {
            return Err(Error::AlreadyAuthenticated);
        };

        let text = std::str::from_utf8(challenge)
            .map_err(|_| Error::InvalidChallenge("non-UTF-8 server-final-message".into()))?;
        let fields = parse_fields(text);

        if let Some((_, err)) = fields.iter().find(|(k, _)| *k == "e") {
            return Err(Error::InvalidChallenge(format!("server error: {err}")));
        }

        let verifier = fields
            .iter()
            .find(|(k, _)| *k == "v")
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::IncompleteChallenge("missing v= signature".into()))?;
        let received = STANDARD.decode(verifier)?;

        if received == server_signature {
            Ok(Step::Done)
        } else {
            Err(Error::IncorrectHash)
        }
    }
}

impl Mechanism for Scram {
    fn name(&self) -> &'static str {
        self.variant.mechanism_name()
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        self.client_first().ok()
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        match self.state {
            State::Initial => self.client_first().map(Step::Response),
            State::SentFirst { .. } => self.client_final(challenge),
            State::SentFinal { .. } => self.verify_server(challenge),
            State::Done => Err(Error::AlreadyAuthenticated),
        }
    }
}

struct DerivedKeys {
    client_proof: Vec<u8>,
    server_signature: Vec<u8>,
}

macro_rules! scram_derive {
    ($fn_name:ident, $hmac_name:ident, $digest:ty) => {
        fn $hmac_name(key: &[u8], data: &[u8]) -> Vec<u8> {
            #[allow(clippy::expect_used)] // HMAC accepts keys of any length
            let mut mac = <Hmac<$digest> as Mac>::new_from_slice(key)
                .expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }

        fn $fn_name(password: &[u8], salt: &[u8], iterations: u32, auth: &str) -> DerivedKeys {
            let mut salted = vec![0u8; <$digest>::output_size()];
            pbkdf2::pbkdf2_hmac::<$digest>(password, salt, iterations, &mut salted);

            let client_key = $hmac_name(&salted, b"Client Key");
            let stored_key = <$digest>::digest(&client_key).to_vec();
            let client_signature = $hmac_name(&stored_key, auth.as_bytes());
            let client_proof: Vec<u8> = client_key
                .iter()
                .zip(client_signature.iter())
                .map(|(k, s)| k ^ s)
                .collect();

            let server_key = $hmac_name(&salted, b"Server Key");
            let server_signature = $hmac_name(&server_key, auth.as_bytes());

            DerivedKeys {
                client_proof,
                server_signature,
            }
        }
    };
}

scram_derive!(derive_sha1, hmac_sha1, Sha1);
scram_derive!(derive_sha256, hmac_sha256, Sha256);

/// Splits `k=v,k=v` attribute lists. Values may contain `=`.
fn parse_fields(message: &str) -> Vec<(&str, &str)> {
    message
        .split(',')
        .filter_map(|part| part.split_once('='))
        .collect()
}

/// RFC 5802 saslname escaping: `=` and `,` are encoded.
fn escape_username(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

/// Printable nonce characters per RFC 5802 (no comma).
fn generate_nonce(len: usize) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#$%&'()*+-./:;<=>?@[]^_`{|}~";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(CHARS[rng.gen_range(0..CHARS.len())]))
        .collect()
}
