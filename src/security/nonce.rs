//! Per-request CSP nonce generation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Raw entropy per nonce (128 bits).
const NONCE_LEN: usize = 16;

/// Error produced when the OS random source cannot be read.
///
/// There is deliberately no fallback path: a request that cannot get a
/// cryptographically secure nonce is aborted rather than served with a
/// guessable one.
#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct NonceError(#[from] rand::Error);

/// A single-use CSP nonce, base64-encoded.
///
/// The same value is exposed to downstream renderers via the `x-nonce`
/// response header and embedded into the `Content-Security-Policy` string;
/// the two are always byte-identical for a given request.
#[derive(Clone, Debug)]
pub struct Nonce(String);

impl Nonce {
    /// Generate a fresh nonce from the OS random source.
    pub fn generate() -> Result<Self, NonceError> {
        let mut bytes = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(STANDARD.encode(bytes)))
    }

    /// The base64 value, suitable for header and CSP embedding.
    pub fn value(&self) -> &str {
        &self.0
    }
}
