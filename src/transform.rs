//! Payload transforms applied before the envelope is built.
//!
//! The transmitted envelope only records a mime label; this module maps the
//! labels it knows to their operations:
//! - `text/plain`: UTF-8 bytes as-is
//! - `application/gzip`: gzip
//! - `application/gzip+chacha20poly1305`: gzip, then ChaCha20-Poly1305 with a
//!   key derived from a passphrase via HKDF-SHA256
//!
//! Labels it does not know are carried through untouched and decoded as
//! plain UTF-8 on the receiving side.

use std::fmt;
use std::io::{Read, Write};

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

/// Label for untransformed text.
pub const MIME_PLAIN: &str = "text/plain";

/// Label for gzip-compressed text.
pub const MIME_GZIP: &str = "application/gzip";

/// Label for gzip-compressed, passphrase-encrypted text.
pub const MIME_GZIP_AEAD: &str = "application/gzip+chacha20poly1305";

/// HKDF info string for passphrase key derivation.
const HKDF_INFO: &[u8] = b"DUOQR-PAYLOAD-AEAD";

/// HKDF salt (fixed so sender and receiver derive the same key).
const HKDF_SALT: &[u8] = b"DUOQR-PAYLOAD-SALT-V1";

/// Nonce size for ChaCha20Poly1305.
const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
const TAG_SIZE: usize = 16;

/// Errors that can occur while applying or reversing a transform.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Unknown transform: {0}. Use: plain, gzip, or gzip-aead")]
    UnknownTransform(String),

    #[error("Transform '{0}' requires a passphrase")]
    MissingPassphrase(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("Key derivation failed")]
    KeyDerivationFailed,

    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A reversible payload transform.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Transform {
    /// UTF-8 bytes, no change.
    #[default]
    Plain,
    /// Gzip compression.
    Gzip,
    /// Gzip compression followed by passphrase encryption.
    GzipAead { passphrase: String },
    /// A label this crate does not implement; bytes pass through.
    Opaque(String),
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::Gzip => f.write_str("Gzip"),
            Self::GzipAead { .. } => f.write_str("GzipAead { passphrase: <redacted> }"),
            Self::Opaque(label) => f.debug_tuple("Opaque").field(label).finish(),
        }
    }
}

impl Transform {
    /// Parses a CLI/config transform name (`plain`, `gzip`, `gzip-aead`).
    pub fn from_name(name: &str, passphrase: Option<&str>) -> Result<Self, TransformError> {
        match name.trim().to_lowercase().as_str() {
            "plain" | "none" => Ok(Self::Plain),
            "gzip" => Ok(Self::Gzip),
            "gzip-aead" | "aead" => passphrase
                .map(|p| Self::GzipAead {
                    passphrase: p.to_string(),
                })
                .ok_or_else(|| TransformError::MissingPassphrase(MIME_GZIP_AEAD.to_string())),
            _ => Err(TransformError::UnknownTransform(name.to_string())),
        }
    }

    /// Resolves the transform named by an envelope's mime label.
    pub fn from_mime(label: &str, passphrase: Option<&str>) -> Result<Self, TransformError> {
        match label {
            MIME_PLAIN => Ok(Self::Plain),
            MIME_GZIP => Ok(Self::Gzip),
            MIME_GZIP_AEAD => passphrase
                .map(|p| Self::GzipAead {
                    passphrase: p.to_string(),
                })
                .ok_or_else(|| TransformError::MissingPassphrase(label.to_string())),
            other => Ok(Self::Opaque(other.to_string())),
        }
    }

    /// Mime label recorded in the envelope.
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Plain => MIME_PLAIN,
            Self::Gzip => MIME_GZIP,
            Self::GzipAead { .. } => MIME_GZIP_AEAD,
            Self::Opaque(label) => label,
        }
    }

    /// Turns the payload text into the bytes that get base64-encoded.
    pub fn apply(&self, payload: &str) -> Result<Vec<u8>, TransformError> {
        match self {
            Self::Plain | Self::Opaque(_) => Ok(payload.as_bytes().to_vec()),
            Self::Gzip => gzip(payload.as_bytes()),
            Self::GzipAead { passphrase } => {
                let compressed = gzip(payload.as_bytes())?;
                encrypt(&compressed, passphrase)
            }
        }
    }

    /// Recovers the payload text from received bytes.
    pub fn reverse(&self, bytes: &[u8]) -> Result<String, TransformError> {
        let plain = match self {
            Self::Plain | Self::Opaque(_) => bytes.to_vec(),
            Self::Gzip => gunzip(bytes)?,
            Self::GzipAead { passphrase } => gunzip(&decrypt(bytes, passphrase)?)?,
        };
        Ok(String::from_utf8(plain)?)
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, TransformError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| TransformError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| TransformError::CompressionFailed(e.to_string()))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>, TransformError> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| TransformError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

/// Derives a 256-bit key from a passphrase.
fn derive_key(passphrase: &str) -> Result<[u8; 32], TransformError> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), passphrase.as_bytes());
    let mut key = [0u8; 32];
    hk.expand(HKDF_INFO, &mut key)
        .map_err(|_| TransformError::KeyDerivationFailed)?;
    Ok(key)
}

/// Output format: nonce (12 bytes) || ciphertext (includes auth tag)
fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>, TransformError> {
    let mut key = derive_key(passphrase)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key);
    key.zeroize();
    let cipher = cipher.map_err(|e| TransformError::EncryptionFailed(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| TransformError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

fn decrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>, TransformError> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(TransformError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);

    let mut key = derive_key(passphrase)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key);
    key.zeroize();
    let cipher = cipher.map_err(|e| TransformError::DecryptionFailed(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| TransformError::DecryptionFailed(e.to_string()))
}
