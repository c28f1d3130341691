//! Content-addressing primitives: sha256 digests and deterministic gzip framing.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use derive_more::Debug;
use flate2::{Compression, GzBuilder};
use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// A `sha256:<hex>` content digest.
///
/// This is a pure function of the bytes it was computed from: two [`Digest`]s are equal
/// if and only if the bytes they were derived from are byte-identical.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[debug("{}", self.0)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Computes the digest of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("sha256:{}", sha256_hex(bytes)))
    }

    /// The hex-encoded sha256 sum, without the `sha256:` prefix.
    pub fn as_hex(&self) -> &str {
        self.0
            .strip_prefix("sha256:")
            .expect("Digest always carries the sha256: prefix")
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(hex) = s.strip_prefix("sha256:") else {
            return Err(Error::Transport(format!("unsupported digest algorithm: {s}")));
        };
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Transport(format!("malformed digest: {s}")));
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.0
    }
}

/// Computes the lowercase hex-encoded sha256 sum of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Computes the `sha256:<hex>` digest of `bytes`.
pub fn digest_of(bytes: &[u8]) -> Digest {
    Digest::of(bytes)
}

/// Gzip-compresses `bytes` with the modification time fixed to zero and no embedded
/// filename, so the output is a pure function of the input.
///
/// Any other path to gzip compression in this crate is a bug: it would make published
/// layer digests drift across otherwise-identical republishes.
pub fn gzip_deterministic(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzBuilder::new().mtime(0).write(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Decompresses bytes produced by [`gzip_deterministic`] (or any standard gzip stream).
pub fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
