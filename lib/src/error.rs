//! Error types shared by every component of this crate.

use crate::digest::Digest;

/// Errors that can occur while parsing, building, or pushing/pulling PyOCI artifacts.
///
/// Every variant here is surfaced to the caller except when explicitly noted otherwise
/// (see [`crate::oci::Index::pull`], which recovers a "not found" response into an empty index
/// rather than returning [`Error::Transport`]).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The provided filename does not match the sdist or wheel grammar.
    #[error("invalid package filename: {0}")]
    InvalidName(String),

    /// The provided architecture string matches neither `.tar.gz` nor the wheel tail grammar.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// The registry demanded authentication but no credentials were configured.
    #[error("registry requires authentication but no credentials were provided")]
    Authentication,

    /// An HTTP request to the registry failed or returned an unexpected non-success status.
    #[error("registry transport error: {0}")]
    Transport(String),

    /// No manifest in the index matched the requested architecture.
    #[error("no published artifact for architecture {architecture:?} of {name}:{reference}")]
    UnknownPackage {
        name: String,
        reference: String,
        architecture: String,
    },

    /// The manifest found does not carry the PyOCI artifact type.
    #[error("manifest {digest} has foreign artifact type {found:?}, expected {expected:?}")]
    UnknownArtifactType {
        digest: Digest,
        found: String,
        expected: &'static str,
    },

    /// Underlying I/O failure (reading a local package file, writing output, etc).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to (de)serialize a descriptor, manifest, or index.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
