//! Descriptor: a content-addressed reference to a blob or manifest.

use bon::Builder;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::digest::{digest_of, Digest};

/// The media type of the fixed empty JSON config every PyOCI manifest points at.
pub const EMPTY_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.empty.v1+json";

/// The bytes of the empty JSON config (`{}`), fixed by the OCI image spec.
pub const EMPTY_CONFIG_BYTES: &[u8] = b"{}";

/// The artifact type this crate publishes and expects to find on pull.
pub const ARTIFACT_TYPE: &str = "application/pyoci.package.v1";

/// `{digest, size, mediaType, urls?, annotations?, artifactType?, data?}`.
///
/// `data`, when present, carries the referenced bytes in memory so a push can proceed
/// without re-reading them and a pull doesn't need to re-fetch them once cached. It is
/// never serialized: see [`crate::oci::canonical_json`].
#[derive(Clone, Debug, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub digest: Digest,
    pub size: u64,
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub annotations: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub artifact_type: Option<String>,
    #[serde(skip)]
    #[builder(default)]
    pub data: Option<Bytes>,
}

impl Descriptor {
    /// Builds a descriptor for `bytes` under the given media type, carrying the bytes
    /// in memory so a subsequent push does not need to re-read them.
    pub fn for_bytes(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let digest = digest_of(&bytes);
        let size = bytes.len() as u64;
        Descriptor::builder()
            .media_type(media_type.into())
            .digest(digest)
            .size(size)
            .data(bytes)
            .build()
    }

    /// The fixed descriptor of the empty config every manifest in this crate uses.
    ///
    /// Matches the literal scenario: digest
    /// `sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a`, size 2.
    pub fn empty_config() -> Self {
        Descriptor::for_bytes(EMPTY_CONFIG_MEDIA_TYPE, EMPTY_CONFIG_BYTES)
    }

    /// Builds a layer descriptor: gzips `content` deterministically and records the
    /// `{artifact_type}+gzip` media type over it.
    pub fn layer(artifact_type: &str, content: &[u8]) -> crate::error::Result<Self> {
        let gzipped = crate::digest::gzip_deterministic(content)?;
        Ok(Descriptor::for_bytes(format!("{artifact_type}+gzip"), gzipped))
    }

    /// Pushes this descriptor's bytes to the registry, requiring `data` to be populated.
    #[tracing::instrument(skip(self, client), fields(digest = %self.digest))]
    pub async fn push(&self, name: &str, client: &crate::registry::RegistryClient) -> crate::error::Result<()> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| crate::error::Error::Transport("descriptor has no in-memory data to push".into()))?;
        client.push_blob(name, data, &self.digest).await
    }

    /// Pulls this descriptor's bytes from the registry, caching them into `data`.
    #[tracing::instrument(skip(self, client), fields(digest = %self.digest))]
    pub async fn pull(&mut self, name: &str, client: &crate::registry::RegistryClient) -> crate::error::Result<&[u8]> {
        let bytes = client.pull_blob(name, &self.digest).await?;
        self.data = Some(bytes);
        Ok(self.data.as_deref().expect("just populated"))
    }
}
