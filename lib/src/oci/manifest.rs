//! Manifest: an OCI image manifest wrapping a single gzipped package file.

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::oci::canonical_json;
use crate::oci::descriptor::{Descriptor, ARTIFACT_TYPE};
use crate::registry::RegistryClient;

pub const MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// `{schemaVersion=2, mediaType, artifactType, config, layers, subject?, annotations?}`.
///
/// In this crate `config` is always [`Descriptor::empty_config`] and `layers` always
/// has exactly one element: the package file, gzipped.
#[derive(Clone, Debug, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[builder(default = 2)]
    pub schema_version: u32,
    #[builder(default = MEDIA_TYPE.to_string())]
    pub media_type: String,
    #[builder(default = ARTIFACT_TYPE.to_string())]
    pub artifact_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub subject: Option<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub annotations: Option<HashMap<String, String>>,
}

impl Manifest {
    /// Builds the manifest for a single package file: fixed empty config, one gzipped layer.
    pub fn for_package(content: &[u8]) -> Result<Self> {
        let layer = Descriptor::layer(ARTIFACT_TYPE, content)?;
        Ok(Manifest::builder()
            .config(Descriptor::empty_config())
            .layers(vec![layer])
            .build())
    }

    /// The single package-file layer this manifest wraps.
    pub fn package_layer(&self) -> Option<&Descriptor> {
        self.layers.first()
    }

    /// Derives this manifest's own descriptor: its canonical JSON encoding's sha256 digest.
    pub fn descriptor(&self) -> Result<Descriptor> {
        let bytes = canonical_json(self)?;
        Ok(Descriptor::for_bytes(MEDIA_TYPE, bytes))
    }

    /// Loads a manifest from a descriptor: uses cached `data` if present, otherwise fetches it.
    #[tracing::instrument(skip(client))]
    pub async fn from_descriptor(name: &str, descriptor: &Descriptor, client: &RegistryClient) -> Result<Self> {
        let bytes = match &descriptor.data {
            Some(bytes) => bytes.clone(),
            None => {
                client
                    .pull_manifest_raw(name, &descriptor.digest.to_string(), &descriptor.media_type)
                    .await?
            }
        };
        serde_json::from_slice(&bytes).map_err(Error::from)
    }

    /// Pushes config, then every layer, then the manifest itself (addressed by digest).
    #[tracing::instrument(skip(self, client))]
    pub async fn push(&self, name: &str, client: &RegistryClient) -> Result<()> {
        self.config.push(name, client).await?;
        for layer in &self.layers {
            layer.push(name, client).await?;
        }
        let bytes = canonical_json(self)?;
        client.push_manifest(name, &bytes, MEDIA_TYPE, None).await
    }
}

/// A manifest's digest as computed by [`Manifest::descriptor`].
pub fn digest_of_manifest(manifest: &Manifest) -> Result<Digest> {
    Ok(manifest.descriptor()?.digest)
}
