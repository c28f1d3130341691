//! Index (a.k.a. image index, manifest list): groups per-architecture manifests for
//! a single published version.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::digest::Digest;
use crate::error::Result;
use crate::oci::canonical_json;
use crate::oci::descriptor::{Descriptor, ARTIFACT_TYPE};
use crate::oci::manifest::Manifest;
use crate::oci::platform::{Platform, PlatformDescriptor};
use crate::registry::RegistryClient;

pub const MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";

/// `{schemaVersion=2, mediaType, artifactType, manifests: [PlatformDescriptor]}`.
///
/// Invariant: `platform.architecture` is unique across `manifests`. While a publish is
/// in progress the index additionally owns, in memory only, the [`Manifest`] each entry
/// was built from, so [`Index::push`] can push manifests before the index itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub schema_version: u32,
    pub media_type: String,
    pub artifact_type: String,
    pub manifests: Vec<PlatformDescriptor>,

    #[serde(skip)]
    pending: HashMap<Digest, Manifest>,
    #[serde(skip)]
    name: String,
    #[serde(skip)]
    reference: String,
}

impl Index {
    /// A fresh, empty index for `(name, reference)`.
    pub fn empty(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            schema_version: 2,
            media_type: MEDIA_TYPE.to_string(),
            artifact_type: ARTIFACT_TYPE.to_string(),
            manifests: Vec::new(),
            pending: HashMap::new(),
            name: name.into(),
            reference: reference.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Adds (or idempotently replaces) the manifest for `platform.architecture`.
    ///
    /// - No existing entry for this architecture: appended.
    /// - Existing entry with the same digest: replaced in place (a no-op in substance).
    /// - Existing entry with a different digest: replaced in place, with a warning —
    ///   republishing the same architecture of the same version is the user's intent.
    #[tracing::instrument(skip(self, manifest))]
    pub fn add_manifest(&mut self, manifest: Manifest, platform: Platform) -> Result<()> {
        let descriptor = manifest.descriptor()?;
        let digest = descriptor.digest.clone();
        let entry = PlatformDescriptor::new(descriptor, platform.clone());

        match self
            .manifests
            .iter()
            .position(|existing| existing.platform.architecture == platform.architecture)
        {
            None => {
                self.manifests.push(entry);
            }
            Some(idx) if self.manifests[idx].descriptor.digest == digest => {
                self.manifests[idx] = entry;
            }
            Some(idx) => {
                warn!(
                    architecture = %platform.architecture,
                    "architecture already present with different content, overwriting"
                );
                self.manifests[idx] = entry;
            }
        }

        self.pending.insert(digest, manifest);
        Ok(())
    }

    /// Pulls the index tagged `reference` for `name`. Any transport failure (most
    /// commonly "not found" on a first-time publish) is recovered as a fresh empty index:
    /// first publishes must not fail just because nothing has been published yet.
    #[tracing::instrument(skip(client))]
    pub async fn pull(name: &str, reference: &str, client: &RegistryClient) -> Self {
        match client.pull_manifest_raw(name, reference, MEDIA_TYPE).await {
            Ok(bytes) => match serde_json::from_slice::<Index>(&bytes) {
                Ok(mut index) => {
                    index.name = name.to_string();
                    index.reference = reference.to_string();
                    index
                }
                Err(err) => {
                    warn!(?err, "existing manifest at this reference is not a recognizable index, starting fresh");
                    Index::empty(name, reference)
                }
            },
            Err(err) => {
                warn!(?err, "no prior index found, starting fresh");
                Index::empty(name, reference)
            }
        }
    }

    /// Pushes every manifest still held in memory, then pushes the index itself tagged
    /// as `reference`.
    #[tracing::instrument(skip(self, client))]
    pub async fn push(&self, client: &RegistryClient) -> Result<()> {
        for manifest in self.pending.values() {
            manifest.push(&self.name, client).await?;
        }
        let bytes = canonical_json(self)?;
        client
            .push_manifest(&self.name, &bytes, MEDIA_TYPE, Some(&self.reference))
            .await
    }

    /// Finds the entry published for `architecture`, if any.
    pub fn find(&self, architecture: &str) -> Option<&PlatformDescriptor> {
        self.manifests
            .iter()
            .find(|entry| entry.platform.architecture == architecture)
    }
}
