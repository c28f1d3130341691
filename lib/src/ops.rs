//! Operations: publish, list, and pull — the orchestration layer over §4.A–§4.D.

use std::path::Path;

use tracing::info;

use crate::digest::gunzip;
use crate::error::{Error, Result};
use crate::oci::descriptor::ARTIFACT_TYPE;
use crate::oci::{Index, Manifest};
use crate::package::PackageIdentity;
use crate::registry::RegistryClient;

/// Publishes the package file at `path` under `namespace`.
///
/// Order is load-bearing: the layer and config blobs are pushed before the manifest
/// that references them, which is pushed before the index that references it — an
/// OCI registry will reject a manifest whose referenced blobs don't yet exist.
///
/// Concurrent publishes of the same `(name, reference)` are last-writer-wins on the
/// index tag; this crate does not implement compare-and-set. Callers needing
/// linearizable publishes must serialize at a higher layer.
#[tracing::instrument(skip(client))]
pub async fn publish(path: &Path, namespace: &str, client: &RegistryClient) -> Result<()> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidName(path.display().to_string()))?;
    let mut identity = PackageIdentity::parse(filename)?;
    identity.namespace = namespace.to_string();

    let content = std::fs::read(path)?;
    let manifest = Manifest::for_package(&content)?;

    let name = identity.oci_name();
    let reference = identity.oci_reference();
    let mut index = Index::pull(&name, &reference, client).await;
    index.add_manifest(manifest, identity.platform())?;
    index.push(client).await?;

    info!(name, reference, architecture = identity.architecture, "published package");
    Ok(())
}

/// Lists every published `PackageIdentity` for `name`: the cartesian product of tags
/// and the architectures published under each tag.
#[tracing::instrument(skip(client))]
pub async fn list(name: &str, namespace: &str, client: &RegistryClient) -> Result<Vec<PackageIdentity>> {
    let oci_name = if namespace.is_empty() {
        name.to_lowercase()
    } else {
        format!("{namespace}/{name}").to_lowercase()
    };

    let tags = client.list(&oci_name).await?;
    let mut identities = Vec::new();
    for tag in tags {
        let index = Index::pull(&oci_name, &tag, client).await;
        for entry in &index.manifests {
            let identity = PackageIdentity::from_parts(name, namespace, &tag, entry.platform.architecture.clone())?;
            identities.push(identity);
        }
    }
    Ok(identities)
}

/// Pulls the published bytes for `identity`, gzip-decompressing the single package layer.
#[tracing::instrument(skip(client))]
pub async fn pull(identity: &PackageIdentity, client: &RegistryClient) -> Result<Vec<u8>> {
    let name = identity.oci_name();
    let reference = identity.oci_reference();

    let index = Index::pull(&name, &reference, client).await;
    let entry = index.find(&identity.architecture).ok_or_else(|| Error::UnknownPackage {
        name: name.clone(),
        reference: reference.clone(),
        architecture: identity.architecture.clone(),
    })?;

    let manifest = Manifest::from_descriptor(&name, &entry.descriptor, client).await?;
    if manifest.artifact_type != ARTIFACT_TYPE {
        let digest = manifest.descriptor()?.digest;
        return Err(Error::UnknownArtifactType {
            digest,
            found: manifest.artifact_type.clone(),
            expected: ARTIFACT_TYPE,
        });
    }

    let mut layer = manifest
        .package_layer()
        .cloned()
        .ok_or_else(|| Error::UnknownPackage {
            name: name.clone(),
            reference: reference.clone(),
            architecture: identity.architecture.clone(),
        })?;
    let gzipped = layer.pull(&name, client).await?;
    let content = gunzip(gzipped)?;
    Ok(content)
}
