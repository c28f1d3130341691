use pretty_assertions::assert_eq;
use pyoci_core::oci::Index;
use pyoci_core::{Manifest, Platform};

#[test]
fn add_manifest_is_idempotent() {
    let manifest = Manifest::for_package(b"payload").expect("builds");
    let platform = Platform::for_architecture(".tar.gz");
    let expected_digest = manifest.descriptor().expect("derives digest").digest;

    let mut index = Index::empty("ns/pkg", "1.0");
    index.add_manifest(manifest.clone(), platform.clone()).expect("adds");
    index.add_manifest(manifest, platform.clone()).expect("adds again");

    let matching: Vec<_> = index
        .manifests
        .iter()
        .filter(|entry| entry.platform.architecture == platform.architecture)
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].descriptor.digest, expected_digest);
}

#[test]
fn add_manifest_overwrites_same_architecture_with_different_content() {
    let platform = Platform::for_architecture(".tar.gz");
    let mut index = Index::empty("ns/pkg", "1.0");

    index
        .add_manifest(Manifest::for_package(b"v1").expect("builds"), platform.clone())
        .expect("adds");
    index
        .add_manifest(Manifest::for_package(b"v2").expect("builds"), platform.clone())
        .expect("adds");

    let matching: Vec<_> = index
        .manifests
        .iter()
        .filter(|entry| entry.platform.architecture == platform.architecture)
        .collect();
    assert_eq!(matching.len(), 1);
}

#[test]
fn two_architectures_one_version_s5() {
    let mut index = Index::empty("ns/pkg", "1.0");
    index
        .add_manifest(
            Manifest::for_package(b"sdist content").expect("builds"),
            Platform::for_architecture(".tar.gz"),
        )
        .expect("adds");
    index
        .add_manifest(
            Manifest::for_package(b"wheel content").expect("builds"),
            Platform::for_architecture("cp311-cp311-linux_x86_64.whl"),
        )
        .expect("adds");

    assert_eq!(index.manifests.len(), 2);
    let architectures: std::collections::HashSet<_> =
        index.manifests.iter().map(|entry| entry.platform.architecture.clone()).collect();
    assert_eq!(architectures.len(), 2);
}

#[test]
fn wire_keys_are_camel_case() {
    let index = Index::empty("ns/pkg", "1.0");
    let json = serde_json::to_value(&index).expect("serializes");
    assert_eq!(json["schemaVersion"], 2);
    assert_eq!(json["mediaType"], pyoci_core::oci::index::MEDIA_TYPE);
    assert_eq!(json["artifactType"], pyoci_core::oci::ARTIFACT_TYPE);
    assert!(json.get("schema_version").is_none());
    assert!(json.get("media_type").is_none());
    assert!(json.get("artifact_type").is_none());
}

#[test]
fn deserializes_a_camel_case_index_payload_without_dropping_manifests() {
    let mut index = Index::empty("ns/pkg", "1.0");
    index
        .add_manifest(
            Manifest::for_package(b"sdist content").expect("builds"),
            Platform::for_architecture(".tar.gz"),
        )
        .expect("adds");

    let bytes = serde_json::to_vec(&index).expect("serializes");
    let parsed: Index = serde_json::from_slice(&bytes).expect("parses camelCase wire payload");

    assert_eq!(parsed.manifests.len(), 1);
    assert_eq!(parsed.manifests[0].platform.architecture, ".tar.gz");
}
