use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pyoci_core::PackageIdentity;
use simple_test_case::test_case;

#[test_case("pkg-1.0.tar.gz", "pkg", "1.0", ".tar.gz" ; "plain sdist")]
#[test_case(
    "pkg-1.0-cp311-cp311-linux_x86_64.whl",
    "pkg",
    "1.0",
    "cp311-cp311-linux_x86_64.whl"
    ; "plain wheel"
)]
#[test_case(
    "pkg-1.0-py3-none-any.whl",
    "pkg",
    "1.0",
    "py3-none-any.whl"
    ; "universal wheel"
)]
fn parses(filename: &str, distribution: &str, full_version: &str, architecture: &str) {
    let identity = PackageIdentity::parse(filename).expect("parses");
    assert_eq!(identity.distribution, distribution);
    assert_eq!(identity.full_version, full_version);
    assert_eq!(identity.architecture, architecture);
}

#[test]
fn empty_config_descriptor_matches_s3_scenario() {
    let descriptor = pyoci_core::Descriptor::empty_config();
    assert_eq!(
        descriptor.digest.to_string(),
        "sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
    );
    assert_eq!(descriptor.size, 2);
    assert_eq!(descriptor.media_type, "application/vnd.oci.empty.v1+json");
}

proptest! {
    #[test]
    fn digest_of_gzip_deterministic_is_stable(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let first = pyoci_core::digest::gzip_deterministic(&bytes).expect("gzips");
        let second = pyoci_core::digest::gzip_deterministic(&bytes).expect("gzips");
        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(
            pyoci_core::digest::digest_of(&first),
            pyoci_core::digest::digest_of(&pyoci_core::digest::gzip_deterministic(&bytes).unwrap())
        );
    }

    #[test]
    fn from_parts_inverts_oci_reference_without_hyphen(
        dist in "[a-z][a-z0-9]{0,8}",
        version in "[0-9]\\.[0-9]\\.[0-9]",
    ) {
        let identity = PackageIdentity::parse(&format!("{dist}-{version}.tar.gz")).expect("parses");
        prop_assert!(!identity.full_version.contains('-'));

        let reference = identity.oci_reference();
        let rebuilt = PackageIdentity::from_parts(
            identity.distribution.clone(),
            "",
            &reference,
            identity.architecture.clone(),
        )
        .expect("valid architecture");
        prop_assert_eq!(rebuilt.full_version, identity.full_version);
    }
}
