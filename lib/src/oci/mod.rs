//! OCI data objects: descriptors, manifests, indexes, and the platform tuple, plus the
//! single canonical-JSON choke point every digest is derived through.

pub mod descriptor;
pub mod index;
pub mod manifest;
pub mod platform;

pub use descriptor::{Descriptor, ARTIFACT_TYPE};
pub use index::Index;
pub use manifest::Manifest;
pub use platform::{Platform, PlatformDescriptor};

/// Serializes `value` to its canonical JSON form: UTF-8, fields in declared order,
/// null/absent optional fields omitted via `#[serde(skip_serializing_if)]` on each type.
///
/// Every digest derived from a manifest or index MUST go through this function so the
/// digest reproduces identically across runs and processes. `serde_json`'s struct
/// serialization already emits fields in declaration order, so no custom serializer is
/// needed beyond consistently routing through this one function.
pub fn canonical_json<T: serde::Serialize>(value: &T) -> crate::error::Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(crate::error::Error::from)
}
