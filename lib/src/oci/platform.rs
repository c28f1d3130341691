//! Platform: the OCI `{architecture, os, ...}` tuple, repurposed to carry the Python
//! wheel compatibility tail.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// The fixed `os` sentinel: platform semantics for this crate live entirely in
/// `architecture`, so `os` carries no information of its own.
pub const OS: &str = "any";

/// `{architecture, os="any", osVersion?, osFeatures?, variant?}`.
#[derive(Clone, Debug, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub architecture: String,
    #[builder(default = OS.to_string())]
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub os_features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub variant: Option<String>,
}

impl Platform {
    /// A platform carrying `architecture` with the fixed `os = "any"` sentinel.
    pub fn for_architecture(architecture: impl Into<String>) -> Self {
        Platform::builder().architecture(architecture.into()).build()
    }
}

/// A [`crate::oci::Descriptor`] plus the [`Platform`] it was built for.
///
/// This is the element type of [`crate::oci::Index::manifests`]. The descriptor's own
/// `digest`/`size`/`mediaType` fields are flattened alongside `platform` on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    #[serde(flatten)]
    pub descriptor: crate::oci::Descriptor,
    pub platform: Platform,
}

impl PlatformDescriptor {
    pub fn new(descriptor: crate::oci::Descriptor, platform: Platform) -> Self {
        Self { descriptor, platform }
    }
}
