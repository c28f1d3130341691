#![deny(clippy::uninlined_format_args)]
#![deny(clippy::unwrap_used)]
#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

//! Bridges the Python package ecosystem and the OCI distribution registry ecosystem.
//!
//! Publishes sdists and wheels into any OCI-compliant registry as content-addressed
//! artifacts, lists what's published for a package, and pulls files back out — all on
//! top of the standard OCI Distribution HTTP API.
//!
//! ```
//! use pyoci_core::PackageIdentity;
//!
//! let identity = PackageIdentity::parse("pyoci-0.1.0.tar.gz").unwrap();
//! assert_eq!(identity.distribution, "pyoci");
//! assert_eq!(identity.oci_reference(), "0.1.0");
//! ```

pub mod digest;
pub mod error;
pub mod oci;
pub mod ops;
pub mod package;
pub mod registry;

pub use digest::Digest;
pub use error::{Error, Result};
pub use oci::{Descriptor, Index, Manifest, Platform, PlatformDescriptor};
pub use ops::{list, publish, pull};
pub use package::PackageIdentity;
pub use registry::RegistryClient;
