//! PackageName: parses and formats Python distribution filenames, and maps them to and
//! from the `(name, reference, architecture)` triple used on the OCI side.

use std::sync::OnceLock;

use bon::Builder;
use regex::Regex;

use crate::error::{Error, Result};
use crate::oci::Platform;

fn sdist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<dist>[a-z0-9]([a-z0-9_.]*[a-z0-9])?)-(?P<version>[0-9a-z.+]+)\.tar\.gz$")
            .expect("static sdist regex is valid")
    })
}

fn wheel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?P<dist>[a-z0-9]([a-z0-9_.]*[a-z0-9])?)-(?P<version>[0-9a-z.+]+)-(?P<arch>(?:\w+-)?\w+-\w+-\w+\.whl)$",
        )
        .expect("static wheel regex is valid")
    })
}

fn wheel_tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:\w+-)?\w+-\w+-\w+\.whl$").expect("static wheel tail regex is valid")
    })
}

/// Collapses runs of `-_.` into a single `-` and lowercases, as PEP 503 normalization does.
fn normalize_distribution(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut normalized = String::with_capacity(lower.len());
    let mut last_was_separator = false;
    for ch in lower.chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.push(ch);
            last_was_separator = false;
        }
    }
    normalized
}

/// Returns `Ok(())` if `architecture` is either the sdist sentinel or a valid wheel tail.
pub fn validate_architecture(architecture: &str) -> Result<()> {
    if architecture == ".tar.gz" || wheel_tail_re().is_match(architecture) {
        Ok(())
    } else {
        Err(Error::InvalidArchitecture(architecture.to_string()))
    }
}

/// The essential identity of a published (or publishable) Python distribution file.
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct PackageIdentity {
    /// Normalized: lowercased, runs of `-_.` collapsed to a single `-`.
    pub distribution: String,
    /// Opaque path prefix under which this package is published in the registry.
    #[builder(default)]
    pub namespace: String,
    /// The original PEP 440 version, possibly containing `+local` segments.
    pub full_version: String,
    /// Either the literal `.tar.gz` for sdists, or the wheel tail for wheels.
    pub architecture: String,
}

impl PackageIdentity {
    /// Parses a Python distribution filename into a [`PackageIdentity`].
    ///
    /// Matches the `FILE` grammar with full-string anchoring. On sdist, `architecture`
    /// is set to `.tar.gz`; on wheel, to the tail of the filename (everything after
    /// `{distribution}-{full_version}-`, leading hyphen excluded).
    pub fn parse(filename: &str) -> Result<Self> {
        if let Some(captures) = sdist_re().captures(filename) {
            return Ok(PackageIdentity::builder()
                .distribution(normalize_distribution(&captures["dist"]))
                .full_version(captures["version"].to_string())
                .architecture(".tar.gz".to_string())
                .build());
        }

        if let Some(captures) = wheel_re().captures(filename) {
            return Ok(PackageIdentity::builder()
                .distribution(normalize_distribution(&captures["dist"]))
                .full_version(captures["version"].to_string())
                .architecture(captures["arch"].to_string())
                .build());
        }

        Err(Error::InvalidName(filename.to_string()))
    }

    /// Reconstructs the filename this identity would have been parsed from (modulo
    /// pre-normalization casing/separators in `distribution`, which are never recovered).
    pub fn format(&self) -> String {
        if self.architecture == ".tar.gz" {
            format!("{}-{}.tar.gz", self.distribution, self.full_version)
        } else {
            format!("{}-{}-{}", self.distribution, self.full_version, self.architecture)
        }
    }

    /// Builds an identity directly from its OCI-side parts, reversing the `+`→`-` tag
    /// substitution. Only exact when the original version contained no `-`.
    pub fn from_parts(
        distribution: impl Into<String>,
        namespace: impl Into<String>,
        tag: &str,
        architecture: impl Into<String>,
    ) -> Result<Self> {
        let architecture = architecture.into();
        validate_architecture(&architecture)?;
        Ok(PackageIdentity::builder()
            .distribution(distribution.into())
            .namespace(namespace.into())
            .full_version(tag.replace('-', "+"))
            .architecture(architecture)
            .build())
    }

    /// `lower("{namespace}/{distribution}")`, or just `distribution` if there's no namespace.
    pub fn oci_name(&self) -> String {
        if self.namespace.is_empty() {
            self.distribution.to_lowercase()
        } else {
            format!("{}/{}", self.namespace, self.distribution).to_lowercase()
        }
    }

    /// `full_version` with every `+` replaced by `-`, since `+` is disallowed in OCI tags.
    pub fn oci_reference(&self) -> String {
        self.full_version.replace('+', "-")
    }

    /// The [`Platform`] this identity maps to: `architecture` carried verbatim, `os = "any"`.
    pub fn platform(&self) -> Platform {
        Platform::for_architecture(self.architecture.clone())
    }
}
