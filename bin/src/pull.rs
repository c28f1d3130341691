use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use pyoci_core::PackageIdentity;
use tracing::info;

use crate::connection::ConnectionOptions;

#[derive(Debug, Parser)]
pub struct Options {
    /// Name of the package to pull
    name: String,

    /// Version (tag) to pull
    version: String,

    /// Architecture to pull: `.tar.gz` for the sdist, or the wheel tail
    /// (e.g. `cp311-cp311-manylinux_2_17_x86_64.whl`)
    architecture: String,

    /// File path to write the pulled package to; defaults to its original filename
    #[arg(long)]
    output: Option<PathBuf>,

    #[clap(flatten)]
    connection: ConnectionOptions,
}

#[tracing::instrument(skip(opts), fields(name = %opts.name, version = %opts.version))]
pub async fn main(opts: Options) -> Result<()> {
    info!("pulling published package");
    let client = opts.connection.client()?;
    let identity = PackageIdentity::from_parts(
        opts.name.clone(),
        opts.connection.namespace.clone(),
        &opts.version,
        opts.architecture.clone(),
    )
    .context("build package identity")?;

    let content = pyoci_core::pull(&identity, &client).await.context("pull package")?;

    let output = opts.output.clone().unwrap_or_else(|| PathBuf::from(identity.format()));
    std::fs::write(&output, &content).with_context(|| format!("write {output:?}"))?;
    info!(path = %output.display(), bytes = content.len(), "wrote pulled package");

    Ok(())
}
