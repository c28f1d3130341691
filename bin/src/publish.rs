use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing::info;

use crate::connection::ConnectionOptions;

#[derive(Debug, Parser)]
pub struct Options {
    /// Path to the sdist or wheel file to publish
    path: PathBuf,

    #[clap(flatten)]
    connection: ConnectionOptions,
}

#[tracing::instrument(skip(opts), fields(path = %opts.path.display()))]
pub async fn main(opts: Options) -> Result<()> {
    info!("publishing package");
    let client = opts.connection.client()?;
    pyoci_core::publish(&opts.path, &opts.connection.namespace, &client)
        .await
        .context("publish package")?;
    info!("published package");
    Ok(())
}
