use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing::info;

use crate::connection::ConnectionOptions;

#[derive(Debug, Parser)]
pub struct Options {
    /// Name of the package to list published files for
    name: String,

    #[clap(flatten)]
    connection: ConnectionOptions,
}

#[tracing::instrument(skip(opts), fields(name = %opts.name))]
pub async fn main(opts: Options) -> Result<()> {
    info!("listing published files");
    let client = opts.connection.client()?;
    let identities = pyoci_core::list(&opts.name, &opts.connection.namespace, &client)
        .await
        .context("list published files")?;

    let filenames: Vec<_> = identities.iter().map(|identity| identity.format()).collect();
    let rendered = serde_json::to_string_pretty(&filenames).context("render listing")?;
    println!("{rendered}");

    Ok(())
}
