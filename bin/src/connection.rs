use clap::Parser;
use color_eyre::eyre::{Context, Result};
use derive_more::Debug;
use pyoci_core::RegistryClient;

/// Registry connection options shared by every subcommand.
#[derive(Debug, Parser)]
pub struct ConnectionOptions {
    /// OCI registry to connect to (e.g. `registry.example.com`, `docker.io`)
    #[arg(long, env = "PYOCI_REGISTRY")]
    pub registry: String,

    /// Username for registry authentication, if required
    #[arg(long, env = "PYOCI_USERNAME")]
    pub username: Option<String>,

    /// Password for registry authentication, if required
    #[arg(long, env = "PYOCI_PASSWORD")]
    #[debug(skip)]
    pub password: Option<String>,

    /// Namespace (path prefix) under which packages are published
    #[arg(long, default_value = "")]
    pub namespace: String,
}

impl ConnectionOptions {
    pub fn client(&self) -> Result<RegistryClient> {
        RegistryClient::builder()
            .registry_url(&self.registry)
            .maybe_username(self.username.clone())
            .maybe_password(self.password.clone())
            .build()
            .context("build registry client")
    }
}
