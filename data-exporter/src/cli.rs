///
/// This module implements the CLI interface for data-exporter: argument parsing,
/// configuration resolution and orchestration of the core pipeline.
///
/// All discovery, packaging and transfer logic lives in the [`data-exporter-core`]
/// crate. This module only wires the reqwest-backed [`CrxClient`] into it.
///
/// ## Commands
/// - `export`: create packages, then upload, build, download and remove each one.
/// - `create`: discover content and write package archives only.
/// - `upload`, `build`, `install`, `download`, `remove`: one package-manager step
///   over `--package-count` previously created packages.
///
/// Connection flags are global and may also come from the `--config` YAML file.
/// See [`crate::load_config`] for precedence rules.
///
/// [`data-exporter-core`]: ../../data-exporter-core/
use crate::client::CrxClient;
use crate::load_config::{load_config, ConfigValues, Connection};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use data_exporter_core::export::create_packages;
use data_exporter_core::transfer::{TransferPipeline, TransferStep};
use std::path::PathBuf;

/// CLI for data-exporter: package repository content for transfer between instances.
#[derive(Parser, Debug)]
#[clap(
    name = "data-exporter",
    version,
    about = "Export pages and DAM assets below a content path as vault packages"
)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Path to a YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository base URL, e.g. http://localhost:4502
    #[clap(long, global = true)]
    pub host: Option<String>,

    #[clap(long, global = true)]
    pub username: Option<String>,

    /// Password; also read from DATA_EXPORTER_PASSWORD
    #[clap(long, global = true)]
    pub password: Option<String>,

    /// Base name of the packages; each gets a `_<n>` suffix
    #[clap(long, global = true)]
    pub package_name: Option<String>,

    /// Where package files and archives are written (default ./packages)
    #[clap(long, global = true)]
    pub working_directory: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DiscoveryArgs {
    /// Content path to start from
    #[clap(long)]
    pub path: Option<String>,

    /// Number of recursive page fetches; blank or negative means unbounded
    #[clap(long, allow_hyphen_values = true)]
    pub max_page_depth: Option<String>,

    /// Nesting limit of asset references below each page
    #[clap(long, allow_hyphen_values = true)]
    pub max_dam_depth: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct PackageArgs {
    /// Number of packages created by a previous `create`
    #[clap(long)]
    pub package_count: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create packages and move them through upload, build, download and removal
    Export(DiscoveryArgs),
    /// Discover content and write package archives to the working directory
    Create(DiscoveryArgs),
    /// Upload created package archives
    Upload(PackageArgs),
    /// Build uploaded packages
    Build(PackageArgs),
    /// Install uploaded packages
    Install(PackageArgs),
    /// Download built packages into the working directory
    Download(PackageArgs),
    /// Remove packages from the package manager
    Remove(PackageArgs),
}

impl Commands {
    /// The package-manager step a per-package command runs.
    pub fn transfer_step(&self) -> Option<TransferStep> {
        match self {
            Commands::Export(_) | Commands::Create(_) => None,
            Commands::Upload(_) => Some(TransferStep::Upload),
            Commands::Build(_) => Some(TransferStep::Build),
            Commands::Install(_) => Some(TransferStep::Install),
            Commands::Download(_) => Some(TransferStep::Download),
            Commands::Remove(_) => Some(TransferStep::Remove),
        }
    }
}

impl Cli {
    /// Values given on the command line, before merging other sources.
    pub fn values(&self) -> ConfigValues {
        let mut values = ConfigValues {
            host: self.global.host.clone(),
            username: self.global.username.clone(),
            password: self.global.password.clone(),
            package_name: self.global.package_name.clone(),
            working_directory: self.global.working_directory.clone(),
            ..ConfigValues::default()
        };
        match &self.command {
            Commands::Export(args) | Commands::Create(args) => {
                values.path = args.path.clone();
                values.max_page_depth = args.max_page_depth.clone();
                values.max_dam_depth = args.max_dam_depth.clone();
            }
            Commands::Upload(args)
            | Commands::Build(args)
            | Commands::Install(args)
            | Commands::Download(args)
            | Commands::Remove(args) => values.package_count = args.package_count,
        }
        values
    }

    /// Command line, then config file, then environment.
    pub fn resolve_values(&self) -> Result<ConfigValues> {
        let file = match &self.global.config {
            Some(path) => ConfigValues::from(load_config(path)?),
            None => ConfigValues::default(),
        };
        Ok(self.values().or(file).or(ConfigValues::from_env()))
    }
}

fn client(connection: &Connection) -> Result<CrxClient> {
    CrxClient::new(connection).context("Failed to construct HTTP client")
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");
    let values = cli.resolve_values()?;

    match &cli.command {
        Commands::Export(_) => {
            let (connection, request) = values.resolve_export()?;
            tracing::info!(command = "export", path = %request.path, "Starting export");
            let client = client(&connection)?;
            let summary = create_packages(&client, &request).await?;
            let count = summary.package_count();
            let pipeline = TransferPipeline::new(
                &client,
                connection.package_name.as_str(),
                connection.working_directory.clone(),
            );
            let reports = pipeline.run_all(&TransferStep::EXPORT, count).await?;
            tracing::info!(command = "export", packages = count, ?reports, "Export complete");
            println!("{count}");
        }
        Commands::Create(_) => {
            let (connection, request) = values.resolve_export()?;
            tracing::info!(command = "create", path = %request.path, "Creating packages");
            let client = client(&connection)?;
            let summary = create_packages(&client, &request).await?;
            println!("{}", summary.package_count());
        }
        command => {
            if let Some(step) = command.transfer_step() {
                let (connection, count) = values.resolve_packages()?;
                tracing::info!(command = step.action(), count, "Starting package step");
                let client = client(&connection)?;
                let pipeline = TransferPipeline::new(
                    &client,
                    connection.package_name.as_str(),
                    connection.working_directory.clone(),
                );
                let report = pipeline.run(step, count).await?;
                tracing::info!(command = step.action(), ?report, "Package step complete");
            }
        }
    }
    Ok(())
}
