//! Command-line wiring for the Delance deployer.
//!
//! Parses arguments, loads configuration, builds the artifact store and the
//! deployment client, and runs a single [`Deployer`] invocation. Everything
//! that decides the exit status lives here so `main` stays a thin shell.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use deployer_artifacts::FileArtifactStore;
use deployer_config::Config;
use deployer_core::{report_failure, DeployError, Deployer, ExitStatus};
use deployer_delivery::AlloyDeployment;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line arguments for the deployer.
#[derive(Parser, Debug)]
#[command(name = "delance-deploy", author, version, about, long_about = None)]
pub struct Args {
	/// Path to configuration file
	///
	/// Defaults to `deploy.toml` in the working directory when present,
	/// otherwise built-in defaults plus DEPLOYER_* environment variables.
	#[arg(short, long, env = "DEPLOYER_CONFIG")]
	pub config: Option<PathBuf>,

	/// Contract to deploy, bare (`Delance`) or fully qualified
	/// (`contracts/Delance.sol:Delance`)
	#[arg(long)]
	pub contract: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	pub log_level: String,
}

/// Parses arguments without letting clap pick the exit code.
///
/// Help and version output yield [`ExitStatus::Success`]; any other parse
/// error is printed and yields [`ExitStatus::Failure`].
pub fn parse_args<I, T>(args: I) -> Result<Args, ExitStatus>
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	Args::try_parse_from(args).map_err(|err| {
		if let Err(e) = err.print() {
			tracing::warn!(error = %e, "Failed to write argument error");
		}
		match err.kind() {
			ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
			_ => ExitStatus::Failure,
		}
	})
}

/// Initializes tracing on stderr. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	let _ = fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.compact()
		.try_init();
}

/// Loads configuration and applies command-line overrides.
pub async fn load_config(args: &Args) -> Result<Config, DeployError> {
	let config = Config::load(args.config.as_deref()).await?;

	match &args.contract {
		Some(name) => Ok(config.with_contract_name(name.clone())?),
		None => Ok(config),
	}
}

/// Builds a deployer backed by the filesystem artifact store and an Alloy client.
pub fn build_deployer(config: &Config) -> anyhow::Result<Deployer> {
	let artifacts = FileArtifactStore::new(config.artifacts.paths.clone());
	let delivery =
		AlloyDeployment::from_config(config).context("Failed to initialize deployment client")?;

	tracing::debug!(
		deployer = %delivery.deployer(),
		rpc_url = %config.network.rpc_url,
		artifact_roots = ?artifacts.roots(),
		"Deployment client ready"
	);

	Ok(Deployer::new(Arc::new(artifacts), Arc::new(delivery))
		.with_constructor_args(config.contract.constructor_args.clone()))
}

/// Runs one deployment invocation end to end.
pub async fn run<O, E>(args: &Args, stdout: &mut O, stderr: &mut E) -> ExitStatus
where
	O: Write,
	E: Write,
{
	let config = match load_config(args).await {
		Ok(config) => config,
		Err(e) => {
			tracing::debug!(error = %e, "Configuration rejected");
			if let Err(write_err) = report_failure(stderr, &e) {
				tracing::warn!(error = %write_err, "Failed to write failure report");
			}
			return ExitStatus::Failure;
		},
	};

	let deployer = match build_deployer(&config) {
		Ok(deployer) => deployer,
		Err(e) => {
			if let Err(write_err) = report_failure(stderr, &*e) {
				tracing::warn!(error = %write_err, "Failed to write failure report");
			}
			return ExitStatus::Failure;
		},
	};

	deployer.execute(&config.contract.name, stdout, stderr).await
}
