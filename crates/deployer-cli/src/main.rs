//! Main entry point for the Delance deployer.
//!
//! Deploys the compiled Delance contract to the configured EVM network and
//! prints `Delance contract deployed to <address>` once the deployment is
//! confirmed. Exits with 0 on success and 1 on any failure.

use deployer_cli::{init_logging, parse_args, run};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
	dotenvy::dotenv().ok();

	let args = match parse_args(std::env::args_os()) {
		Ok(args) => args,
		Err(status) => return status.into(),
	};

	init_logging(&args.log_level);
	tracing::debug!(?args, "Starting deployer");

	run(&args, &mut std::io::stdout(), &mut std::io::stderr())
		.await
		.into()
}
