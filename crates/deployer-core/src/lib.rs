//! Core deployment orchestration for the Delance deployer.
//!
//! The [`Deployer`] performs exactly one deployment attempt:
//! Start -> Resolving -> Deploying -> Succeeded | Failed. It owns no network or
//! filesystem code itself; both collaborators are reached through the
//! [`ArtifactStore`] and [`DeploymentInterface`] traits so they can be
//! replaced by test doubles.

pub mod report;

pub use report::{report_failure, report_success};

use deployer_artifacts::{ArtifactError, ArtifactStore};
use deployer_config::ConfigError;
use deployer_delivery::{DeliveryError, DeploymentInterface};
use deployer_types::{DeploymentResult, DeploymentState};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors that end a deployment invocation.
///
/// Every variant is fatal and maps to exit status 1. Messages are the
/// underlying error's own text so they reach stderr unchanged.
#[derive(Debug, Error)]
pub enum DeployError {
	/// No usable compiled artifact for the requested contract.
	#[error(transparent)]
	ArtifactResolution(#[from] ArtifactError),
	/// Submission or confirmation of the deployment transaction failed.
	#[error(transparent)]
	DeploymentFailed(#[from] DeliveryError),
	/// Configuration could not be loaded or validated.
	#[error(transparent)]
	Configuration(#[from] ConfigError),
}

/// Process exit status of a deployment invocation. Only 0 and 1 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
	Success,
	Failure,
}

impl ExitStatus {
	pub fn code(&self) -> u8 {
		match self {
			Self::Success => 0,
			Self::Failure => 1,
		}
	}
}

impl From<ExitStatus> for ExitCode {
	fn from(status: ExitStatus) -> Self {
		ExitCode::from(status.code())
	}
}

/// Tracks the lifecycle of one attempt and logs each transition.
struct StateTracker<'a> {
	contract: &'a str,
	state: DeploymentState,
}

impl<'a> StateTracker<'a> {
	fn new(contract: &'a str) -> Self {
		Self {
			contract,
			state: DeploymentState::Start,
		}
	}

	fn advance(&mut self, next: DeploymentState) {
		if self.state.is_terminal() {
			warn!(
				contract = self.contract,
				state = %self.state,
				ignored = %next,
				"Deployment already finished, ignoring transition"
			);
			return;
		}
		debug_assert!(
			self.state.can_transition_to(next),
			"invalid deployment transition {} -> {}",
			self.state,
			next
		);
		debug!(
			contract = self.contract,
			from = %self.state,
			to = %next,
			"Deployment state transition"
		);
		self.state = next;
	}
}

/// Orchestrates a single contract deployment.
pub struct Deployer {
	artifacts: Arc<dyn ArtifactStore>,
	delivery: Arc<dyn DeploymentInterface>,
	constructor_args: Vec<String>,
}

impl Deployer {
	pub fn new(artifacts: Arc<dyn ArtifactStore>, delivery: Arc<dyn DeploymentInterface>) -> Self {
		Self {
			artifacts,
			delivery,
			constructor_args: Vec::new(),
		}
	}

	/// Constructor arguments attached to the resolved factory before deployment.
	pub fn with_constructor_args(mut self, args: Vec<String>) -> Self {
		self.constructor_args = args;
		self
	}

	/// Resolves, deploys and awaits confirmation of the named contract.
	///
	/// The returned result is only observed after the network confirms the
	/// creation transaction. Nothing is retried.
	#[instrument(skip(self), fields(contract = %name))]
	pub async fn deploy(&self, name: &str) -> Result<DeploymentResult, DeployError> {
		let mut tracker = StateTracker::new(name);

		match self.run(&mut tracker, name).await {
			Ok(result) => {
				tracker.advance(DeploymentState::Succeeded);
				info!(
					address = %result.contract_address,
					tx_hash = %result.transaction_hash,
					"Contract deployed"
				);
				Ok(result)
			},
			Err(e) => {
				tracker.advance(DeploymentState::Failed);
				debug!(error = %e, "Deployment failed");
				Err(e)
			},
		}
	}

	async fn run(
		&self,
		tracker: &mut StateTracker<'_>,
		name: &str,
	) -> Result<DeploymentResult, DeployError> {
		tracker.advance(DeploymentState::Resolving);
		let factory = match self.artifacts.resolve_contract_artifact(name).await {
			Ok(factory) => factory.with_constructor_args(self.constructor_args.clone()),
			Err(e) => {
				if matches!(e, ArtifactError::NotFound { .. }) {
					self.log_available_contracts().await;
				}
				return Err(e.into());
			},
		};

		tracker.advance(DeploymentState::Deploying);
		let result = self.delivery.deploy_and_await_confirmation(&factory).await?;

		if !result.confirmed {
			return Err(DeliveryError::TransactionFailed(format!(
				"Deployment of {} returned without confirmation",
				factory.name()
			))
			.into());
		}

		Ok(result)
	}

	async fn log_available_contracts(&self) {
		match self.artifacts.list_contracts().await {
			Ok(available) if !available.is_empty() => {
				info!(available = %available.join(", "), "Deployable contracts found in artifact store");
			},
			Ok(_) => info!("Artifact store contains no deployable contracts"),
			Err(e) => debug!(error = %e, "Failed to list artifact store contents"),
		}
	}

	/// Runs one deployment and reports the outcome on the given streams.
	///
	/// On success exactly one line goes to `stdout`; on failure the error
	/// goes to `stderr` and nothing to `stdout`.
	pub async fn execute<O, E>(&self, name: &str, stdout: &mut O, stderr: &mut E) -> ExitStatus
	where
		O: Write,
		E: Write,
	{
		match self.deploy(name).await {
			Ok(result) => {
				if let Err(e) = report_success(stdout, &result) {
					// The contract exists on chain regardless; keep the success status
					warn!(error = %e, address = %result.contract_address, "Failed to write deployment report");
				}
				ExitStatus::Success
			},
			Err(e) => {
				if let Err(write_err) = report_failure(stderr, &e) {
					warn!(error = %write_err, "Failed to write failure report");
				}
				ExitStatus::Failure
			},
		}
	}
}
