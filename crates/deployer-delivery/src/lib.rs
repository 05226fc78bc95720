//! Deployment transaction delivery for the Delance deployer.
//!
//! This module handles submitting contract-creation transactions and waiting
//! for their confirmation. Signing, gas estimation and nonce management are
//! left to the underlying client library; this layer only turns a
//! [`ContractFactory`] into a confirmed [`DeploymentResult`].

use alloy_primitives::B256;
use async_trait::async_trait;
use deployer_types::{ContractFactory, DeploymentResult, EncodingError};
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use implementations::evm::alloy::{AlloyDeployment, DeploymentOptions};

/// Errors that can occur during deployment delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node rejected the transaction or it reverted on chain.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// Constructor arguments could not be encoded.
	#[error("Failed to encode deployment: {0}")]
	Encoding(#[from] EncodingError),
	/// The endpoint serves a different chain than configured.
	#[error("Chain ID mismatch: expected {expected}, endpoint reports {actual}")]
	ChainMismatch { expected: u64, actual: u64 },
	/// Confirmation did not arrive within the configured timeout.
	#[error("Timed out after {0:?} waiting for confirmation of {1}")]
	Timeout(Duration, B256),
	/// The receipt does not carry a created contract address.
	#[error("No contract address in receipt for transaction {0}")]
	MissingContractAddress(B256),
	/// Error in the delivery client configuration.
	#[error("Invalid delivery configuration: {0}")]
	Configuration(String),
}

/// Trait defining the interface for deployment delivery implementations.
///
/// Implementations submit exactly one contract-creation transaction per call
/// and resolve only once the network has confirmed it. They never resubmit.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait DeploymentInterface: Send + Sync {
	/// Submits the factory's deployment code and waits for confirmation.
	async fn deploy_and_await_confirmation(
		&self,
		factory: &ContractFactory,
	) -> Result<DeploymentResult, DeliveryError>;
}
