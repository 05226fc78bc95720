//! Alloy-based EVM deployment delivery.
//!
//! Submits contract-creation transactions through an Alloy provider with a
//! local wallet and watches them until the configured number of
//! confirmations is reached.

use crate::{DeliveryError, DeploymentInterface};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{DynProvider, PendingTransactionError, Provider, ProviderBuilder, WatchTxError};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::{TransactionReceipt, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::layers::RetryBackoffLayer;
use async_trait::async_trait;
use deployer_config::Config;
use deployer_types::{ContractFactory, DeploymentResult};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Confirmation and network options for [`AlloyDeployment`].
#[derive(Debug, Clone)]
pub struct DeploymentOptions {
	/// Chain the endpoint must serve, if known.
	pub expected_chain_id: Option<u64>,
	/// Block confirmations to wait for.
	pub confirmations: u64,
	/// Upper bound on the confirmation wait. `None` waits indefinitely.
	pub timeout: Option<Duration>,
	/// Interval between receipt polls.
	pub poll_interval: Option<Duration>,
}

impl Default for DeploymentOptions {
	fn default() -> Self {
		Self {
			expected_chain_id: None,
			confirmations: 1,
			timeout: None,
			poll_interval: None,
		}
	}
}

/// Alloy-based EVM deployment implementation.
///
/// The provider's wallet signs; the recommended fillers supply nonce, gas and
/// chain ID. Individual RPC requests are retried with backoff by the
/// transport layer, but a deployment transaction is only ever sent once.
pub struct AlloyDeployment {
	provider: DynProvider,
	deployer: Address,
	options: DeploymentOptions,
}

impl AlloyDeployment {
	/// Creates a new AlloyDeployment for one JSON-RPC endpoint.
	///
	/// No request is made here; connectivity problems surface on deployment.
	pub fn new(
		rpc_url: &str,
		signer: PrivateKeySigner,
		options: DeploymentOptions,
	) -> Result<Self, DeliveryError> {
		let url: url::Url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Configuration(format!("Invalid RPC URL: {}", e)))?;

		let deployer = signer.address();
		let signer = match options.expected_chain_id {
			Some(chain_id) => signer.with_chain_id(Some(chain_id)),
			None => signer,
		};
		let wallet = EthereumWallet::from(signer);

		// Retry transient transport failures and rate limits, never the deployment itself
		let retry_layer = RetryBackoffLayer::new(
			5,    // max_retry
			1000, // initial backoff in milliseconds
			100,  // compute units per second
		);
		let client = RpcClient::builder().layer(retry_layer).http(url);
		if let Some(interval) = options.poll_interval {
			client.set_poll_interval(interval);
		}

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_client(client)
			.erased();

		Ok(Self::with_provider(provider, deployer, options))
	}

	/// Wraps an already configured provider whose wallet signs for `deployer`.
	pub(crate) fn with_provider(
		provider: DynProvider,
		deployer: Address,
		options: DeploymentOptions,
	) -> Self {
		Self {
			provider,
			deployer,
			options,
		}
	}

	/// Builds the delivery client from deployment configuration.
	pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
		let signer = config
			.account
			.private_key
			.expose_secret()
			.trim()
			.parse::<PrivateKeySigner>()
			.map_err(|e| DeliveryError::Configuration(format!("Invalid private key: {}", e)))?;

		let options = DeploymentOptions {
			expected_chain_id: config.network.chain_id,
			confirmations: config.confirmation.confirmations,
			timeout: config.confirmation.timeout(),
			poll_interval: config.network.poll_interval(),
		};

		Self::new(&config.network.rpc_url, signer, options)
	}

	/// Address the deployment is sent from.
	pub fn deployer(&self) -> Address {
		self.deployer
	}

	/// Fails when the endpoint serves a different chain than configured.
	async fn check_chain(&self) -> Result<u64, DeliveryError> {
		let actual = self
			.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain ID: {}", e)))?;

		match self.options.expected_chain_id {
			Some(expected) if expected != actual => {
				Err(DeliveryError::ChainMismatch { expected, actual })
			},
			_ => Ok(actual),
		}
	}
}

/// Maps a failed confirmation wait to a delivery error.
fn confirmation_error(
	err: PendingTransactionError,
	timeout: Option<Duration>,
	tx_hash: B256,
) -> DeliveryError {
	match err {
		PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
			DeliveryError::Timeout(timeout.unwrap_or_default(), tx_hash)
		},
		other => DeliveryError::Network(format!(
			"Failed to confirm transaction {}: {}",
			tx_hash, other
		)),
	}
}

/// Returns the created contract address of a successful creation receipt.
fn created_contract(receipt: &TransactionReceipt, tx_hash: B256) -> Result<Address, DeliveryError> {
	if !receipt.status() {
		return Err(DeliveryError::TransactionFailed(format!(
			"Deployment transaction {} reverted",
			tx_hash
		)));
	}

	receipt
		.contract_address
		.ok_or(DeliveryError::MissingContractAddress(tx_hash))
}

/// Builds a contract-creation transaction request.
pub(crate) fn deployment_request(from: Address, code: Bytes) -> TransactionRequest {
	TransactionRequest::default()
		.with_from(from)
		.with_deploy_code(code)
}

#[async_trait]
impl DeploymentInterface for AlloyDeployment {
	#[instrument(skip_all, fields(contract = %factory.name()))]
	async fn deploy_and_await_confirmation(
		&self,
		factory: &ContractFactory,
	) -> Result<DeploymentResult, DeliveryError> {
		let code = factory.deployment_code()?;
		let chain_id = self.check_chain().await?;

		debug!(
			chain_id = chain_id,
			deployer = %self.deployer,
			code_len = code.len(),
			"Sending deployment transaction"
		);

		let pending = self
			.provider
			.send_transaction(deployment_request(self.deployer, code))
			.await
			.map_err(|e| {
				DeliveryError::TransactionFailed(format!(
					"Failed to send deployment transaction: {}",
					e
				))
			})?;

		let tx_hash = *pending.tx_hash();
		info!(
			tx_hash = %tx_hash,
			chain_id = chain_id,
			confirmations = self.options.confirmations,
			"Deployment transaction submitted, waiting for confirmation"
		);

		let receipt = pending
			.with_required_confirmations(self.options.confirmations)
			.with_timeout(self.options.timeout)
			.get_receipt()
			.await
			.map_err(|e| confirmation_error(e, self.options.timeout, tx_hash))?;

		let contract_address = created_contract(&receipt, tx_hash)?;

		info!(
			tx_hash = %tx_hash,
			address = %contract_address,
			block_number = ?receipt.block_number,
			gas_used = receipt.gas_used,
			"Deployment confirmed"
		);

		Ok(DeploymentResult {
			contract_name: factory.name().to_string(),
			contract_address,
			confirmed: true,
			transaction_hash: tx_hash,
			block_number: receipt.block_number,
			gas_used: receipt.gas_used,
		})
	}
}
