//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{
	AccountConfig, ArtifactsConfig, Config, ConfirmationConfig, ContractConfig, NetworkConfig,
	DEFAULT_RPC_URL,
};
use deployer_types::{SecretString, DEFAULT_CONTRACT_NAME};
use std::path::PathBuf;

/// Well-known development key (first Hardhat/Anvil account).
const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
///
/// Provides an easy way to create test configurations with sensible defaults.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	contract_name: String,
	constructor_args: Vec<String>,
	artifact_paths: Vec<PathBuf>,
	rpc_url: String,
	chain_id: Option<u64>,
	poll_interval_ms: Option<u64>,
	private_key: String,
	confirmations: u64,
	timeout_seconds: Option<u64>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			contract_name: DEFAULT_CONTRACT_NAME.to_string(),
			constructor_args: Vec::new(),
			artifact_paths: vec![PathBuf::from("artifacts")],
			rpc_url: DEFAULT_RPC_URL.to_string(),
			chain_id: None,
			poll_interval_ms: None,
			private_key: DEV_PRIVATE_KEY.to_string(),
			confirmations: 1,
			timeout_seconds: None,
		}
	}

	pub fn contract_name(mut self, name: impl Into<String>) -> Self {
		self.contract_name = name.into();
		self
	}

	pub fn constructor_args(mut self, args: Vec<String>) -> Self {
		self.constructor_args = args;
		self
	}

	pub fn artifact_paths(mut self, paths: Vec<PathBuf>) -> Self {
		self.artifact_paths = paths;
		self
	}

	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = Some(chain_id);
		self
	}

	pub fn poll_interval_ms(mut self, interval: u64) -> Self {
		self.poll_interval_ms = Some(interval);
		self
	}

	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	/// Sets the number of confirmations to wait for.
	pub fn confirmations(mut self, confirmations: u64) -> Self {
		self.confirmations = confirmations;
		self
	}

	pub fn timeout_seconds(mut self, timeout: u64) -> Self {
		self.timeout_seconds = Some(timeout);
		self
	}

	/// Builds the `Config`. The result is not validated.
	pub fn build(self) -> Config {
		Config {
			contract: ContractConfig {
				name: self.contract_name,
				constructor_args: self.constructor_args,
			},
			artifacts: ArtifactsConfig {
				paths: self.artifact_paths,
			},
			network: NetworkConfig {
				rpc_url: self.rpc_url,
				chain_id: self.chain_id,
				poll_interval_ms: self.poll_interval_ms,
			},
			account: AccountConfig {
				private_key: SecretString::new(self.private_key),
			},
			confirmation: ConfirmationConfig {
				confirmations: self.confirmations,
				timeout_seconds: self.timeout_seconds,
			},
		}
	}
}
