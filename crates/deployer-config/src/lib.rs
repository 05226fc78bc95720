//! Configuration module for the Delance deployer.
//!
//! This module provides the structures and loading logic for deployment
//! configuration. Configuration is TOML; `${VAR}` and `${VAR:-default}`
//! placeholders are resolved from the environment before parsing, so secrets
//! such as the deployer's private key can live in the environment or a `.env`
//! file instead of the config file itself.
//!
//! Without a config file the deployer falls back to built-in defaults that
//! read `DEPLOYER_PRIVATE_KEY` and `DEPLOYER_RPC_URL` from the environment.

pub mod builders;

pub use builders::config::ConfigBuilder;

use deployer_types::{without_0x_prefix, SecretString, DEFAULT_CONTRACT_NAME};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "deploy.toml";

/// Default JSON-RPC endpoint (a local Hardhat or Anvil node).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Upper bound for `confirmation.confirmations`.
pub const MAX_CONFIRMATIONS: u64 = 64;

/// Configuration used when no config file exists.
const ENV_CONFIG_TEMPLATE: &str = r#"
[network]
rpc_url = "${DEPLOYER_RPC_URL:-http://127.0.0.1:8545}"

[account]
private_key = "${DEPLOYER_PRIVATE_KEY}"
"#;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The requested configuration file does not exist.
	#[error("Configuration file not found: {}", .0.display())]
	NotFound(PathBuf),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for a deployment run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Which contract to deploy and with which constructor arguments.
	#[serde(default)]
	pub contract: ContractConfig,
	/// Where compiled artifacts are searched for.
	#[serde(default)]
	pub artifacts: ArtifactsConfig,
	/// Network endpoint configuration.
	#[serde(default)]
	pub network: NetworkConfig,
	/// Deployer account.
	pub account: AccountConfig,
	/// Confirmation policy for the creation transaction.
	#[serde(default)]
	pub confirmation: ConfirmationConfig,
}

/// Contract selection.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
	/// Contract name or fully qualified name (`contracts/Delance.sol:Delance`).
	#[serde(default = "default_contract_name")]
	pub name: String,
	/// Constructor arguments as strings, coerced against the ABI.
	#[serde(default)]
	pub constructor_args: Vec<String>,
}

impl Default for ContractConfig {
	fn default() -> Self {
		Self {
			name: default_contract_name(),
			constructor_args: Vec::new(),
		}
	}
}

/// Artifact search roots.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
	/// Directories searched in order. Hardhat writes `artifacts/`, Foundry `out/`.
	#[serde(default = "default_artifact_paths")]
	pub paths: Vec<PathBuf>,
}

impl Default for ArtifactsConfig {
	fn default() -> Self {
		Self {
			paths: default_artifact_paths(),
		}
	}
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	/// HTTP JSON-RPC URL.
	#[serde(default = "default_rpc_url")]
	pub rpc_url: String,
	/// Expected chain ID. When set, the endpoint must report the same value.
	#[serde(default)]
	pub chain_id: Option<u64>,
	/// Interval between receipt polls in milliseconds.
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			rpc_url: default_rpc_url(),
			chain_id: None,
			poll_interval_ms: None,
		}
	}
}

impl NetworkConfig {
	pub fn poll_interval(&self) -> Option<Duration> {
		self.poll_interval_ms.map(Duration::from_millis)
	}
}

/// Deployer account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
	/// Hex-encoded secp256k1 private key, with or without `0x`.
	pub private_key: SecretString,
}

/// Confirmation policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
	/// Number of block confirmations to wait for.
	/// Defaults to 1 confirmation if not specified.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Upper bound on the confirmation wait. Unset waits indefinitely.
	#[serde(default)]
	pub timeout_seconds: Option<u64>,
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			confirmations: default_confirmations(),
			timeout_seconds: None,
		}
	}
}

impl ConfirmationConfig {
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_seconds.map(Duration::from_secs)
	}
}

fn default_contract_name() -> String {
	DEFAULT_CONTRACT_NAME.to_string()
}

fn default_artifact_paths() -> Vec<PathBuf> {
	vec![PathBuf::from("artifacts"), PathBuf::from("out")]
}

fn default_rpc_url() -> String {
	DEFAULT_RPC_URL.to_string()
}

fn default_confirmations() -> u64 {
	1
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}

	result.push_str(&input[last_end..]);
	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file, resolving environment placeholders.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::NotFound(path.to_path_buf())
			} else {
				ConfigError::Io(e)
			}
		})?;

		tracing::debug!(path = %path.display(), "Loaded configuration file");
		contents.parse()
	}

	/// Builds configuration from defaults and the `DEPLOYER_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		ENV_CONFIG_TEMPLATE.parse()
	}

	/// Loads configuration for a deployment run.
	///
	/// An explicit path must exist. Without one, `deploy.toml` in the working
	/// directory is used when present, otherwise [`Config::from_env`].
	pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(path) => Self::from_file(path).await,
			None => {
				let default_path = Path::new(DEFAULT_CONFIG_PATH);
				if default_path.exists() {
					Self::from_file(default_path).await
				} else {
					tracing::debug!("No configuration file found, using environment defaults");
					Self::from_env()
				}
			},
		}
	}

	/// Replaces the configured contract name and revalidates.
	pub fn with_contract_name(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
		self.contract.name = name.into();
		self.validate()?;
		Ok(self)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.contract.name.trim().is_empty() {
			return Err(ConfigError::Validation(
				"Contract name cannot be empty".into(),
			));
		}

		if self.artifacts.paths.is_empty() {
			return Err(ConfigError::Validation(
				"At least one artifacts path must be configured".into(),
			));
		}

		let url = url::Url::parse(&self.network.rpc_url).map_err(|e| {
			ConfigError::Validation(format!("Invalid RPC URL '{}': {}", self.network.rpc_url, e))
		})?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"RPC URL must use http or https, got '{}'",
				url.scheme()
			)));
		}

		if self.network.chain_id == Some(0) {
			return Err(ConfigError::Validation(
				"chain_id must be greater than 0".into(),
			));
		}

		if self.network.poll_interval_ms == Some(0) {
			return Err(ConfigError::Validation(
				"poll_interval_ms must be greater than 0".into(),
			));
		}

		validate_private_key(self.account.private_key.expose_secret())?;

		if self.confirmation.confirmations == 0 {
			return Err(ConfigError::Validation(
				"confirmations must be at least 1".into(),
			));
		}
		if self.confirmation.confirmations > MAX_CONFIRMATIONS {
			return Err(ConfigError::Validation(format!(
				"confirmations cannot exceed {}",
				MAX_CONFIRMATIONS
			)));
		}

		if self.confirmation.timeout_seconds == Some(0) {
			return Err(ConfigError::Validation(
				"timeout_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Checks that a private key is 32 bytes of hex. The key itself never appears in errors.
fn validate_private_key(key: &str) -> Result<(), ConfigError> {
	let key_without_prefix = without_0x_prefix(key.trim());

	if key_without_prefix.is_empty() {
		return Err(ConfigError::Validation(
			"Private key cannot be empty".into(),
		));
	}

	if key_without_prefix.len() != 64 {
		return Err(ConfigError::Validation(
			"Private key must be 64 hex characters (32 bytes)".into(),
		));
	}

	if hex::decode(key_without_prefix).is_err() {
		return Err(ConfigError::Validation(
			"Private key must be valid hexadecimal".into(),
		));
	}

	Ok(())
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
