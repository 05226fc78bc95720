//! Compiled contract artifact resolution for the Delance deployer.
//!
//! This module turns a contract name into a deployable [`ContractFactory`]
//! handle. Compilation itself is owned by an external toolchain; this crate
//! only reads what Hardhat (`artifacts/`) or Foundry (`out/`) leave behind.

use async_trait::async_trait;
use deployer_types::ContractFactory;
use std::path::PathBuf;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
}

pub use implementations::file::FileArtifactStore;

/// Errors that can occur while resolving a contract artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
	/// The contract name is empty or malformed.
	#[error("Invalid contract name: '{0}'")]
	InvalidName(String),
	/// No compiled artifact matches the requested name.
	#[error("Artifact for contract '{name}' not found (searched: {})", display_paths(.searched))]
	NotFound { name: String, searched: Vec<PathBuf> },
	/// More than one compiled artifact matches a bare contract name.
	#[error("Multiple artifacts for contract '{name}', use a fully qualified name: {}", .candidates.join(", "))]
	Ambiguous {
		name: String,
		candidates: Vec<String>,
	},
	/// The artifact file exists but cannot be interpreted.
	#[error("Invalid artifact {}: {reason}", .path.display())]
	Invalid { path: PathBuf, reason: String },
	/// The contract is abstract or an interface and has nothing to deploy.
	#[error("Contract '{0}' has no deployable bytecode (abstract contract or interface?)")]
	NoBytecode(String),
	/// The bytecode still contains library link placeholders.
	#[error("Contract '{0}' bytecode has unlinked library references")]
	UnlinkedLibraries(String),
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
	paths
		.iter()
		.map(|p| p.display().to_string())
		.collect::<Vec<_>>()
		.join(", ")
}

/// Trait defining the interface for artifact stores.
///
/// An artifact store resolves a contract name to a deployable handle. The
/// name is either a bare contract name (`Delance`) or a fully qualified name
/// (`contracts/Delance.sol:Delance`) that pins the source file.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait ArtifactStore: Send + Sync {
	/// Resolves a compiled contract by name.
	///
	/// Fails with [`ArtifactError::NotFound`] when nothing matches.
	async fn resolve_contract_artifact(&self, name: &str)
		-> Result<ContractFactory, ArtifactError>;

	/// Lists the names of deployable contracts known to the store.
	async fn list_contracts(&self) -> Result<Vec<String>, ArtifactError>;
}

/// A contract name split into its optional source path and contract part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractName {
	pub source: Option<PathBuf>,
	pub contract: String,
}

impl ContractName {
	/// Parses `Name` or `path/To.sol:Name`.
	pub fn parse(name: &str) -> Result<Self, ArtifactError> {
		let trimmed = name.trim();
		let invalid = || ArtifactError::InvalidName(name.to_string());

		let (source, contract) = match trimmed.rsplit_once(':') {
			Some((source, contract)) => {
				if source.is_empty() {
					return Err(invalid());
				}
				(Some(PathBuf::from(source)), contract)
			},
			None => (None, trimmed),
		};

		let valid_identifier = !contract.is_empty()
			&& contract
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
			&& !contract.starts_with(|c: char| c.is_ascii_digit());
		if !valid_identifier {
			return Err(invalid());
		}

		Ok(Self {
			source,
			contract: contract.to_string(),
		})
	}
}
