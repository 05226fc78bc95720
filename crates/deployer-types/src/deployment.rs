//! Deployment outcome and lifecycle types.

use alloy_primitives::{Address, B256};
use std::fmt;

/// Outcome of one confirmed contract deployment.
///
/// Only produced once the network has confirmed the creation transaction, so
/// `confirmed` is always `true` on a value that exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
	/// Name of the deployed contract.
	pub contract_name: String,
	/// Address assigned to the new contract.
	pub contract_address: Address,
	/// Whether the creation transaction was confirmed.
	pub confirmed: bool,
	/// Hash of the creation transaction.
	pub transaction_hash: B256,
	/// Block that included the creation transaction, when reported.
	pub block_number: Option<u64>,
	/// Gas consumed by the creation transaction.
	pub gas_used: u64,
}

impl DeploymentResult {
	/// EIP-55 checksummed rendering of the contract address.
	pub fn checksum_address(&self) -> String {
		self.contract_address.to_checksum(None)
	}
}

/// Lifecycle of a single deployment attempt.
///
/// Start -> Resolving -> Deploying -> Succeeded, with any non-terminal state
/// allowed to fall through to Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentState {
	Start,
	Resolving,
	Deploying,
	Succeeded,
	Failed,
}

impl DeploymentState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Succeeded | Self::Failed)
	}

	/// Checks if a state transition is valid
	pub fn can_transition_to(&self, next: DeploymentState) -> bool {
		use DeploymentState::*;

		matches!(
			(self, next),
			(Start, Resolving)
				| (Resolving, Deploying)
				| (Deploying, Succeeded)
				| (Start, Failed)
				| (Resolving, Failed)
				| (Deploying, Failed)
		)
	}
}

impl fmt::Display for DeploymentState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Start => "start",
			Self::Resolving => "resolving",
			Self::Deploying => "deploying",
			Self::Succeeded => "succeeded",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_checksum_address() {
		let result = DeploymentResult {
			contract_name: "Delance".to_string(),
			contract_address: address!("1cbd563b6f743b82f2f345b342c08e9e666ef7be"),
			confirmed: true,
			transaction_hash: B256::ZERO,
			block_number: Some(1),
			gas_used: 21_000,
		};

		assert_eq!(
			result.checksum_address(),
			"0x1cbD563B6F743b82f2F345B342C08E9E666Ef7Be"
		);
	}

	#[test]
	fn test_valid_transitions() {
		use DeploymentState::*;

		assert!(Start.can_transition_to(Resolving));
		assert!(Resolving.can_transition_to(Deploying));
		assert!(Deploying.can_transition_to(Succeeded));
		assert!(Resolving.can_transition_to(Failed));
		assert!(Deploying.can_transition_to(Failed));
	}

	#[test]
	fn test_invalid_transitions() {
		use DeploymentState::*;

		assert!(!Start.can_transition_to(Deploying));
		assert!(!Resolving.can_transition_to(Succeeded));
		assert!(!Succeeded.can_transition_to(Failed));
		assert!(!Failed.can_transition_to(Resolving));
		assert!(!Deploying.can_transition_to(Resolving));
	}

	#[test]
	fn test_terminal_states() {
		assert!(DeploymentState::Succeeded.is_terminal());
		assert!(DeploymentState::Failed.is_terminal());
		assert!(!DeploymentState::Deploying.is_terminal());
	}
}
