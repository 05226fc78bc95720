//! Human-readable reporting of deployment outcomes.

use deployer_types::DeploymentResult;
use std::error::Error;
use std::io::{self, Write};

/// Writes the single success line for a confirmed deployment.
///
/// The address is printed in its checksummed form.
pub fn report_success<W: Write>(out: &mut W, result: &DeploymentResult) -> io::Result<()> {
	writeln!(
		out,
		"{} contract deployed to {}",
		result.contract_name,
		result.checksum_address()
	)?;
	out.flush()
}

/// Writes an error and its cause chain, one cause per line.
///
/// A cause whose text is already part of the previous line is not repeated.
pub fn report_failure<W: Write>(out: &mut W, error: &(dyn Error + 'static)) -> io::Result<()> {
	let mut previous = error.to_string();
	writeln!(out, "{previous}")?;

	let mut source = error.source();
	while let Some(cause) = source {
		let message = cause.to_string();
		if !previous.contains(&message) {
			writeln!(out, "  Caused by: {message}")?;
		}
		previous = message;
		source = cause.source();
	}

	out.flush()
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, B256};
	use deployer_artifacts::ArtifactError;

	#[test]
	fn test_success_line_uses_checksum_address() {
		let result = DeploymentResult {
			contract_name: "Delance".to_string(),
			contract_address: address!("1cbd563b6f743b82f2f345b342c08e9e666ef7be"),
			confirmed: true,
			transaction_hash: B256::ZERO,
			block_number: Some(7),
			gas_used: 21_000,
		};

		let mut out = Vec::new();
		report_success(&mut out, &result).unwrap();

		assert_eq!(
			String::from_utf8(out).unwrap(),
			"Delance contract deployed to 0x1cbD563B6F743b82f2F345B342C08E9E666Ef7Be\n"
		);
	}

	#[derive(Debug, thiserror::Error)]
	#[error("Failed to read artifacts directory")]
	struct ReadFailure(#[source] io::Error);

	#[test]
	fn test_failure_includes_cause_chain() {
		let err = ReadFailure(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));

		let mut out = Vec::new();
		report_failure(&mut out, &err).unwrap();

		assert_eq!(
			String::from_utf8(out).unwrap(),
			"Failed to read artifacts directory\n  Caused by: permission denied\n"
		);
	}

	#[test]
	fn test_failure_does_not_repeat_wrapped_cause() {
		let io = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
		let err = ArtifactError::from(io);

		let mut out = Vec::new();
		report_failure(&mut out, &err).unwrap();

		assert_eq!(String::from_utf8(out).unwrap(), "IO error: permission denied\n");
	}

	#[test]
	fn test_failure_is_raw_message() {
		let err = ArtifactError::NoBytecode("IDelance".to_string());

		let mut out = Vec::new();
		report_failure(&mut out, &err).unwrap();

		assert_eq!(
			String::from_utf8(out).unwrap(),
			"Contract 'IDelance' has no deployable bytecode (abstract contract or interface?)\n"
		);
	}
}
