//! Contract factory handle.
//!
//! A [`ContractFactory`] is what the artifact store hands to the delivery
//! layer: the creation bytecode of one compiled contract together with its
//! ABI, so that constructor arguments can be encoded right before submission.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building deployment calldata.
#[derive(Debug, Error)]
pub enum EncodingError {
	/// The number of configured arguments does not match the constructor.
	#[error("Constructor of {contract} expects {expected} argument(s), got {provided}")]
	ArgumentCount {
		contract: String,
		expected: usize,
		provided: usize,
	},
	/// An argument could not be coerced into its declared Solidity type.
	#[error("Invalid constructor argument #{index} ({ty}): {reason}")]
	InvalidArgument {
		index: usize,
		ty: String,
		reason: String,
	},
}

/// Deployable handle for one compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
	name: String,
	source: PathBuf,
	abi: JsonAbi,
	bytecode: Bytes,
	constructor_args: Vec<String>,
}

impl ContractFactory {
	pub fn new(
		name: impl Into<String>,
		source: impl Into<PathBuf>,
		abi: JsonAbi,
		bytecode: Bytes,
	) -> Self {
		Self {
			name: name.into(),
			source: source.into(),
			abi,
			bytecode,
			constructor_args: Vec::new(),
		}
	}

	/// Sets the raw constructor arguments, coerced against the ABI at encoding time.
	pub fn with_constructor_args(mut self, args: Vec<String>) -> Self {
		self.constructor_args = args;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Path of the artifact file this handle was loaded from.
	pub fn source(&self) -> &Path {
		&self.source
	}

	pub fn abi(&self) -> &JsonAbi {
		&self.abi
	}

	pub fn bytecode(&self) -> &Bytes {
		&self.bytecode
	}

	pub fn constructor_args(&self) -> &[String] {
		&self.constructor_args
	}

	/// Returns creation bytecode with the ABI-encoded constructor arguments appended.
	pub fn deployment_code(&self) -> Result<Bytes, EncodingError> {
		let inputs = self
			.abi
			.constructor()
			.map(|constructor| constructor.inputs.as_slice())
			.unwrap_or_default();

		if inputs.len() != self.constructor_args.len() {
			return Err(EncodingError::ArgumentCount {
				contract: self.name.clone(),
				expected: inputs.len(),
				provided: self.constructor_args.len(),
			});
		}

		if inputs.is_empty() {
			return Ok(self.bytecode.clone());
		}

		let values = inputs
			.iter()
			.zip(&self.constructor_args)
			.enumerate()
			.map(|(index, (param, raw))| {
				let invalid = |reason: String| EncodingError::InvalidArgument {
					index,
					ty: param.ty.clone(),
					reason,
				};
				let ty: DynSolType = param.resolve().map_err(|e| invalid(e.to_string()))?;
				ty.coerce_str(raw).map_err(|e| invalid(e.to_string()))
			})
			.collect::<Result<Vec<DynSolValue>, _>>()?;

		let mut code = self.bytecode.to_vec();
		code.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
		Ok(Bytes::from(code))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn abi(json: &str) -> JsonAbi {
		serde_json::from_str(json).unwrap()
	}

	fn factory_with_constructor(inputs: &str) -> ContractFactory {
		let json = format!(
			r#"[{{"type":"constructor","stateMutability":"nonpayable","inputs":{}}}]"#,
			inputs
		);
		ContractFactory::new(
			"Delance",
			"artifacts/contracts/Delance.sol/Delance.json",
			abi(&json),
			Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
		)
	}

	#[test]
	fn test_deployment_code_without_constructor() {
		let factory = ContractFactory::new(
			"Delance",
			"out/Delance.sol/Delance.json",
			abi("[]"),
			Bytes::from(vec![0x60, 0x80]),
		);

		let code = factory.deployment_code().unwrap();
		assert_eq!(code, Bytes::from(vec![0x60, 0x80]));
	}

	#[test]
	fn test_deployment_code_appends_encoded_arguments() {
		let factory = factory_with_constructor(
			r#"[{"name":"freelancer","type":"address","internalType":"address"},
			   {"name":"deadline","type":"uint256","internalType":"uint256"}]"#,
		)
		.with_constructor_args(vec![
			"0x1cbD563B6F743b82f2F345B342C08E9E666Ef7Be".to_string(),
			"42".to_string(),
		]);

		let code = factory.deployment_code().unwrap();

		assert_eq!(code.len(), 4 + 64);
		assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
		assert_eq!(&code[4..4 + 12], &[0u8; 12]);
		assert_eq!(code[4 + 12], 0x1c);
		assert_eq!(code[4 + 31], 0xbe);
		assert_eq!(code[4 + 63], 42);
	}

	#[test]
	fn test_deployment_code_rejects_argument_count_mismatch() {
		let factory = factory_with_constructor(
			r#"[{"name":"deadline","type":"uint256","internalType":"uint256"}]"#,
		);

		let err = factory.deployment_code().unwrap_err();
		assert!(matches!(
			err,
			EncodingError::ArgumentCount {
				expected: 1,
				provided: 0,
				..
			}
		));
	}

	#[test]
	fn test_deployment_code_rejects_uncoercible_argument() {
		let factory = factory_with_constructor(
			r#"[{"name":"deadline","type":"uint256","internalType":"uint256"}]"#,
		)
		.with_constructor_args(vec!["not-a-number".to_string()]);

		let err = factory.deployment_code().unwrap_err();
		match err {
			EncodingError::InvalidArgument { index, ty, .. } => {
				assert_eq!(index, 0);
				assert_eq!(ty, "uint256");
			},
			other => panic!("unexpected error: {other}"),
		}
	}
}
